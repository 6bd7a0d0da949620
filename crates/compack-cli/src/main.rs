//! Compack CLI - Build and publish IoT component recipes

use clap::{Parser, Subcommand};
use std::io::IsTerminal;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

mod commands;
mod error;
mod exit_codes;
mod util;

use error::{CliError, Result};

#[derive(Parser)]
#[command(name = "compack")]
#[command(author = "Compack Contributors")]
#[command(version)]
#[command(about = "Build and publish IoT component recipes", long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Project directory holding compack.json and the recipe
    #[arg(long, global = true, default_value = ".")]
    project_dir: PathBuf,

    /// Directory backing the component registry and object storage
    #[arg(long, global = true, env = "COMPACK_REGISTRY_DIR")]
    registry_dir: Option<PathBuf>,

    /// Enable debug output
    #[arg(long, global = true)]
    debug: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Stamp the recipe and stage locally built artifacts
    Build {
        /// Folder to search for built artifacts (repeatable, replaces the build system defaults)
        #[arg(long = "build-folder")]
        build_folders: Vec<PathBuf>,
    },

    /// Rewrite artifact locators, upload artifacts and register the version
    Publish {
        /// Bucket to publish to (overrides compack.json)
        #[arg(long)]
        bucket: Option<String>,

        /// Region to publish to (overrides compack.json)
        #[arg(long)]
        region: Option<String>,
    },
}

fn main() {
    // Setup miette for nice error display
    miette::set_panic_hook();

    let cli = Cli::parse();
    init_logging(cli.debug);

    if let Err(err) = run(cli) {
        let code = err.exit_code();
        eprintln!("{:?}", miette::Report::new(err));
        std::process::exit(code);
    }
}

fn run(cli: Cli) -> Result<()> {
    let registry_dir = match cli.registry_dir {
        Some(dir) => dir,
        None => default_registry_dir()?,
    };

    match cli.command {
        Commands::Build { build_folders } => {
            commands::build::run(&cli.project_dir, &registry_dir, &build_folders)
        }
        Commands::Publish { bucket, region } => commands::publish::run(
            &cli.project_dir,
            &registry_dir,
            bucket.as_deref(),
            region.as_deref(),
        ),
    }
}

/// `RUST_LOG` decides the log level unless `--debug` is given; warnings by default
fn init_logging(debug: bool) {
    let filter = if debug {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_ansi(std::io::stderr().is_terminal())
        .with_target(false)
        .try_init();
}

fn default_registry_dir() -> Result<PathBuf> {
    dirs::data_dir()
        .map(|dir| dir.join("compack"))
        .ok_or_else(|| {
            CliError::config_with_help(
                "could not determine the data directory for the registry",
                "pass --registry-dir or set COMPACK_REGISTRY_DIR",
            )
        })
}
