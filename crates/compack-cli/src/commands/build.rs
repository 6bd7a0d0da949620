//! Build command - stamp the recipe and stage local artifacts

use compack_core::ProjectConfig;
use compack_engine::{ArtifactResolution, BuildRecipeTransformer};
use compack_repo::DirectoryObjectStore;
use console::style;
use std::path::{Path, PathBuf};

use crate::error::Result;
use crate::util::{display_relative, format_size};

pub fn run(project_dir: &Path, registry_dir: &Path, build_folders: &[PathBuf]) -> Result<()> {
    let config = ProjectConfig::load(project_dir)?;

    // Explicit folders replace the build system defaults
    let folders: Vec<PathBuf> = if build_folders.is_empty() {
        config.build_folders.clone()
    } else {
        build_folders.iter().map(|f| project_dir.join(f)).collect()
    };

    println!(
        "{} {} (version {})",
        style("Building").cyan().bold(),
        config.component_name,
        config.version
    );
    if folders.is_empty() {
        println!("  {} no build folders configured", style("Note").yellow());
    }

    let store = DirectoryObjectStore::new(registry_dir)?;
    let outcome = BuildRecipeTransformer::new(&config, &store).run(&folders)?;

    for artifact in &outcome.artifacts {
        match &artifact.resolution {
            ArtifactResolution::Copied { staged, .. } => {
                let size = std::fs::metadata(staged)?.len();
                println!(
                    "  {} {} ({})",
                    style("Staged").green().bold(),
                    artifact.file_name,
                    format_size(size)
                );
            }
            ArtifactResolution::Remote => {
                println!("  {} {}", style("Remote").yellow().bold(), artifact.uri);
            }
        }
    }

    println!(
        "  {} {}",
        style("Recipe").dim(),
        display_relative(&outcome.recipe_path, project_dir).display()
    );
    println!();
    println!(
        "{} {} v{} ({} staged, {} remote)",
        style("Built").green().bold(),
        config.component_name,
        outcome.version,
        outcome.copied().count(),
        outcome.remote().count()
    );

    Ok(())
}
