//! Publish command - rewrite the build recipe, upload artifacts, register the version

use compack_core::ProjectConfig;
use compack_engine::{resolve_version, PublishRecipeTransformer, RegistryVersionQuery};
use compack_repo::{ComponentIdentity, DirectoryObjectStore, DirectoryRegistry};
use console::style;
use std::path::Path;

use crate::error::{CliError, Result};
use crate::util::{display_relative, format_size, short_digest};

pub fn run(
    project_dir: &Path,
    registry_dir: &Path,
    bucket: Option<&str>,
    region: Option<&str>,
) -> Result<()> {
    let mut config = ProjectConfig::load(project_dir)?;
    if let Some(bucket) = bucket {
        config.bucket = bucket.to_string();
    }
    if let Some(region) = region {
        config.region = region.to_string();
    }

    if config.bucket.is_empty() {
        return Err(CliError::config_with_help(
            "no bucket configured for publishing",
            "set publish.bucket in compack.json or pass --bucket",
        ));
    }

    let registry = DirectoryRegistry::new(registry_dir)?;
    let store = DirectoryObjectStore::new(registry_dir)?;

    let version = resolve_version(
        &config.version,
        &RegistryVersionQuery::from_config(&registry, &config),
    )?;

    println!(
        "{} {} v{} to s3://{}",
        style("Publishing").cyan().bold(),
        config.component_name,
        version,
        config.bucket
    );

    let outcome = PublishRecipeTransformer::new(&config).run(&version)?;

    for artifact in &outcome.unresolved {
        println!(
            "  {} {} left as {} ({} staged matches)",
            style("Warning").yellow().bold(),
            artifact.file_name,
            artifact.uri,
            artifact.matches
        );
    }

    for upload in &outcome.uploads {
        let stored = store.put_object(&upload.uri, &upload.source)?;
        println!(
            "  {} {} ({}, sha256:{})",
            style("Uploaded").green().bold(),
            stored.uri,
            format_size(stored.size),
            short_digest(&stored.sha256, 12)
        );
    }

    let identity = ComponentIdentity::new(&config.component_name, &config.region);
    registry.register(&identity, &version, outcome.document.to_plain())?;

    println!(
        "  {} {}",
        style("Recipe").dim(),
        display_relative(&outcome.recipe_path, project_dir).display()
    );
    println!();
    println!(
        "{} {} v{} ({})",
        style("Published").green().bold(),
        config.component_name,
        version,
        identity
    );

    Ok(())
}
