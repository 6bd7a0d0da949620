//! Engine error types

use compack_core::CoreError;
use compack_repo::RepoError;
use miette::Diagnostic;
use std::path::PathBuf;
use thiserror::Error;

/// Main engine error type
#[derive(Error, Debug, Diagnostic)]
pub enum EngineError {
    #[error(
        "Artifact '{file_name}' not found: searched build folders [{}] and object storage at {uri}",
        display_paths(.searched)
    )]
    #[diagnostic(
        code(compack::engine::artifact_not_found),
        help("build the component so the file lands in one of the build folders, or upload it to the locator in the recipe")
    )]
    ArtifactNotFound {
        file_name: String,
        uri: String,
        searched: Vec<PathBuf>,
    },

    #[error("Component '{expected}' has not been built: the build recipe {found}")]
    #[diagnostic(
        code(compack::engine::component_not_built),
        help("run `compack build` before publishing")
    )]
    ComponentNotBuilt { expected: String, found: String },

    #[error("Version {version} of component '{component}' already exists")]
    #[diagnostic(
        code(compack::engine::version_conflict),
        help("bump the version in compack.json, or set it to NEXT_PATCH")
    )]
    VersionConflict { component: String, version: String },

    #[error("Failed to resolve the version of component '{component}'")]
    #[diagnostic(code(compack::engine::version_resolution))]
    VersionResolution {
        component: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    #[error(transparent)]
    #[diagnostic(transparent)]
    Core(#[from] CoreError),

    #[error("Storage error: {0}")]
    #[diagnostic(code(compack::engine::storage))]
    Storage(#[from] RepoError),

    #[error("IO error: {0}")]
    #[diagnostic(code(compack::engine::io))]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, EngineError>;

fn display_paths(paths: &[PathBuf]) -> String {
    paths
        .iter()
        .map(|p| p.display().to_string())
        .collect::<Vec<_>>()
        .join(", ")
}
