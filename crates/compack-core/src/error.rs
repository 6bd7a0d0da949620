//! Core error types

use miette::Diagnostic;
use std::path::PathBuf;
use thiserror::Error;

/// Where users are sent when a recipe cannot be parsed
pub const RECIPE_DOCS_URL: &str = "https://docs.compack.dev/recipes/reference";

#[derive(Error, Debug, Diagnostic)]
pub enum CoreError {
    #[error("Failed to parse {}: {message} (line {line}, column {column})", .path.display())]
    #[diagnostic(
        code(compack::core::malformed_document),
        help("check the recipe syntax against https://docs.compack.dev/recipes/reference")
    )]
    MalformedDocument {
        path: PathBuf,
        line: usize,
        column: usize,
        message: String,
    },

    #[error("Invalid recipe: {message}")]
    #[diagnostic(code(compack::core::invalid_document))]
    InvalidDocument { message: String },

    #[error("Unsupported recipe format: {} (expected .json, .yaml or .yml)", .path.display())]
    #[diagnostic(code(compack::core::unsupported_format))]
    UnsupportedFormat { path: PathBuf },

    #[error("Invalid version '{value}': {reason}")]
    #[diagnostic(
        code(compack::core::invalid_version),
        help("use a semantic version like 1.0.0, or NEXT_PATCH")
    )]
    InvalidVersion { value: String, reason: String },

    #[error("Project configuration not found: {}", .path.display())]
    #[diagnostic(
        code(compack::core::config_not_found),
        help("run compack from the project directory, or pass --project-dir")
    )]
    ConfigNotFound { path: PathBuf },

    #[error("Invalid project configuration: {message}")]
    #[diagnostic(code(compack::core::invalid_config))]
    InvalidConfig { message: String },

    #[error("IO error: {0}")]
    #[diagnostic(code(compack::core::io))]
    Io(#[from] std::io::Error),

    #[error("Failed to serialize JSON: {0}")]
    #[diagnostic(code(compack::core::json))]
    Json(#[from] serde_json::Error),

    #[error("Failed to serialize YAML: {0}")]
    #[diagnostic(code(compack::core::yaml))]
    Yaml(#[from] serde_yaml::Error),
}

pub type Result<T> = std::result::Result<T, CoreError>;
