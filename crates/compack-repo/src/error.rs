//! Error types for registry and storage operations

use thiserror::Error;

/// Registry / object storage errors
#[derive(Debug, Error)]
pub enum RepoError {
    // ============ Locator Errors ============
    #[error("Invalid object locator: {uri} - {reason}")]
    InvalidLocator { uri: String, reason: String },

    // ============ Registry Errors ============
    #[error("Component version already registered: {name}@{version} in region '{region}'")]
    VersionAlreadyExists {
        name: String,
        version: String,
        region: String,
    },

    #[error("Corrupt registry record {path}: {message}")]
    CorruptRecord { path: String, message: String },

    // ============ IO Errors ============
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

/// Result type for registry / storage operations
pub type Result<T> = std::result::Result<T, RepoError>;

impl From<serde_json::Error> for RepoError {
    fn from(e: serde_json::Error) -> Self {
        RepoError::Serialization(e.to_string())
    }
}
