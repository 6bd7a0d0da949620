//! CLI error types with exit code handling
//!
//! This module provides a unified error type for CLI operations that
//! maps library errors to appropriate exit codes.

use compack_core::CoreError;
use compack_engine::EngineError;
use compack_repo::RepoError;
use miette::Diagnostic;
use thiserror::Error;

use crate::exit_codes;

/// CLI-specific error type that includes exit code information
#[derive(Error, Debug, Diagnostic, Clone)]
pub enum CliError {
    /// compack.json missing or invalid, or a required setting is absent
    #[error("Configuration error: {message}")]
    #[diagnostic(code(compack::cli::config))]
    Config {
        message: String,
        #[help]
        help: Option<String>,
    },

    /// Recipe could not be read, written or matched to the project
    #[error("Recipe error: {message}")]
    #[diagnostic(code(compack::cli::recipe))]
    Recipe {
        message: String,
        #[help]
        help: Option<String>,
    },

    /// An artifact could not be resolved
    #[error("Artifact error: {message}")]
    #[diagnostic(code(compack::cli::artifact))]
    Artifact {
        message: String,
        #[help]
        help: Option<String>,
    },

    /// Version could not be resolved or is already taken
    #[error("Version error: {message}")]
    #[diagnostic(code(compack::cli::version))]
    Version {
        message: String,
        #[help]
        help: Option<String>,
    },

    /// IO error (file not found, permissions, etc.)
    #[error("IO error: {message}")]
    #[diagnostic(code(compack::cli::io))]
    Io { message: String },

    /// Anything else (stores the formatted message)
    #[error("{message}")]
    #[diagnostic(code(compack::cli::error))]
    Other { message: String },
}

impl CliError {
    /// Get the exit code for this error
    pub fn exit_code(&self) -> i32 {
        match self {
            CliError::Config { .. } => exit_codes::CONFIG_ERROR,
            CliError::Recipe { .. } => exit_codes::RECIPE_ERROR,
            CliError::Artifact { .. } => exit_codes::ARTIFACT_ERROR,
            CliError::Version { .. } => exit_codes::VERSION_ERROR,
            CliError::Io { .. } => exit_codes::IO_ERROR,
            CliError::Other { .. } => exit_codes::ERROR,
        }
    }

    /// Create a configuration error with help text
    pub fn config_with_help(message: impl Into<String>, help: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
            help: Some(help.into()),
        }
    }
}

/// Error message followed by any causes not already part of it
fn message_with_causes(err: &(dyn std::error::Error + 'static)) -> String {
    let mut message = err.to_string();
    let mut source = err.source();
    while let Some(cause) = source {
        let text = cause.to_string();
        if !message.contains(&text) {
            message = format!("{}: {}", message, text);
        }
        source = cause.source();
    }
    message
}

fn help_of(err: &dyn Diagnostic) -> Option<String> {
    err.help().map(|h| h.to_string())
}

impl From<CoreError> for CliError {
    fn from(err: CoreError) -> Self {
        let message = message_with_causes(&err);
        let help = help_of(&err);
        match err {
            CoreError::ConfigNotFound { .. }
            | CoreError::InvalidConfig { .. }
            | CoreError::InvalidVersion { .. } => CliError::Config { message, help },
            CoreError::MalformedDocument { .. }
            | CoreError::InvalidDocument { .. }
            | CoreError::UnsupportedFormat { .. }
            | CoreError::Json(_)
            | CoreError::Yaml(_) => CliError::Recipe { message, help },
            CoreError::Io(_) => CliError::Io { message },
        }
    }
}

impl From<RepoError> for CliError {
    fn from(err: RepoError) -> Self {
        let message = message_with_causes(&err);
        match err {
            RepoError::VersionAlreadyExists { .. } => CliError::Version {
                message,
                help: Some("bump the version in compack.json, or set it to NEXT_PATCH".to_string()),
            },
            RepoError::Io(_) => CliError::Io { message },
            _ => CliError::Other { message },
        }
    }
}

impl From<EngineError> for CliError {
    fn from(err: EngineError) -> Self {
        let message = message_with_causes(&err);
        let help = help_of(&err);
        match err {
            EngineError::Core(core) => core.into(),
            EngineError::Storage(repo) => repo.into(),
            EngineError::ArtifactNotFound { .. } => CliError::Artifact { message, help },
            EngineError::ComponentNotBuilt { .. } => CliError::Recipe { message, help },
            EngineError::VersionConflict { .. } | EngineError::VersionResolution { .. } => {
                CliError::Version { message, help }
            }
            EngineError::Io(_) => CliError::Io { message },
        }
    }
}

impl From<std::io::Error> for CliError {
    fn from(err: std::io::Error) -> Self {
        CliError::Io {
            message: err.to_string(),
        }
    }
}

/// Result type for CLI operations
pub type Result<T> = std::result::Result<T, CliError>;
