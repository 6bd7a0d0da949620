//! Compack Core - Core types for building and publishing IoT components
//!
//! This crate provides the foundational types used throughout compack:
//! - `RecipeDocument`: Case-insensitive recipe document with casing-preserving output
//! - `DocumentFormat`: JSON / YAML selection at the I/O boundary
//! - `ProjectConfig`: Resolved project configuration (`compack.json`)
//! - `VersionExpression`: Literal versions and the `NEXT_PATCH` sentinel
//! - `S3Uri`: Artifact locators in object storage

pub mod config;
pub mod document;
pub mod error;
pub mod format;
pub mod recipe;
pub mod version;

pub use config::{BuildSystem, ProjectConfig, ProjectFile, BUILD_DIR, PROJECT_FILE};
pub use document::{CaseInsensitiveMap, Node, RecipeDocument};
pub use error::{CoreError, Result, RECIPE_DOCS_URL};
pub use format::DocumentFormat;
pub use recipe::{artifact_file_name, is_s3_uri, keys, ArtifactSlot, S3Uri, S3_SCHEME};
pub use version::{VersionExpression, VersionTriple, FALLBACK_VERSION, NEXT_PATCH};
