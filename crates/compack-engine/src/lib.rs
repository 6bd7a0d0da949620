//! Compack Engine - Recipe transformation for the build and publish stages
//!
//! This crate turns a project's recipe into:
//! - a **build recipe**, with identity stamped and local artifacts staged
//!   under placeholder locators ([`BuildRecipeTransformer`])
//! - a **publish recipe**, with staged artifacts pointing at their final
//!   object-storage location ([`PublishRecipeTransformer`])
//!
//! Both stages resolve the configured version once, through a [`VersionSource`].

pub mod build;
pub mod error;
pub mod publish;
pub mod version;

pub use build::{
    placeholder_uri, ArtifactResolution, BuildOutcome, BuildRecipeTransformer, ResolvedArtifact,
};
pub use error::{EngineError, Result};
pub use publish::{PublishOutcome, PublishRecipeTransformer, StagedUpload, UnresolvedArtifact};
pub use version::{resolve_version, LocalVersionScan, RegistryVersionQuery, VersionSource};
