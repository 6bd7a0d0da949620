//! Component version resolution
//!
//! A configured [`VersionExpression`] is turned into a concrete version once
//! per command. Where existing versions come from depends on the stage:
//!
//! - **build** scans the local artifact directory ([`LocalVersionScan`])
//! - **publish** asks the component registry ([`RegistryVersionQuery`])

use compack_core::{ProjectConfig, VersionExpression, VersionTriple, FALLBACK_VERSION};
use compack_repo::{ComponentIdentity, ComponentRegistry};
use once_cell::sync::Lazy;
use regex::Regex;
use std::path::PathBuf;

use crate::error::{EngineError, Result};

/// Version directory names: digits only, exactly three segments
static VERSION_DIR: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[0-9]+\.[0-9]+\.[0-9]+$").expect("valid regex"));

/// Source of existing versions for one component
pub trait VersionSource {
    /// Component name for error reporting
    fn component_name(&self) -> &str;

    /// The version after the highest existing one
    fn next_version(&self) -> Result<String>;

    /// Fail with [`EngineError::VersionConflict`] if `version` is already taken
    fn ensure_available(&self, version: &str) -> Result<()>;
}

/// Resolve a version expression against a version source
///
/// Literal versions are returned unchanged once the source accepts them.
pub fn resolve_version(expression: &VersionExpression, source: &dyn VersionSource) -> Result<String> {
    let component = source.component_name();

    let resolved = match expression {
        VersionExpression::Literal(version) => {
            let version = version.to_string();
            source
                .ensure_available(&version)
                .map_err(|e| into_resolution_error(component, e))?;
            version
        }
        VersionExpression::NextPatch => source
            .next_version()
            .map_err(|e| into_resolution_error(component, e))?,
    };

    tracing::info!(component, %expression, version = %resolved, "resolved component version");
    Ok(resolved)
}

fn into_resolution_error(component: &str, err: EngineError) -> EngineError {
    match err {
        EngineError::VersionConflict { .. } | EngineError::VersionResolution { .. } => err,
        other => EngineError::VersionResolution {
            component: component.to_string(),
            source: Box::new(other),
        },
    }
}

fn bump_patch(component: &str, latest: VersionTriple) -> Result<VersionTriple> {
    latest.next_patch().ok_or_else(|| EngineError::VersionResolution {
        component: component.to_string(),
        source: format!("patch number of {} cannot be incremented", latest).into(),
    })
}

/// Next version from the per-version directories under the artifacts directory
pub struct LocalVersionScan {
    component: String,
    artifacts_dir: PathBuf,
}

impl LocalVersionScan {
    pub fn new(component: impl Into<String>, artifacts_dir: impl Into<PathBuf>) -> Self {
        Self {
            component: component.into(),
            artifacts_dir: artifacts_dir.into(),
        }
    }

    pub fn from_config(config: &ProjectConfig) -> Self {
        Self::new(&config.component_name, &config.artifacts_dir)
    }

    /// Highest version directory, compared numerically
    ///
    /// Directories are visited in name order and an exact tie keeps the
    /// first one seen.
    pub fn latest(&self) -> Result<Option<VersionTriple>> {
        if !self.artifacts_dir.exists() {
            return Ok(None);
        }

        let mut names: Vec<String> = std::fs::read_dir(&self.artifacts_dir)?
            .filter_map(|e| e.ok())
            .filter(|e| e.path().is_dir())
            .map(|e| e.file_name().to_string_lossy().into_owned())
            .filter(|name| VERSION_DIR.is_match(name))
            .collect();
        names.sort();

        let mut latest: Option<VersionTriple> = None;
        for name in &names {
            // Segments too large for u64 are skipped
            let Some(candidate) = VersionTriple::parse(name) else {
                continue;
            };
            if latest.is_none_or(|current| candidate > current) {
                latest = Some(candidate);
            }
        }

        Ok(latest)
    }
}

impl VersionSource for LocalVersionScan {
    fn component_name(&self) -> &str {
        &self.component
    }

    fn next_version(&self) -> Result<String> {
        match self.latest()? {
            Some(latest) => Ok(bump_patch(&self.component, latest)?.to_string()),
            None => {
                tracing::debug!(
                    dir = %self.artifacts_dir.display(),
                    "no built versions found, using fallback"
                );
                Ok(FALLBACK_VERSION.to_string())
            }
        }
    }

    /// Rebuilding an existing local version is allowed
    fn ensure_available(&self, _version: &str) -> Result<()> {
        Ok(())
    }
}

/// Next version from the versions registered for the component
pub struct RegistryVersionQuery<'a> {
    registry: &'a dyn ComponentRegistry,
    component: ComponentIdentity,
}

impl<'a> RegistryVersionQuery<'a> {
    pub fn new(registry: &'a dyn ComponentRegistry, component: ComponentIdentity) -> Self {
        Self {
            registry,
            component,
        }
    }

    pub fn from_config(registry: &'a dyn ComponentRegistry, config: &ProjectConfig) -> Self {
        Self::new(
            registry,
            ComponentIdentity::new(&config.component_name, &config.region),
        )
    }
}

impl VersionSource for RegistryVersionQuery<'_> {
    fn component_name(&self) -> &str {
        &self.component.name
    }

    /// The registry lists the highest version first; that order is trusted as-is
    fn next_version(&self) -> Result<String> {
        let versions = self.registry.list_versions(&self.component)?;

        let Some(highest) = versions.first() else {
            tracing::debug!(component = %self.component, "no registered versions, using fallback");
            return Ok(FALLBACK_VERSION.to_string());
        };

        let triple = VersionTriple::parse_release(highest).ok_or_else(|| {
            EngineError::VersionResolution {
                component: self.component.name.clone(),
                source: format!("registry returned an invalid version '{}'", highest).into(),
            }
        })?;

        Ok(bump_patch(&self.component.name, triple)?.to_string())
    }

    fn ensure_available(&self, version: &str) -> Result<()> {
        if self.registry.version_exists(&self.component, version)? {
            return Err(EngineError::VersionConflict {
                component: self.component.name.clone(),
                version: version.to_string(),
            });
        }
        Ok(())
    }
}
