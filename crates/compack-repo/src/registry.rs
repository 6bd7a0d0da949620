//! Component registry interface

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::Result;

/// A component within one registry region
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ComponentIdentity {
    pub name: String,
    pub region: String,
}

impl ComponentIdentity {
    pub fn new(name: impl Into<String>, region: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            region: region.into(),
        }
    }
}

impl fmt::Display for ComponentIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.region.is_empty() {
            f.write_str(&self.name)
        } else {
            write!(f, "{} ({})", self.name, self.region)
        }
    }
}

/// Registry of published component versions
pub trait ComponentRegistry {
    /// All registered versions, highest first
    ///
    /// Callers rely on this ordering and must not re-sort.
    fn list_versions(&self, component: &ComponentIdentity) -> Result<Vec<String>>;

    /// Check whether one version is registered
    fn version_exists(&self, component: &ComponentIdentity, version: &str) -> Result<bool> {
        Ok(self
            .list_versions(component)?
            .iter()
            .any(|v| v == version))
    }
}

/// Sort version strings highest first by semver precedence
///
/// Strings that are not valid semver go last, in their original order.
pub fn sort_newest_first(versions: &mut [String]) {
    versions.sort_by(|a, b| {
        match (semver::Version::parse(a), semver::Version::parse(b)) {
            (Ok(va), Ok(vb)) => vb.cmp_precedence(&va),
            (Ok(_), Err(_)) => std::cmp::Ordering::Less,
            (Err(_), Ok(_)) => std::cmp::Ordering::Greater,
            (Err(_), Err(_)) => std::cmp::Ordering::Equal,
        }
    });
}
