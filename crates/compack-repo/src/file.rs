//! Directory-backed registry and object store
//!
//! Keeps published components in a local directory so `publish` can run
//! without a cloud account. Useful for:
//! - Development and testing of publish flows
//! - Offline scenarios
//!
//! Layout under the root directory:
//!
//! ```text
//! components/<region>/<name>/<version>.json   registry records
//! objects/<bucket>/<key>                      stored artifacts
//! ```

use chrono::{DateTime, Utc};
use compack_core::S3Uri;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use sha2::{Digest, Sha256};
use std::ffi::OsStr;
use std::io::Read;
use std::path::{Component, Path, PathBuf};

use crate::error::{RepoError, Result};
use crate::registry::{sort_newest_first, ComponentIdentity, ComponentRegistry};
use crate::storage::ObjectStore;

const DEFAULT_REGION_DIR: &str = "_default";

/// One registered component version
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComponentRecord {
    pub name: String,
    pub version: String,
    pub region: String,
    pub created_at: DateTime<Utc>,
    /// The published recipe
    pub recipe: JsonValue,
}

/// Registry storing one JSON record per component version
pub struct DirectoryRegistry {
    root: PathBuf,
}

impl DirectoryRegistry {
    /// Create a registry rooted at `root`, creating the directory if needed
    pub fn new(root: impl Into<PathBuf>) -> Result<Self> {
        let root = root.into();
        std::fs::create_dir_all(root.join("components"))?;
        Ok(Self { root })
    }

    fn component_dir(&self, component: &ComponentIdentity) -> PathBuf {
        let region = if component.region.is_empty() {
            DEFAULT_REGION_DIR
        } else {
            component.region.as_str()
        };
        self.root
            .join("components")
            .join(region)
            .join(&component.name)
    }

    fn record_path(&self, component: &ComponentIdentity, version: &str) -> PathBuf {
        self.component_dir(component)
            .join(format!("{}.json", version))
    }

    /// Register a new component version
    pub fn register(
        &self,
        component: &ComponentIdentity,
        version: &str,
        recipe: JsonValue,
    ) -> Result<ComponentRecord> {
        let path = self.record_path(component, version);
        if path.exists() {
            return Err(RepoError::VersionAlreadyExists {
                name: component.name.clone(),
                version: version.to_string(),
                region: component.region.clone(),
            });
        }

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let record = ComponentRecord {
            name: component.name.clone(),
            version: version.to_string(),
            region: component.region.clone(),
            created_at: Utc::now(),
            recipe,
        };
        std::fs::write(&path, serde_json::to_string_pretty(&record)?)?;

        tracing::debug!(component = %component, version, "registered component version");
        Ok(record)
    }

    /// Read one registered version
    pub fn get(&self, component: &ComponentIdentity, version: &str) -> Result<Option<ComponentRecord>> {
        let path = self.record_path(component, version);
        if !path.exists() {
            return Ok(None);
        }

        let content = std::fs::read_to_string(&path)?;
        let record = serde_json::from_str(&content).map_err(|e| RepoError::CorruptRecord {
            path: path.display().to_string(),
            message: e.to_string(),
        })?;
        Ok(Some(record))
    }
}

impl ComponentRegistry for DirectoryRegistry {
    fn list_versions(&self, component: &ComponentIdentity) -> Result<Vec<String>> {
        let dir = self.component_dir(component);
        if !dir.exists() {
            return Ok(Vec::new());
        }

        let mut versions: Vec<String> = std::fs::read_dir(&dir)?
            .filter_map(|e| e.ok())
            .map(|e| e.path())
            .filter(|p| p.extension().map(|e| e == "json").unwrap_or(false))
            .filter_map(|p| p.file_stem().map(|s| s.to_string_lossy().into_owned()))
            .collect();

        sort_newest_first(&mut versions);
        Ok(versions)
    }

    fn version_exists(&self, component: &ComponentIdentity, version: &str) -> Result<bool> {
        Ok(self.record_path(component, version).is_file())
    }
}

/// An object written by [`DirectoryObjectStore::put_object`]
#[derive(Debug, Clone)]
pub struct StoredObject {
    pub uri: S3Uri,
    pub size: u64,
    pub sha256: String,
}

/// Object store mapping `s3://<bucket>/<key>` to `objects/<bucket>/<key>`
pub struct DirectoryObjectStore {
    root: PathBuf,
}

impl DirectoryObjectStore {
    pub fn new(root: impl Into<PathBuf>) -> Result<Self> {
        let root = root.into();
        std::fs::create_dir_all(root.join("objects"))?;
        Ok(Self { root })
    }

    /// Local path of an object
    ///
    /// The bucket and every key segment must be a single plain path component.
    pub fn object_path(&self, uri: &S3Uri) -> Result<PathBuf> {
        let invalid = |reason: &str| RepoError::InvalidLocator {
            uri: uri.to_string(),
            reason: reason.to_string(),
        };

        if uri.key.is_empty() {
            return Err(invalid("object key is empty"));
        }

        let bucket = single_segment(&uri.bucket)
            .ok_or_else(|| invalid("bucket name is not a single path segment"))?;
        let mut path = self.root.join("objects").join(bucket);
        for segment in uri.key.split('/') {
            let part = single_segment(segment)
                .ok_or_else(|| invalid("object key has an invalid path segment"))?;
            path.push(part);
        }
        Ok(path)
    }

    /// Copy a local file into the store
    pub fn put_object(&self, uri: &S3Uri, source: &Path) -> Result<StoredObject> {
        let dest = self.object_path(uri)?;
        if let Some(parent) = dest.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let size = std::fs::copy(source, &dest)?;
        let sha256 = hash_file(&dest)?;

        tracing::debug!(uri = %uri, size, "stored object");
        Ok(StoredObject {
            uri: uri.clone(),
            size,
            sha256,
        })
    }
}

impl ObjectStore for DirectoryObjectStore {
    fn object_exists(&self, uri: &S3Uri) -> Result<bool> {
        Ok(self.object_path(uri)?.is_file())
    }
}

/// Calculate SHA256 hash of a file
fn hash_file(path: &Path) -> Result<String> {
    let mut file = std::fs::File::open(path)?;
    let mut hasher = Sha256::new();
    let mut buffer = [0u8; 8192];

    loop {
        let bytes_read = file.read(&mut buffer)?;
        if bytes_read == 0 {
            break;
        }
        hasher.update(&buffer[..bytes_read]);
    }

    Ok(hex::encode(hasher.finalize()))
}

/// `segment` if it is exactly one normal path component
fn single_segment(segment: &str) -> Option<&OsStr> {
    let mut components = Path::new(segment).components();
    match (components.next(), components.next()) {
        (Some(Component::Normal(part)), None) => Some(part),
        _ => None,
    }
}
