//! In-memory registry and object store for testing
//!
//! Both record how often they were queried so tests can assert that a code
//! path did (or did not) reach the remote side.

use compack_core::S3Uri;
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::error::Result;
use crate::registry::{ComponentIdentity, ComponentRegistry};
use crate::storage::ObjectStore;

/// Counts of operations performed for testing assertions
#[derive(Debug, Default, Clone)]
pub struct OperationCounts {
    pub list_versions: usize,
    pub version_exists: usize,
    pub object_exists: usize,
}

fn read<T>(lock: &RwLock<T>) -> RwLockReadGuard<'_, T> {
    lock.read().unwrap_or_else(|poisoned| poisoned.into_inner())
}

fn write<T>(lock: &RwLock<T>) -> RwLockWriteGuard<'_, T> {
    lock.write().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// Registry returning versions exactly in the order they were given
#[derive(Clone, Default)]
pub struct MemoryRegistry {
    versions: Arc<RwLock<HashMap<ComponentIdentity, Vec<String>>>>,
    operations: Arc<RwLock<OperationCounts>>,
}

impl MemoryRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create with versions for one component, highest first
    pub fn with_versions(component: ComponentIdentity, versions: &[&str]) -> Self {
        let registry = Self::new();
        write(&registry.versions).insert(
            component,
            versions.iter().map(|v| v.to_string()).collect(),
        );
        registry
    }

    /// Add a version in front of the existing ones
    pub fn push_latest(&self, component: &ComponentIdentity, version: &str) {
        write(&self.versions)
            .entry(component.clone())
            .or_default()
            .insert(0, version.to_string());
    }

    /// Get operation counts for assertions
    pub fn operation_counts(&self) -> OperationCounts {
        read(&self.operations).clone()
    }
}

impl ComponentRegistry for MemoryRegistry {
    fn list_versions(&self, component: &ComponentIdentity) -> Result<Vec<String>> {
        write(&self.operations).list_versions += 1;
        Ok(read(&self.versions)
            .get(component)
            .cloned()
            .unwrap_or_default())
    }

    fn version_exists(&self, component: &ComponentIdentity, version: &str) -> Result<bool> {
        write(&self.operations).version_exists += 1;
        Ok(read(&self.versions)
            .get(component)
            .is_some_and(|versions| versions.iter().any(|v| v == version)))
    }
}

/// Object store holding a set of locators
#[derive(Clone, Default)]
pub struct MemoryObjectStore {
    objects: Arc<RwLock<HashSet<S3Uri>>>,
    operations: Arc<RwLock<OperationCounts>>,
}

impl MemoryObjectStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create with objects at the given `s3://` locators
    ///
    /// Locators that do not parse are ignored.
    pub fn with_objects(uris: &[&str]) -> Self {
        let store = Self::new();
        {
            let mut objects = write(&store.objects);
            objects.extend(uris.iter().filter_map(|u| S3Uri::parse(u)));
        }
        store
    }

    /// Get operation counts for assertions
    pub fn operation_counts(&self) -> OperationCounts {
        read(&self.operations).clone()
    }
}

impl ObjectStore for MemoryObjectStore {
    fn object_exists(&self, uri: &S3Uri) -> Result<bool> {
        write(&self.operations).object_exists += 1;
        Ok(read(&self.objects).contains(uri))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_registry_keeps_given_order() {
        let hello = ComponentIdentity::new("com.example.Hello", "us-east-1");
        let registry = MemoryRegistry::with_versions(hello.clone(), &["1.0.4", "1.0.1"]);

        assert_eq!(registry.list_versions(&hello).unwrap(), ["1.0.4", "1.0.1"]);
        registry.push_latest(&hello, "1.0.5");
        assert_eq!(registry.list_versions(&hello).unwrap(), ["1.0.5", "1.0.4", "1.0.1"]);
        assert!(registry.version_exists(&hello, "1.0.4").unwrap());
        assert_eq!(registry.operation_counts().list_versions, 2);
        assert_eq!(registry.operation_counts().version_exists, 1);
    }

    #[test]
    fn test_object_store_counts_checks() {
        let store = MemoryObjectStore::with_objects(&["s3://bucket/a/hello.py", "docker:nope"]);

        assert!(store.object_exists(&S3Uri::new("bucket", "a/hello.py")).unwrap());
        assert!(!store.object_exists(&S3Uri::new("bucket", "a/other.py")).unwrap());
        assert_eq!(store.operation_counts().object_exists, 2);
    }
}
