//! Recipe schema helpers: identity fields, manifests and artifact locators

use std::fmt;

use crate::document::{CaseInsensitiveMap, Node, RecipeDocument};

/// Recipe field names as written into new documents
pub mod keys {
    pub const COMPONENT_NAME: &str = "ComponentName";
    pub const COMPONENT_VERSION: &str = "ComponentVersion";
    pub const COMPONENT_PUBLISHER: &str = "ComponentPublisher";
    pub const MANIFESTS: &str = "Manifests";
    pub const ARTIFACTS: &str = "Artifacts";
    pub const URI: &str = "Uri";
}

/// Scheme prefix of artifact locators that point at object storage
pub const S3_SCHEME: &str = "s3://";

/// Check whether a locator uses the object-storage scheme
#[inline]
pub fn is_s3_uri(uri: &str) -> bool {
    uri.starts_with(S3_SCHEME)
}

/// Last path segment of a locator
pub fn artifact_file_name(uri: &str) -> &str {
    uri.rsplit('/').next().unwrap_or(uri)
}

/// An object-storage locator, `s3://<bucket>/<key>`
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct S3Uri {
    pub bucket: String,
    pub key: String,
}

impl S3Uri {
    pub fn new(bucket: impl Into<String>, key: impl Into<String>) -> Self {
        Self {
            bucket: bucket.into(),
            key: key.into(),
        }
    }

    /// Parse a locator; `None` if the scheme is not `s3://` or the bucket is empty
    pub fn parse(uri: &str) -> Option<Self> {
        let rest = uri.strip_prefix(S3_SCHEME)?;
        let (bucket, key) = rest.split_once('/').unwrap_or((rest, ""));
        if bucket.is_empty() {
            return None;
        }
        Some(Self::new(bucket, key))
    }

    /// Locator of a published artifact: `s3://<bucket>/<name>/<version>/<file>`
    pub fn for_artifact(bucket: &str, component: &str, version: &str, file_name: &str) -> Self {
        Self::new(bucket, format!("{}/{}/{}", component, version, file_name))
    }

    pub fn file_name(&self) -> &str {
        artifact_file_name(&self.key)
    }
}

impl fmt::Display for S3Uri {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}/{}", S3_SCHEME, self.bucket, self.key)
    }
}

/// One artifact entry inside a manifest, handed out during traversal
pub struct ArtifactSlot<'a> {
    pub manifest_index: usize,
    pub artifact_index: usize,
    entry: &'a mut CaseInsensitiveMap<Node>,
}

impl ArtifactSlot<'_> {
    pub fn uri(&self) -> Option<&str> {
        self.entry.get(keys::URI).and_then(Node::as_str)
    }

    pub fn set_uri(&mut self, uri: impl Into<String>) {
        self.entry.insert(keys::URI, Node::String(uri.into()));
    }
}

impl RecipeDocument {
    pub fn component_name(&self) -> Option<&str> {
        self.get(keys::COMPONENT_NAME).and_then(Node::as_str)
    }

    pub fn component_version(&self) -> Option<&str> {
        self.get(keys::COMPONENT_VERSION).and_then(Node::as_str)
    }

    /// Visit every artifact mapping in document order
    ///
    /// Documents without `Manifests`, manifests without `Artifacts`, and
    /// entries that are not mappings are skipped. The first error stops the
    /// traversal.
    pub fn visit_artifacts_mut<E, F>(&mut self, mut visit: F) -> Result<(), E>
    where
        F: FnMut(ArtifactSlot<'_>) -> Result<(), E>,
    {
        let Some(manifests) = self.get_mut(keys::MANIFESTS).and_then(Node::as_sequence_mut) else {
            return Ok(());
        };

        for (manifest_index, manifest) in manifests.iter_mut().enumerate() {
            let Some(artifacts) = manifest
                .as_mapping_mut()
                .and_then(|m| m.get_mut(keys::ARTIFACTS))
                .and_then(Node::as_sequence_mut)
            else {
                continue;
            };

            for (artifact_index, artifact) in artifacts.iter_mut().enumerate() {
                let Some(entry) = artifact.as_mapping_mut() else {
                    continue;
                };
                visit(ArtifactSlot {
                    manifest_index,
                    artifact_index,
                    entry,
                })?;
            }
        }

        Ok(())
    }

    /// All artifact locators in document order
    pub fn artifact_uris(&self) -> Vec<String> {
        self.get(keys::MANIFESTS)
            .and_then(Node::as_sequence)
            .unwrap_or_default()
            .iter()
            .filter_map(|m| m.as_mapping()?.get(keys::ARTIFACTS)?.as_sequence())
            .flatten()
            .filter_map(|a| a.as_mapping()?.get(keys::URI)?.as_str())
            .map(str::to_string)
            .collect()
    }
}
