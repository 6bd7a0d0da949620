//! Object storage interface

use compack_core::S3Uri;

use crate::error::Result;

/// Object storage holding component artifacts
pub trait ObjectStore {
    /// Metadata-only existence check; nothing is downloaded
    fn object_exists(&self, uri: &S3Uri) -> Result<bool>;
}
