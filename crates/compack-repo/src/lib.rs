//! Compack Repo - Component registry and object storage clients
//!
//! The engine only talks to the two traits defined here:
//! - [`ComponentRegistry`]: list published versions, check a version exists
//! - [`ObjectStore`]: check whether an artifact exists at an `s3://` locator
//!
//! Implementations:
//! - **Directory**: [`DirectoryRegistry`] / [`DirectoryObjectStore`] keep
//!   everything in a local directory (used by the CLI)
//! - **Memory**: [`MemoryRegistry`] / [`MemoryObjectStore`] for tests

pub mod error;
pub mod file;
pub mod mock;
pub mod registry;
pub mod storage;

pub use error::{RepoError, Result};
pub use file::{ComponentRecord, DirectoryObjectStore, DirectoryRegistry, StoredObject};
pub use mock::{MemoryObjectStore, MemoryRegistry, OperationCounts};
pub use registry::{sort_newest_first, ComponentIdentity, ComponentRegistry};
pub use storage::ObjectStore;
