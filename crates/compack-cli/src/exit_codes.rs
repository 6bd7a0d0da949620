//! Standard exit codes for CLI operations
//!
//! These exit codes follow Unix conventions: 0 for success, 1 for an
//! unspecified failure, small distinct values for each failure class.

/// General error - unspecified failure
pub const ERROR: i32 = 1;

/// Config error - missing or invalid compack.json, bad flags
pub const CONFIG_ERROR: i32 = 2;

/// Recipe error - unreadable recipe, or no build recipe to publish
pub const RECIPE_ERROR: i32 = 3;

/// Artifact error - an artifact could not be found locally or remotely
pub const ARTIFACT_ERROR: i32 = 4;

/// IO error - file not found, permission denied, etc.
pub const IO_ERROR: i32 = 5;

/// Version error - version conflict or failed version resolution
pub const VERSION_ERROR: i32 = 6;
