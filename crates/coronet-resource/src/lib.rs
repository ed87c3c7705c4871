//! Runtime resource management.
//!
//! Resources are raw bundle blobs addressed by logical path and keyed
//! by a stable 64-bit hash of that path. The manager refcounts entries
//! and loads asynchronously on a background thread; packages group
//! resources so boot sets can be made resident in one step.

pub mod error;
pub mod id;
mod loader;
pub mod manager;
pub mod package;

pub use crate::error::{ResourceError, ResourceResult};
pub use crate::id::ResourceId;
pub use crate::manager::{ResourceManager, ResourceState};
pub use crate::package::ResourcePackage;
