//! Read-only access to the game bundle.
//!
//! A bundle is the packaged set of files the runtime boots from: on
//! desktop a directory tree ([`DiskFs`]), on Android the APK assets
//! (`ApkFs`), in tests an in-memory map ([`MemoryFs`]). All sources
//! share the strict path rules in [`path`].

use std::io::{Read, Seek};

pub mod disk;
pub mod error;
pub mod memory;
pub mod path;

#[cfg(target_os = "android")]
pub mod apk;

pub use crate::disk::DiskFs;
pub use crate::error::{FsError, FsResult};
pub use crate::memory::MemoryFs;

#[cfg(target_os = "android")]
pub use crate::apk::ApkFs;

/// A bundle source.
///
/// Shared between the device thread and the resource loader thread,
/// hence `Send + Sync`.
pub trait BundleFs: Send + Sync {
    /// Opens an entry for streaming reads.
    fn open(&self, path: &str) -> FsResult<Box<dyn BundleFile>>;

    /// Returns whether `path` names an entry. Invalid paths are simply
    /// absent.
    fn exists(&self, path: &str) -> bool;

    /// Reads a whole entry into memory.
    fn read(&self, path: &str) -> FsResult<Vec<u8>> {
        let mut file = self.open(path)?;
        let mut bytes = Vec::with_capacity(file.size() as usize);
        file.read_to_end(&mut bytes)
            .map_err(|e| FsError::Io {
                path: path.to_string(),
                source: e,
            })?;
        Ok(bytes)
    }
}

/// An open bundle entry.
pub trait BundleFile: Read + Seek {
    /// Total size in bytes.
    fn size(&self) -> u64;
}
