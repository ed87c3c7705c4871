//! Bundle access through the NDK asset manager.
//!
//! On Android the bundle ships inside the APK and is read through
//! `AAssetManager`. The manager handle is owned by the Java side; this
//! source only borrows it, which is why construction is unsafe.

use std::ffi::CString;
use std::io::{self, Read, Seek, SeekFrom};
use std::ptr::NonNull;

use log::debug;
use ndk::asset::{Asset, AssetManager};

use crate::error::{FsError, FsResult};
use crate::path;
use crate::{BundleFile, BundleFs};

pub struct ApkFs {
    mgr: AssetManager,
}

impl ApkFs {
    pub fn new(mgr: AssetManager) -> Self {
        debug!(target: "fs", "apk.source");
        Self { mgr }
    }

    /// Wraps a raw `AAssetManager`.
    ///
    /// # Safety
    /// `ptr` must point to a live `AAssetManager` that outlives this
    /// source. The host keeps the Java `AssetManager` referenced for
    /// the process lifetime.
    pub unsafe fn from_raw(ptr: NonNull<ndk_sys::AAssetManager>) -> Self {
        Self::new(AssetManager::from_ptr(ptr))
    }

    fn open_asset(&self, bundle_path: &str) -> FsResult<Asset> {
        path::validate(bundle_path)?;
        // validate() already rejects NUL bytes
        let c_path = CString::new(bundle_path)
            .map_err(|_| FsError::invalid(bundle_path, "NUL byte"))?;
        self.mgr
            .open(&c_path)
            .ok_or_else(|| FsError::NotFound(bundle_path.to_string()))
    }
}

impl BundleFs for ApkFs {
    fn open(&self, path: &str) -> FsResult<Box<dyn BundleFile>> {
        let asset = self.open_asset(path)?;
        let size = asset.length() as u64;
        Ok(Box::new(ApkFile { asset, size }))
    }

    fn exists(&self, path: &str) -> bool {
        self.open_asset(path).is_ok()
    }
}

struct ApkFile {
    asset: Asset,
    size: u64,
}

impl Read for ApkFile {
    #[inline]
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.asset.read(buf)
    }
}

impl Seek for ApkFile {
    #[inline]
    fn seek(&mut self, pos: SeekFrom) -> io::Result<u64> {
        self.asset.seek(pos)
    }
}

impl BundleFile for ApkFile {
    #[inline]
    fn size(&self) -> u64 {
        self.size
    }
}
