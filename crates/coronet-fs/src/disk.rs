//! Bundle rooted at a directory on disk.

use std::fs::File;
use std::io::{self, ErrorKind, Read, Seek, SeekFrom};
use std::path::PathBuf;

use log::debug;

use crate::error::{FsError, FsResult};
use crate::path;
use crate::{BundleFile, BundleFs};

pub struct DiskFs {
    root: PathBuf,
}

impl DiskFs {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        let root = root.into();
        debug!(target: "fs", "disk.source root='{}'", root.display());
        Self { root }
    }

    #[inline]
    pub fn root(&self) -> &std::path::Path {
        &self.root
    }

    /// Maps a validated bundle path below the root. The path rules
    /// guarantee the result cannot escape it.
    fn resolve(&self, bundle_path: &str) -> FsResult<PathBuf> {
        path::validate(bundle_path)?;
        let mut full = self.root.clone();
        for comp in bundle_path.split('/') {
            full.push(comp);
        }
        Ok(full)
    }
}

impl BundleFs for DiskFs {
    fn open(&self, path: &str) -> FsResult<Box<dyn BundleFile>> {
        let full = self.resolve(path)?;
        let file = File::open(&full).map_err(|e| match e.kind() {
            ErrorKind::NotFound => FsError::NotFound(path.to_string()),
            _ => FsError::io(path, e),
        })?;
        let size = file.metadata().map_err(|e| FsError::io(path, e))?.len();
        Ok(Box::new(DiskFile { file, size }))
    }

    fn exists(&self, path: &str) -> bool {
        match self.resolve(path) {
            Ok(full) => full.is_file(),
            Err(_) => false,
        }
    }
}

struct DiskFile {
    file: File,
    size: u64,
}

impl Read for DiskFile {
    #[inline]
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.file.read(buf)
    }
}

impl Seek for DiskFile {
    #[inline]
    fn seek(&mut self, pos: SeekFrom) -> io::Result<u64> {
        self.file.seek(pos)
    }
}

impl BundleFile for DiskFile {
    #[inline]
    fn size(&self) -> u64 {
        self.size
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;

    fn temp_bundle(tag: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("coronet-fs-{}-{}", tag, std::process::id()));
        let _ = std::fs::remove_dir_all(&dir);
        std::fs::create_dir_all(dir.join("sub")).unwrap();
        std::fs::write(dir.join("top.txt"), b"top").unwrap();
        std::fs::write(dir.join("sub").join("inner.bin"), b"inner-bytes").unwrap();
        dir
    }

    #[test]
    fn reads_entries_below_root() {
        let root = temp_bundle("read");
        let fs = DiskFs::new(&root);

        assert_eq!(fs.read("top.txt").unwrap(), b"top");
        assert_eq!(fs.read("sub/inner.bin").unwrap(), b"inner-bytes");

        std::fs::remove_dir_all(root).unwrap();
    }

    #[test]
    fn exists_matches_files_only() {
        let root = temp_bundle("exists");
        let fs = DiskFs::new(&root);

        assert!(fs.exists("top.txt"));
        assert!(fs.exists("sub/inner.bin"));
        assert!(!fs.exists("sub"));
        assert!(!fs.exists("missing.txt"));

        std::fs::remove_dir_all(root).unwrap();
    }

    #[test]
    fn missing_entry_is_not_found() {
        let root = temp_bundle("missing");
        let fs = DiskFs::new(&root);

        match fs.read("missing.txt") {
            Err(FsError::NotFound(p)) => assert_eq!(p, "missing.txt"),
            other => panic!("expected NotFound, got {:?}", other),
        }

        std::fs::remove_dir_all(root).unwrap();
    }

    #[test]
    fn traversal_is_rejected_before_io() {
        let root = temp_bundle("traversal");
        let fs = DiskFs::new(&root);

        assert!(matches!(
            fs.read("../secret"),
            Err(FsError::InvalidPath { .. })
        ));
        assert!(matches!(
            fs.read("/etc/hosts"),
            Err(FsError::InvalidPath { .. })
        ));
        assert!(!fs.exists("../secret"));

        std::fs::remove_dir_all(root).unwrap();
    }

    #[test]
    fn open_reports_size_and_seeks() {
        let root = temp_bundle("open");
        let fs = DiskFs::new(&root);

        let mut f = fs.open("sub/inner.bin").unwrap();
        assert_eq!(f.size(), 11);

        f.seek(SeekFrom::Start(6)).unwrap();
        let mut rest = Vec::new();
        f.read_to_end(&mut rest).unwrap();
        assert_eq!(rest, b"bytes");

        std::fs::remove_dir_all(root).unwrap();
    }

    #[test]
    fn root_accessor_returns_configured_dir() {
        let fs = DiskFs::new("some/dir");
        assert_eq!(fs.root(), Path::new("some/dir"));
    }
}
