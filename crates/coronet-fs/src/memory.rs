//! In-memory bundle, for tests and embedders without a disk bundle.

use std::collections::HashMap;
use std::io::{self, Cursor, Read, Seek, SeekFrom};
use std::sync::Arc;

use parking_lot::Mutex;

use crate::error::{FsError, FsResult};
use crate::path;
use crate::{BundleFile, BundleFs};

#[derive(Default)]
pub struct MemoryFs {
    entries: Mutex<HashMap<String, Arc<[u8]>>>,
}

impl MemoryFs {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds or replaces an entry.
    pub fn insert(&self, path: &str, bytes: impl Into<Vec<u8>>) -> FsResult<()> {
        path::validate(path)?;
        let blob: Arc<[u8]> = Arc::from(bytes.into());
        self.entries.lock().insert(path.to_string(), blob);
        Ok(())
    }

    /// Removes an entry. Unknown paths are a no-op.
    pub fn remove(&self, path: &str) {
        self.entries.lock().remove(path);
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }
}

impl BundleFs for MemoryFs {
    fn open(&self, path: &str) -> FsResult<Box<dyn BundleFile>> {
        path::validate(path)?;
        let blob = self
            .entries
            .lock()
            .get(path)
            .cloned()
            .ok_or_else(|| FsError::NotFound(path.to_string()))?;
        Ok(Box::new(MemoryFile {
            size: blob.len() as u64,
            cursor: Cursor::new(blob),
        }))
    }

    fn exists(&self, path: &str) -> bool {
        if path::validate(path).is_err() {
            return false;
        }
        self.entries.lock().contains_key(path)
    }
}

struct MemoryFile {
    cursor: Cursor<Arc<[u8]>>,
    size: u64,
}

impl Read for MemoryFile {
    #[inline]
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.cursor.read(buf)
    }
}

impl Seek for MemoryFile {
    #[inline]
    fn seek(&mut self, pos: SeekFrom) -> io::Result<u64> {
        self.cursor.seek(pos)
    }
}

impl BundleFile for MemoryFile {
    #[inline]
    fn size(&self) -> u64 {
        self.size
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn insert_then_read_round_trips() {
        let fs = MemoryFs::new();
        fs.insert("a/b.txt", &b"hello"[..]).unwrap();

        assert!(fs.exists("a/b.txt"));
        assert_eq!(fs.read("a/b.txt").unwrap(), b"hello");
    }

    #[test]
    fn insert_replaces_existing_entry() {
        let fs = MemoryFs::new();
        fs.insert("a.txt", &b"one"[..]).unwrap();
        fs.insert("a.txt", &b"two"[..]).unwrap();

        assert_eq!(fs.read("a.txt").unwrap(), b"two");
        assert_eq!(fs.len(), 1);
    }

    #[test]
    fn missing_entry_is_not_found() {
        let fs = MemoryFs::new();
        assert!(matches!(fs.read("nope"), Err(FsError::NotFound(_))));
        assert!(!fs.exists("nope"));
    }

    #[test]
    fn invalid_paths_are_rejected() {
        let fs = MemoryFs::new();
        assert!(matches!(
            fs.insert("../x", &b""[..]),
            Err(FsError::InvalidPath { .. })
        ));
        assert!(matches!(fs.read("/x"), Err(FsError::InvalidPath { .. })));
        assert!(!fs.exists("/x"));
    }

    #[test]
    fn open_supports_seeking() {
        let fs = MemoryFs::new();
        fs.insert("data.bin", &b"0123456789"[..]).unwrap();

        let mut f = fs.open("data.bin").unwrap();
        assert_eq!(f.size(), 10);

        f.seek(SeekFrom::End(-3)).unwrap();
        let mut tail = String::new();
        f.read_to_string(&mut tail).unwrap();
        assert_eq!(tail, "789");
    }

    #[test]
    fn remove_drops_entry() {
        let fs = MemoryFs::new();
        fs.insert("a.txt", &b"x"[..]).unwrap();
        fs.remove("a.txt");
        assert!(fs.is_empty());
        assert!(!fs.exists("a.txt"));
    }
}
