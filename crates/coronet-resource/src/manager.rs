//! Reference-counted resource table.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use log::{debug, info, warn};
use parking_lot::Mutex;

use coronet_fs::BundleFs;

use crate::error::{ResourceError, ResourceResult};
use crate::id::ResourceId;
use crate::loader::{Poll, ResourceLoader};

/// Load state of a managed resource.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResourceState {
    Requested,
    Loaded,
    Failed(Arc<str>),
}

struct Entry {
    path: String,
    refs: u32,
    state: ResourceState,
    blob: Option<Arc<[u8]>>,
}

#[derive(Default)]
struct ManagerInner {
    entries: HashMap<ResourceId, Entry>,
    outstanding: usize,
}

/// Owns every loaded blob and the loader thread.
///
/// `load` is asynchronous; the device pumps [`complete_requests`] once
/// per frame to publish finished reads. Entries are refcounted and
/// evicted when the count reaches zero.
///
/// [`complete_requests`]: ResourceManager::complete_requests
pub struct ResourceManager {
    fs: Arc<dyn BundleFs>,
    inner: Mutex<ManagerInner>,
    loader: ResourceLoader,
}

impl ResourceManager {
    pub fn new(fs: Arc<dyn BundleFs>) -> ResourceResult<Self> {
        let loader = ResourceLoader::spawn(fs.clone())?;
        Ok(Self {
            fs,
            inner: Mutex::new(ManagerInner::default()),
            loader,
        })
    }

    /// Requests `path`. The first request starts an async load; repeats
    /// only bump the reference count.
    pub fn load(&self, path: &str) -> ResourceResult<ResourceId> {
        coronet_fs::path::validate(path)?;
        let id = ResourceId::from_path(path);

        {
            let mut g = self.inner.lock();
            if let Some(e) = g.entries.get_mut(&id) {
                e.refs += 1;
                debug!(target: "resource", "load.ref id={} path='{}' refs={}", id, path, e.refs);
                return Ok(id);
            }

            g.entries.insert(
                id,
                Entry {
                    path: path.to_string(),
                    refs: 1,
                    state: ResourceState::Requested,
                    blob: None,
                },
            );
            g.outstanding += 1;
        }

        info!(target: "resource", "load.request id={} path='{}'", id, path);

        if !self.loader.request(id, path.to_string()) {
            let mut g = self.inner.lock();
            g.outstanding = g.outstanding.saturating_sub(1);
            if let Some(e) = g.entries.get_mut(&id) {
                e.state = ResourceState::Failed(Arc::from("loader stopped"));
            }
            warn!(target: "resource", "load.rejected id={} path='{}' loader stopped", id, path);
        }

        Ok(id)
    }

    /// Publishes finished loads. Returns how many settled.
    pub fn complete_requests(&self) -> usize {
        self.pump().0
    }

    /// Blocks until no request is outstanding. Used at boot to make a
    /// package resident before the game sees it.
    pub fn flush(&self) {
        loop {
            let (_, stopped) = self.pump();

            let pending = self.inner.lock().outstanding;
            if pending == 0 {
                return;
            }
            if stopped {
                warn!(target: "resource", "flush.aborted pending={}", pending);
                return;
            }

            std::thread::sleep(Duration::from_millis(1));
        }
    }

    #[inline]
    pub fn get(&self, id: ResourceId) -> Option<Arc<[u8]>> {
        let g = self.inner.lock();
        g.entries.get(&id).and_then(|e| e.blob.clone())
    }

    #[inline]
    pub fn state(&self, id: ResourceId) -> Option<ResourceState> {
        let g = self.inner.lock();
        g.entries.get(&id).map(|e| e.state.clone())
    }

    /// Whether `id` is managed and fully loaded.
    #[inline]
    pub fn has(&self, id: ResourceId) -> bool {
        matches!(self.state(id), Some(ResourceState::Loaded))
    }

    /// Drops one reference. At zero the entry and its blob go away.
    /// Unknown ids are a logged no-op.
    pub fn unload(&self, id: ResourceId) {
        let mut g = self.inner.lock();
        let Some(e) = g.entries.get_mut(&id) else {
            warn!(target: "resource", "unload.unknown id={}", id);
            return;
        };

        e.refs -= 1;
        if e.refs == 0 {
            debug!(target: "resource", "unload.evict id={} path='{}'", id, e.path);
            g.entries.remove(&id);
        }
    }

    /// Re-reads `path` and republishes its blob. The resource must
    /// already be managed. Blocking; meant for the dev console.
    pub fn reload(&self, path: &str) -> ResourceResult<usize> {
        coronet_fs::path::validate(path)?;
        let id = ResourceId::from_path(path);

        if !self.inner.lock().entries.contains_key(&id) {
            return Err(ResourceError::NotManaged {
                path: path.to_string(),
            });
        }

        let bytes = self.fs.read(path)?;
        let len = bytes.len();
        let blob = Arc::<[u8]>::from(bytes);

        let mut g = self.inner.lock();
        if let Some(e) = g.entries.get_mut(&id) {
            e.blob = Some(blob);
            e.state = ResourceState::Loaded;
        }
        drop(g);

        info!(target: "resource", "reload id={} path='{}' bytes={}", id, path, len);
        Ok(len)
    }

    fn pump(&self) -> (usize, bool) {
        let mut published = 0;
        loop {
            match self.loader.poll() {
                Poll::Done(done) => {
                    self.publish(done);
                    published += 1;
                }
                Poll::Empty => return (published, false),
                Poll::Stopped => return (published, true),
            }
        }
    }

    fn publish(&self, done: crate::loader::LoadResult) {
        let mut g = self.inner.lock();
        g.outstanding = g.outstanding.saturating_sub(1);

        let Some(e) = g.entries.get_mut(&done.id) else {
            // unloaded while the read was in flight
            debug!(target: "resource", "complete.orphan id={}", done.id);
            return;
        };

        match done.outcome {
            Ok(blob) => {
                let path = e.path.clone();
                let len = blob.len();
                e.blob = Some(blob);
                e.state = ResourceState::Loaded;
                drop(g);
                info!(target: "resource", "load.done id={} path='{}' bytes={}", done.id, path, len);
            }
            Err(err) => {
                let path = e.path.clone();
                e.state = ResourceState::Failed(Arc::from(err.to_string().as_str()));
                drop(g);
                warn!(target: "resource", "load.failed id={} path='{}' error='{}'", done.id, path, err);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use coronet_fs::MemoryFs;

    fn bundle() -> Arc<MemoryFs> {
        let fs = MemoryFs::new();
        fs.insert("a.txt", &b"alpha"[..]).unwrap();
        fs.insert("b.txt", &b"beta"[..]).unwrap();
        Arc::new(fs)
    }

    #[test]
    fn load_flush_get() {
        let rm = ResourceManager::new(bundle()).unwrap();

        let id = rm.load("a.txt").unwrap();
        rm.flush();

        assert_eq!(rm.state(id), Some(ResourceState::Loaded));
        assert!(rm.has(id));
        assert_eq!(rm.get(id).unwrap().as_ref(), b"alpha");
    }

    #[test]
    fn repeat_load_only_bumps_refs() {
        let rm = ResourceManager::new(bundle()).unwrap();

        let id1 = rm.load("a.txt").unwrap();
        rm.flush();
        let id2 = rm.load("a.txt").unwrap();
        assert_eq!(id1, id2);

        // one unload keeps the entry alive
        rm.unload(id1);
        assert!(rm.has(id1));

        // second drops it
        rm.unload(id1);
        assert_eq!(rm.state(id1), None);
        assert!(rm.get(id1).is_none());
    }

    #[test]
    fn unload_unknown_is_a_noop() {
        let rm = ResourceManager::new(bundle()).unwrap();
        rm.unload(ResourceId::from_path("never-loaded"));
    }

    #[test]
    fn missing_entry_fails_but_stays_observable() {
        let rm = ResourceManager::new(bundle()).unwrap();

        let id = rm.load("missing.txt").unwrap();
        rm.flush();

        match rm.state(id) {
            Some(ResourceState::Failed(msg)) => assert!(msg.contains("missing.txt")),
            other => panic!("expected Failed, got {:?}", other),
        }
        assert!(rm.get(id).is_none());
        assert!(!rm.has(id));
    }

    #[test]
    fn invalid_path_is_rejected_synchronously() {
        let rm = ResourceManager::new(bundle()).unwrap();
        assert!(rm.load("../escape").is_err());
    }

    #[test]
    fn complete_requests_settles_everything_eventually() {
        let rm = ResourceManager::new(bundle()).unwrap();
        let a = rm.load("a.txt").unwrap();
        let b = rm.load("b.txt").unwrap();

        let mut settled = 0;
        while settled < 2 {
            settled += rm.complete_requests();
            std::thread::sleep(Duration::from_millis(1));
        }

        assert!(rm.has(a));
        assert!(rm.has(b));
        assert_eq!(rm.complete_requests(), 0);
    }

    #[test]
    fn reload_republishes_fresh_bytes() {
        let fs = bundle();
        let rm = ResourceManager::new(fs.clone()).unwrap();

        let id = rm.load("a.txt").unwrap();
        rm.flush();
        assert_eq!(rm.get(id).unwrap().as_ref(), b"alpha");

        fs.insert("a.txt", &b"alpha-v2"[..]).unwrap();
        let len = rm.reload("a.txt").unwrap();
        assert_eq!(len, 8);
        assert_eq!(rm.get(id).unwrap().as_ref(), b"alpha-v2");
    }

    #[test]
    fn reload_requires_a_managed_entry() {
        let rm = ResourceManager::new(bundle()).unwrap();
        assert!(matches!(
            rm.reload("a.txt"),
            Err(ResourceError::NotManaged { .. })
        ));
    }
}
