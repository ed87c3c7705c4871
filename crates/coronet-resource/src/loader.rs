//! Background loader thread.
//!
//! One thread reads bundle entries off the device thread. Requests and
//! completions flow over unbounded channels; closing the request
//! channel stops the thread.

use std::sync::Arc;
use std::thread::{self, JoinHandle};

use crossbeam_channel::{unbounded, Receiver, Sender, TryRecvError};
use log::debug;

use coronet_fs::{BundleFs, FsError};

use crate::error::{ResourceError, ResourceResult};
use crate::id::ResourceId;

pub(crate) struct LoadRequest {
    pub id: ResourceId,
    pub path: String,
}

pub(crate) struct LoadResult {
    pub id: ResourceId,
    pub outcome: Result<Arc<[u8]>, FsError>,
}

pub(crate) enum Poll {
    Done(LoadResult),
    Empty,
    Stopped,
}

pub(crate) struct ResourceLoader {
    tx: Option<Sender<LoadRequest>>,
    done_rx: Receiver<LoadResult>,
    handle: Option<JoinHandle<()>>,
}

impl ResourceLoader {
    pub fn spawn(fs: Arc<dyn BundleFs>) -> ResourceResult<Self> {
        let (tx, rx) = unbounded::<LoadRequest>();
        let (done_tx, done_rx) = unbounded::<LoadResult>();

        let handle = thread::Builder::new()
            .name("coronet-loader".into())
            .spawn(move || run(fs, rx, done_tx))
            .map_err(ResourceError::LoaderSpawn)?;

        Ok(Self {
            tx: Some(tx),
            done_rx,
            handle: Some(handle),
        })
    }

    /// Queues a read. Returns false if the loader has stopped.
    pub fn request(&self, id: ResourceId, path: String) -> bool {
        match &self.tx {
            Some(tx) => tx.send(LoadRequest { id, path }).is_ok(),
            None => false,
        }
    }

    pub fn poll(&self) -> Poll {
        match self.done_rx.try_recv() {
            Ok(done) => Poll::Done(done),
            Err(TryRecvError::Empty) => Poll::Empty,
            Err(TryRecvError::Disconnected) => Poll::Stopped,
        }
    }
}

impl Drop for ResourceLoader {
    fn drop(&mut self) {
        // closing the request channel makes run() return
        self.tx.take();
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}

fn run(fs: Arc<dyn BundleFs>, rx: Receiver<LoadRequest>, done: Sender<LoadResult>) {
    debug!(target: "resource", "loader.start");

    while let Ok(req) = rx.recv() {
        let outcome = fs.read(&req.path).map(Arc::<[u8]>::from);

        match &outcome {
            Ok(bytes) => {
                debug!(
                    target: "resource",
                    "loader.read id={} path='{}' bytes={}",
                    req.id,
                    req.path,
                    bytes.len()
                );
            }
            Err(e) => {
                debug!(
                    target: "resource",
                    "loader.read id={} path='{}' error='{}'",
                    req.id,
                    req.path,
                    e
                );
            }
        }

        if done.send(LoadResult { id: req.id, outcome }).is_err() {
            // manager gone
            break;
        }
    }

    debug!(target: "resource", "loader.stop");
}
