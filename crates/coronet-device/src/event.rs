use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use crossbeam_channel::{bounded, Receiver, Sender};
use log::debug;

/// Capacity of the OS event queue. Producers never block; once the queue
/// is full further events are dropped and counted.
pub const EVENT_QUEUE_CAPACITY: usize = 256;

pub const KIND_TOUCH: i32 = 0;
pub const KIND_TOUCH_MOVE: i32 = 1;
pub const KIND_KEY: i32 = 2;
pub const KIND_METRICS: i32 = 3;
pub const KIND_PAUSE: i32 = 4;
pub const KIND_RESUME: i32 = 5;
pub const KIND_EXIT: i32 = 6;

/// An event crossing the host boundary, decoded from the five-integer
/// wire form `(kind, a, b, c, d)`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum OsEvent {
    Touch { pointer: u32, x: f32, y: f32, pressed: bool },
    TouchMove { pointer: u32, x: f32, y: f32 },
    Key { code: u32, pressed: bool },
    Metrics { width: u32, height: u32 },
    Pause,
    Resume,
    Exit,
}

impl OsEvent {
    /// Decodes the wire form. Unknown kinds are dropped (`None`); the
    /// boundary performs no validation beyond the kind itself.
    pub fn decode(kind: i32, a: i32, b: i32, c: i32, d: i32) -> Option<OsEvent> {
        match kind {
            KIND_TOUCH => Some(OsEvent::Touch {
                pointer: a as u32,
                x: b as f32,
                y: c as f32,
                pressed: d != 0,
            }),
            KIND_TOUCH_MOVE => Some(OsEvent::TouchMove {
                pointer: a as u32,
                x: b as f32,
                y: c as f32,
            }),
            KIND_KEY => Some(OsEvent::Key {
                code: a as u32,
                pressed: b != 0,
            }),
            KIND_METRICS => Some(OsEvent::Metrics {
                width: a.max(0) as u32,
                height: b.max(0) as u32,
            }),
            KIND_PAUSE => Some(OsEvent::Pause),
            KIND_RESUME => Some(OsEvent::Resume),
            KIND_EXIT => Some(OsEvent::Exit),
            other => {
                debug!(target: "device", "event.drop unknown kind={}", other);
                None
            }
        }
    }
}

/// Bounded single-consumer queue for host events. Producer handles are
/// cheap clones; draining needs `&mut self`, which pins consumption to
/// whoever owns the queue.
pub struct EventQueue {
    tx: Sender<OsEvent>,
    rx: Receiver<OsEvent>,
    dropped: Arc<AtomicU64>,
}

impl EventQueue {
    pub fn new() -> Self {
        let (tx, rx) = bounded(EVENT_QUEUE_CAPACITY);
        Self {
            tx,
            rx,
            dropped: Arc::new(AtomicU64::new(0)),
        }
    }

    pub fn writer(&self) -> EventWriter {
        EventWriter {
            tx: self.tx.clone(),
            dropped: Arc::clone(&self.dropped),
        }
    }

    /// Moves every queued event into `out`, preserving arrival order.
    /// Returns how many were moved.
    pub fn drain_into(&mut self, out: &mut Vec<OsEvent>) -> usize {
        let mut n = 0usize;
        while let Ok(ev) = self.rx.try_recv() {
            out.push(ev);
            n += 1;
        }
        n
    }

    /// Events dropped because the queue was full.
    pub fn dropped_count(&self) -> u64 {
        self.dropped.load(Ordering::Relaxed)
    }
}

impl Default for EventQueue {
    fn default() -> Self {
        Self::new()
    }
}

/// Producer handle onto an [`EventQueue`]. Safe to call from any host
/// thread; never blocks.
#[derive(Clone)]
pub struct EventWriter {
    tx: Sender<OsEvent>,
    dropped: Arc<AtomicU64>,
}

impl EventWriter {
    /// Enqueues one event. Returns `false` when the queue is full and the
    /// event was dropped.
    #[inline]
    pub fn push(&self, ev: OsEvent) -> bool {
        if self.tx.try_send(ev).is_ok() {
            true
        } else {
            self.dropped.fetch_add(1, Ordering::Relaxed);
            false
        }
    }

    /// Decodes the five-integer wire form and enqueues the result.
    /// Unknown kinds and full-queue drops both report `false`.
    pub fn push_raw(&self, kind: i32, a: i32, b: i32, c: i32, d: i32) -> bool {
        match OsEvent::decode(kind, a, b, c, d) {
            Some(ev) => self.push(ev),
            None => false,
        }
    }
}
