use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;

use coronet_device::{Device, DeviceError, EventWriter, Game, NullGame};
use coronet_fs::BundleFs;

/// Process-wide device. The managed host talks through static entry
/// points, so there is exactly one device per process.
static SLOT: Mutex<Option<Device>> = Mutex::new(None);

/// Event producer, split out of [`SLOT`] so `push_event` never waits on
/// a frame in progress.
static WRITER: Mutex<Option<EventWriter>> = Mutex::new(None);

/// Game installed by the embedder; consumed by the next boot.
static GAME: Mutex<Option<Box<dyn Game>>> = Mutex::new(None);

/// Bundle source for the next boot. Survives shutdown, so a host can
/// re-init without installing it again.
static SOURCE: Mutex<Option<Arc<dyn BundleFs>>> = Mutex::new(None);

/// Guards the window between the slot check and the slot store while a
/// boot is in flight.
static BOOTING: AtomicBool = AtomicBool::new(false);

#[derive(Debug)]
pub(crate) enum SlotError {
    AlreadyInitialized,
    NoSource,
    Boot(DeviceError),
}

/// Installs the game the next boot will run. Replaces a previously
/// installed, not-yet-consumed game. Without one the device boots the
/// no-op [`NullGame`].
pub fn install_game(game: Box<dyn Game>) {
    *GAME.lock() = Some(game);
}

/// Installs the bundle source the next boot will read from.
pub fn install_bundle_fs(fs: Arc<dyn BundleFs>) {
    *SOURCE.lock() = Some(fs);
}

/// Boots the process device. The boot itself runs outside the slot lock
/// (it may block on `console.wait`); [`BOOTING`] keeps a second caller
/// out of the window.
pub(crate) fn boot() -> Result<(), SlotError> {
    if BOOTING.swap(true, Ordering::SeqCst) {
        return Err(SlotError::AlreadyInitialized);
    }
    let result = boot_inner();
    BOOTING.store(false, Ordering::SeqCst);
    result
}

fn boot_inner() -> Result<(), SlotError> {
    if SLOT.lock().is_some() {
        return Err(SlotError::AlreadyInitialized);
    }
    let fs = SOURCE.lock().clone().ok_or(SlotError::NoSource)?;
    let game = GAME.lock().take().unwrap_or_else(|| Box::new(NullGame));

    let device = Device::init(fs, game).map_err(SlotError::Boot)?;
    *WRITER.lock() = Some(device.event_writer());
    *SLOT.lock() = Some(device);
    Ok(())
}

/// Shuts down and clears the device. Returns `false` when there was
/// none. The writer goes first so host pushes during teardown drop
/// instead of landing in a dying queue.
pub(crate) fn teardown() -> bool {
    *WRITER.lock() = None;
    let device = SLOT.lock().take();
    match device {
        Some(device) => {
            device.shutdown();
            true
        }
        None => false,
    }
}

/// Runs one frame. `None` when no device exists. Holds the slot for the
/// whole frame, which serializes lifecycle calls against it.
pub(crate) fn frame() -> Option<bool> {
    SLOT.lock().as_mut().map(|d| d.frame())
}

/// Queues one wire event. Pushes with no device (or an unknown kind, or
/// a full queue) are dropped; returns whether the event was accepted.
pub(crate) fn push_event(kind: i32, a: i32, b: i32, c: i32, d: i32) -> bool {
    let writer = WRITER.lock().clone();
    match writer {
        Some(w) => w.push_raw(kind, a, b, c, d),
        None => false,
    }
}

pub(crate) fn is_init() -> bool {
    SLOT.lock().is_some()
}

pub(crate) fn is_running() -> bool {
    SLOT.lock().as_ref().map(Device::is_running).unwrap_or(false)
}

pub(crate) fn is_paused() -> bool {
    SLOT.lock().as_ref().map(Device::is_paused).unwrap_or(false)
}

pub(crate) fn pause() {
    if let Some(d) = SLOT.lock().as_mut() {
        d.pause();
    }
}

pub(crate) fn unpause() {
    if let Some(d) = SLOT.lock().as_mut() {
        d.unpause();
    }
}

/// Drops every piece of process state, shutting down a live device on
/// the way. Tests share one process; each starts from a clean slot.
#[cfg(test)]
pub(crate) fn reset() {
    *WRITER.lock() = None;
    let device = SLOT.lock().take();
    if let Some(device) = device {
        device.shutdown();
    }
    *GAME.lock() = None;
    *SOURCE.lock() = None;
}
