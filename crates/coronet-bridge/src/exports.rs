use core::ffi::{c_char, c_int};
use std::ffi::CStr;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::path::Path;
use std::sync::Arc;

use log::{info, warn};
use parking_lot::Mutex;

use coronet_fs::DiskFs;

use crate::slot::{self, SlotError};

pub const CORONET_OK: c_int = 0;
pub const CORONET_ERR_ALREADY_INIT: c_int = -1;
pub const CORONET_ERR_NOT_INIT: c_int = -2;
pub const CORONET_ERR_NO_SOURCE: c_int = -3;
pub const CORONET_ERR_INVALID_ARG: c_int = -4;
pub const CORONET_ERR_BOOT: c_int = -5;
pub const CORONET_ERR_PANIC: c_int = -6;

static LAST_ERROR: Mutex<Option<String>> = Mutex::new(None);

static VERSION: &str = concat!(env!("CARGO_PKG_VERSION"), "\0");

fn set_last_error(msg: String) {
    *LAST_ERROR.lock() = Some(msg);
}

fn take_last_error() -> Option<String> {
    LAST_ERROR.lock().take()
}

/// Never unwind into the host. No logging here: the logger itself may
/// be what panicked.
fn guarded(name: &'static str, f: impl FnOnce() -> c_int) -> c_int {
    match catch_unwind(AssertUnwindSafe(f)) {
        Ok(status) => status,
        Err(_) => {
            set_last_error(format!("panic inside {}", name));
            CORONET_ERR_PANIC
        }
    }
}

/// Installs a disk-backed bundle source rooted at `path` (the desktop
/// analog of handing over an asset manager).
#[no_mangle]
pub extern "C" fn coronet_init_bundle_dir(path: *const c_char) -> c_int {
    guarded("coronet_init_bundle_dir", || {
        crate::logging::init();
        if path.is_null() {
            set_last_error("bundle path is null".to_string());
            return CORONET_ERR_INVALID_ARG;
        }
        // Safety: non-null and NUL-terminated per the ABI contract.
        let raw = unsafe { CStr::from_ptr(path) };
        let Ok(text) = raw.to_str() else {
            set_last_error("bundle path is not utf-8".to_string());
            return CORONET_ERR_INVALID_ARG;
        };
        if !Path::new(text).is_dir() {
            set_last_error(format!("bundle dir '{}' does not exist", text));
            return CORONET_ERR_INVALID_ARG;
        }

        slot::install_bundle_fs(Arc::new(DiskFs::new(text)));
        info!(target: "bridge", "bridge.bundle_dir path='{}'", text);
        CORONET_OK
    })
}

/// Creates and boots the process device from the installed bundle
/// source and game.
#[no_mangle]
pub extern "C" fn coronet_init() -> c_int {
    guarded("coronet_init", || {
        crate::logging::init();
        match slot::boot() {
            Ok(()) => CORONET_OK,
            Err(SlotError::AlreadyInitialized) => {
                warn!(target: "bridge", "bridge.init refused: already initialized");
                set_last_error("device already initialized".to_string());
                CORONET_ERR_ALREADY_INIT
            }
            Err(SlotError::NoSource) => {
                warn!(target: "bridge", "bridge.init refused: no bundle source installed");
                set_last_error("no bundle source installed".to_string());
                CORONET_ERR_NO_SOURCE
            }
            Err(SlotError::Boot(e)) => {
                warn!(target: "bridge", "bridge.init failed: {}", e);
                set_last_error(format!("device boot failed: {}", e));
                CORONET_ERR_BOOT
            }
        }
    })
}

/// Runs one frame. Returns `1` while running, `0` once the device has
/// stopped, negative on misuse.
#[no_mangle]
pub extern "C" fn coronet_frame() -> c_int {
    guarded("coronet_frame", || match slot::frame() {
        Some(true) => 1,
        Some(false) => 0,
        None => {
            set_last_error("device not initialized".to_string());
            CORONET_ERR_NOT_INIT
        }
    })
}

/// Shuts the device down and clears the process slot. The bundle source
/// stays installed for a later re-init.
#[no_mangle]
pub extern "C" fn coronet_shutdown() -> c_int {
    guarded("coronet_shutdown", || {
        if slot::teardown() {
            CORONET_OK
        } else {
            set_last_error("device not initialized".to_string());
            CORONET_ERR_NOT_INIT
        }
    })
}

/// Queues one host event in its five-integer wire form. Callable from
/// any thread; never blocks. Before init events are dropped.
#[no_mangle]
pub extern "C" fn coronet_push_event(kind: c_int, a: c_int, b: c_int, c: c_int, d: c_int) {
    let _ = guarded("coronet_push_event", || {
        slot::push_event(kind, a, b, c, d);
        CORONET_OK
    });
}

#[no_mangle]
pub extern "C" fn coronet_pause() {
    let _ = guarded("coronet_pause", || {
        slot::pause();
        CORONET_OK
    });
}

#[no_mangle]
pub extern "C" fn coronet_unpause() {
    let _ = guarded("coronet_unpause", || {
        slot::unpause();
        CORONET_OK
    });
}

#[no_mangle]
pub extern "C" fn coronet_is_init() -> c_int {
    guarded("coronet_is_init", || slot::is_init() as c_int)
}

#[no_mangle]
pub extern "C" fn coronet_is_running() -> c_int {
    guarded("coronet_is_running", || slot::is_running() as c_int)
}

#[no_mangle]
pub extern "C" fn coronet_is_paused() -> c_int {
    guarded("coronet_is_paused", || slot::is_paused() as c_int)
}

/// Copies the most recent error message into `out`, NUL-terminated and
/// truncated to `out_len`. Returns the bytes written, excluding the
/// NUL. Clears the stored message; with none stored the result is
/// empty.
#[no_mangle]
pub extern "C" fn coronet_last_error(out: *mut c_char, out_len: u32) -> u32 {
    if out.is_null() || out_len == 0 {
        return 0;
    }
    let msg = take_last_error().unwrap_or_default();
    // Safety: caller provides a writable buffer of at least `out_len`.
    let buf = unsafe { core::slice::from_raw_parts_mut(out as *mut u8, out_len as usize) };
    let n = msg.len().min(buf.len().saturating_sub(1));
    buf[..n].copy_from_slice(&msg.as_bytes()[..n]);
    buf[n] = 0;
    n as u32
}

/// Static NUL-terminated engine version.
#[no_mangle]
pub extern "C" fn coronet_version() -> *const c_char {
    VERSION.as_ptr() as *const c_char
}
