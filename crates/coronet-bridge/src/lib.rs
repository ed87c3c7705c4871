//! The managed-host boundary.
//!
//! One process-wide device driven through C ABI entry points, mirrored
//! as JNI symbols on Android. A host installs a bundle source (disk dir
//! or asset manager) and optionally a game object, then runs
//! `init`/`frame`/`shutdown`; events cross as five integers and are
//! decoded on this side.

pub mod exports;
mod logging;
pub mod slot;

#[cfg(target_os = "android")]
pub mod android;

pub use crate::exports::{
    coronet_frame, coronet_init, coronet_init_bundle_dir, coronet_is_init, coronet_is_paused,
    coronet_is_running, coronet_last_error, coronet_pause, coronet_push_event, coronet_shutdown,
    coronet_unpause, coronet_version, CORONET_ERR_ALREADY_INIT, CORONET_ERR_BOOT,
    CORONET_ERR_INVALID_ARG, CORONET_ERR_NOT_INIT, CORONET_ERR_NO_SOURCE, CORONET_ERR_PANIC,
    CORONET_OK,
};
pub use crate::slot::{install_bundle_fs, install_game};
