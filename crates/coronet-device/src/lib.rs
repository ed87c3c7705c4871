//! The engine device.
//!
//! A [`Device`] pairs a bundle source with a game and runs the frame
//! loop: host events in, console commands executed, resource requests
//! completed, one game update per frame. The host boundary is the
//! five-integer event wire decoded in [`event`] plus the lifecycle
//! calls `init`, `frame` and `shutdown`.

pub mod boot;
pub mod device;
pub mod error;
pub mod event;
pub mod frame;
pub mod game;
pub mod time;

pub use crate::boot::{BootConfig, ConsoleConfig, BOOT_CONFIG_PATH};
pub use crate::device::Device;
pub use crate::error::{DeviceError, DeviceResult};
pub use crate::event::{
    EventQueue, EventWriter, OsEvent, EVENT_QUEUE_CAPACITY, KIND_EXIT, KIND_KEY, KIND_METRICS,
    KIND_PAUSE, KIND_RESUME, KIND_TOUCH, KIND_TOUCH_MOVE,
};
pub use crate::frame::DeviceCtx;
pub use crate::game::{Game, NullGame};
pub use crate::time::{FrameTime, MAX_DT_SEC};
