//! Runtime TCP console.
//!
//! Tools attach over localhost TCP and speak line-delimited JSON:
//! pings, named commands registered by the device, and mirrored log
//! output flowing back.

pub mod error;
pub mod log_sink;
pub mod protocol;
pub mod server;

pub use crate::error::{ConsoleError, ConsoleResult};
pub use crate::log_sink::ConsoleLog;
pub use crate::protocol::{Request, Response};
pub use crate::server::{CommandFn, ConsoleServer};
