//! Log mirroring.
//!
//! [`ConsoleLog`] wraps the process logger installed at startup. Every
//! record goes to the wrapped logger first; while a console is
//! listening, records are also broadcast to its clients as `message`
//! objects.

use std::sync::OnceLock;

use log::{Level, LevelFilter, Log, Metadata, Record, SetLoggerError};
use parking_lot::Mutex;

use crate::protocol::Response;
use crate::server::ClientHub;

static HUB: OnceLock<Mutex<Option<ClientHub>>> = OnceLock::new();

fn hub_slot() -> &'static Mutex<Option<ClientHub>> {
    HUB.get_or_init(|| Mutex::new(None))
}

pub(crate) fn attach(hub: ClientHub) {
    *hub_slot().lock() = Some(hub);
}

pub(crate) fn detach() {
    *hub_slot().lock() = None;
}

pub struct ConsoleLog {
    inner: Box<dyn Log>,
}

impl ConsoleLog {
    pub fn new(inner: Box<dyn Log>) -> Self {
        Self { inner }
    }

    /// Installs over the process logger. Call once at startup, before
    /// any console starts listening.
    pub fn install(inner: Box<dyn Log>, max_level: LevelFilter) -> Result<(), SetLoggerError> {
        log::set_boxed_logger(Box::new(Self::new(inner)))?;
        log::set_max_level(max_level);
        Ok(())
    }
}

impl Log for ConsoleLog {
    fn enabled(&self, metadata: &Metadata) -> bool {
        self.inner.enabled(metadata)
    }

    fn log(&self, record: &Record) {
        // local output first, so console trouble never hides a line
        self.inner.log(record);

        let hub = hub_slot().lock().clone();
        if let Some(hub) = hub {
            let resp = Response::Message {
                severity: severity(record.level()),
                message: record.args().to_string(),
            };
            if let Ok(line) = serde_json::to_string(&resp) {
                hub.broadcast_line(&line);
            }
        }
    }

    fn flush(&self) {
        self.inner.flush();
    }
}

fn severity(level: Level) -> &'static str {
    match level {
        Level::Error => "error",
        Level::Warn => "warning",
        Level::Info => "info",
        Level::Debug | Level::Trace => "debug",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn severity_strings_match_the_wire_format() {
        assert_eq!(severity(Level::Error), "error");
        assert_eq!(severity(Level::Warn), "warning");
        assert_eq!(severity(Level::Info), "info");
        assert_eq!(severity(Level::Debug), "debug");
        assert_eq!(severity(Level::Trace), "debug");
    }
}
