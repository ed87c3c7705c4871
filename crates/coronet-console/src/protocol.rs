//! Console wire protocol.
//!
//! One JSON object per LF-terminated line, both directions. Requests
//! carry a `type` tag; command requests keep their extra fields, which
//! the handler receives untouched.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Client to engine.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Request {
    Ping,
    Command {
        command: String,
        #[serde(flatten)]
        rest: Map<String, Value>,
    },
}

/// Engine to client.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Response {
    Pong,
    Success {
        message: String,
    },
    Error {
        message: String,
    },
    /// A mirrored log record.
    Message {
        severity: &'static str,
        message: String,
    },
}

impl Response {
    #[inline]
    pub fn success(message: impl Into<String>) -> Self {
        Self::Success {
            message: message.into(),
        }
    }

    #[inline]
    pub fn error(message: impl Into<String>) -> Self {
        Self::Error {
            message: message.into(),
        }
    }
}
