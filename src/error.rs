//! Error types for the session layer

use std::io;
use std::net::SocketAddr;
use std::time::Duration;

use tello_shared::CodecError;
use thiserror::Error;

/// Result type alias for session operations.
pub type Result<T, E = SessionError> = std::result::Result<T, E>;

/// Errors produced by the session layer
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum SessionError {
    #[error("failed to bind {role} socket on {addr}")]
    SocketBind {
        role: &'static str,
        addr: SocketAddr,
        #[source]
        source: io::Error,
    },

    #[error("I/O error on {role} socket")]
    SocketIo {
        role: &'static str,
        #[source]
        source: io::Error,
    },

    #[error("malformed telemetry datagram")]
    TelemetryParse(#[source] CodecError),

    #[error("undecodable response datagram")]
    ResponseDecode(#[source] CodecError),

    #[error("invalid command")]
    InvalidCommand(#[source] CodecError),

    #[error("no response to '{command}' within {timeout:?}")]
    CommandTimeout { command: String, timeout: Duration },

    #[error("failed to send '{command}'")]
    CommandSend {
        command: String,
        #[source]
        source: io::Error,
    },

    #[error("device rejected '{command}': {response}")]
    CommandRejected { command: String, response: String },

    #[error("session is closed")]
    SessionClosed,

    #[error("invalid session configuration: {reason}")]
    InvalidConfig { reason: String },
}

impl SessionError {
    /// Returns whether repeating the operation may succeed.
    pub fn is_retryable(&self) -> bool {
        match self {
            SessionError::CommandTimeout { .. } => true,
            SessionError::CommandSend { .. } => true,
            SessionError::SocketIo { .. } => true,
            SessionError::CommandRejected { .. } => false,
            SessionError::SocketBind { .. } => false,
            SessionError::TelemetryParse(_) => false,
            SessionError::ResponseDecode(_) => false,
            SessionError::InvalidCommand(_) => false,
            SessionError::SessionClosed => false,
            SessionError::InvalidConfig { .. } => false,
        }
    }

    pub(crate) fn invalid_config(reason: impl Into<String>) -> Self {
        SessionError::InvalidConfig {
            reason: reason.into(),
        }
    }
}
