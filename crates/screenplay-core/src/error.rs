//! Error types for Screenplay Core

use crate::types::PlaybackState;
use thiserror::Error;

/// Result type alias for player operations
pub type Result<T> = std::result::Result<T, Error>;

/// Player error types
#[derive(Error, Debug)]
pub enum Error {
    // Protocol errors
    #[error("Cannot {operation} while in the '{state}' state")]
    IllegalState {
        operation: &'static str,
        state: PlaybackState,
    },

    #[error("Operation not supported by this player: {0}")]
    Unsupported(&'static str),

    // Backend errors
    #[error("Backend rejected {operation} (code {code})")]
    BackendRejected { operation: &'static str, code: i32 },

    #[error("{0}")]
    Device(String),

    // Strategy errors
    #[error("Live playback is not supported for the {window} window")]
    UnsupportedLiveSupport { window: String },

    // Configuration errors
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    // Session errors
    #[error("Playback session has shut down")]
    SessionClosed,
}

impl Error {
    /// Create a device fault error
    pub fn device(msg: impl Into<String>) -> Self {
        Error::Device(msg.into())
    }

    /// Returns true if the failure is an expected race with the backend that
    /// the state machine absorbs rather than surfacing
    pub fn is_recoverable(&self) -> bool {
        matches!(self, Error::BackendRejected { .. })
    }

    /// Returns the error code for diagnostics
    pub fn error_code(&self) -> &'static str {
        match self {
            Error::IllegalState { .. } => "ILLEGAL_STATE",
            Error::Unsupported(_) => "UNSUPPORTED",
            Error::BackendRejected { .. } => "BACKEND_REJECTED",
            Error::Device(_) => "DEVICE",
            Error::UnsupportedLiveSupport { .. } => "LIVE_UNSUPPORTED",
            Error::InvalidConfig(_) => "INVALID_CONFIG",
            Error::Serialization(_) => "SERIALIZATION",
            Error::SessionClosed => "SESSION_CLOSED",
        }
    }
}
