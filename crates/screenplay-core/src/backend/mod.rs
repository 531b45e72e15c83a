//! Backend capability interface
//!
//! A backend is the concrete media element or device plugin. The state
//! machine drives it through [`MediaBackend`] and receives its raw callbacks
//! as [`BackendEvent`] values, one at a time.

mod simulated;

pub use simulated::{BackendCall, SimulatedBackend};

use crate::types::ElementHandle;
use crate::{Error, Result};
use serde::{Deserialize, Serialize};

/// Status code some device plugins return for a rejected call
pub const DEVICE_ERROR_CODE: i32 = -1;

/// Primitives a playback backend must provide
pub trait MediaBackend: Send {
    /// Start playing `source` from the beginning
    fn play(&mut self, source: &str) -> Result<()>;

    /// Start playing `source` from `seconds`
    fn resume_play(&mut self, source: &str, seconds: f64) -> Result<()>;

    fn pause(&mut self) -> Result<()>;

    fn resume(&mut self) -> Result<()>;

    fn stop(&mut self);

    /// Move the playhead by `offset_seconds` relative to its current position
    fn jump(&mut self, offset_seconds: f64) -> Result<()>;

    /// Element the backend renders into
    fn element(&self) -> ElementHandle;
}

impl<B: MediaBackend + ?Sized> MediaBackend for Box<B> {
    fn play(&mut self, source: &str) -> Result<()> {
        (**self).play(source)
    }

    fn resume_play(&mut self, source: &str, seconds: f64) -> Result<()> {
        (**self).resume_play(source, seconds)
    }

    fn pause(&mut self) -> Result<()> {
        (**self).pause()
    }

    fn resume(&mut self) -> Result<()> {
        (**self).resume()
    }

    fn stop(&mut self) {
        (**self).stop()
    }

    fn jump(&mut self, offset_seconds: f64) -> Result<()> {
        (**self).jump(offset_seconds)
    }

    fn element(&self) -> ElementHandle {
        (**self).element()
    }
}

/// Convert a device status code into a result. Zero and
/// [`DEVICE_ERROR_CODE`] are failures, anything else succeeded.
pub fn check_status(operation: &'static str, code: i32) -> Result<()> {
    if code != 0 && code != DEVICE_ERROR_CODE {
        Ok(())
    } else {
        Err(Error::BackendRejected { operation, code })
    }
}

/// Unrecoverable faults a device can report
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeviceFault {
    RenderError,
    ConnectionFailed,
    NetworkDisconnected,
    StreamNotFound,
    AuthenticationFailed,
    /// Any other fault, carrying the device's own message
    Other(String),
}

impl DeviceFault {
    /// Diagnostic message carried on the resulting `ERROR` event
    pub fn message(&self) -> String {
        match self {
            DeviceFault::RenderError => "Media element emitted OnRenderError".to_string(),
            DeviceFault::ConnectionFailed => "Media element emitted OnConnectionFailed".to_string(),
            DeviceFault::NetworkDisconnected => {
                "Media element emitted OnNetworkDisconnected".to_string()
            }
            DeviceFault::StreamNotFound => "Media element emitted OnStreamNotFound".to_string(),
            DeviceFault::AuthenticationFailed => {
                "Media element emitted OnAuthenticationFailed".to_string()
            }
            DeviceFault::Other(message) => message.clone(),
        }
    }
}

/// Raw notifications delivered by a backend
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum BackendEvent {
    /// Stream metadata is available
    StreamInfoReady { duration_ms: f64 },
    /// Periodic playhead sample
    CurrentPlayTime { millis: f64 },
    BufferingStart,
    BufferingComplete,
    /// End of media reached
    RenderingComplete,
    DeviceError { fault: DeviceFault },
}
