//! In-memory backend that records every call
//!
//! Clones share state, so a test or the CLI can keep one clone to inspect
//! calls and inject failures while the player owns the other.

use super::{check_status, MediaBackend, DEVICE_ERROR_CODE};
use crate::types::ElementHandle;
use crate::{Error, Result};
use parking_lot::Mutex;
use serde::Serialize;
use std::sync::Arc;

/// A primitive invoked on the backend
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "call", rename_all = "snake_case")]
pub enum BackendCall {
    Play { source: String },
    ResumePlay { source: String, seconds: f64 },
    Pause,
    Resume,
    Stop,
    Jump { offset_seconds: f64 },
}

#[derive(Debug, Default)]
struct SimulatedState {
    calls: Vec<BackendCall>,
    reject_pause: bool,
    reject_jump: bool,
    reject_play: bool,
    fail_pause: Option<String>,
}

#[derive(Debug, Clone)]
pub struct SimulatedBackend {
    element: ElementHandle,
    state: Arc<Mutex<SimulatedState>>,
}

impl Default for SimulatedBackend {
    fn default() -> Self {
        Self::new("simulated-player")
    }
}

impl SimulatedBackend {
    pub fn new(element_id: impl Into<String>) -> Self {
        Self {
            element: ElementHandle::new(element_id),
            state: Arc::new(Mutex::new(SimulatedState::default())),
        }
    }

    /// Every call made so far, oldest first
    pub fn calls(&self) -> Vec<BackendCall> {
        self.state.lock().calls.clone()
    }

    pub fn clear_calls(&self) {
        self.state.lock().calls.clear();
    }

    /// Number of relative seeks issued
    pub fn jump_count(&self) -> usize {
        self.state
            .lock()
            .calls
            .iter()
            .filter(|call| matches!(call, BackendCall::Jump { .. }))
            .count()
    }

    pub fn set_reject_pause(&self, reject: bool) {
        self.state.lock().reject_pause = reject;
    }

    pub fn set_reject_jump(&self, reject: bool) {
        self.state.lock().reject_jump = reject;
    }

    pub fn set_reject_play(&self, reject: bool) {
        self.state.lock().reject_play = reject;
    }

    /// Make pause fail with a device fault instead of a status code
    pub fn set_fail_pause(&self, message: Option<&str>) {
        self.state.lock().fail_pause = message.map(str::to_string);
    }

    fn record(&self, call: BackendCall) {
        self.state.lock().calls.push(call);
    }

    fn status(reject: bool) -> i32 {
        if reject {
            DEVICE_ERROR_CODE
        } else {
            1
        }
    }
}

impl MediaBackend for SimulatedBackend {
    fn play(&mut self, source: &str) -> Result<()> {
        self.record(BackendCall::Play { source: source.to_string() });
        let reject = self.state.lock().reject_play;
        check_status("play", Self::status(reject))
    }

    fn resume_play(&mut self, source: &str, seconds: f64) -> Result<()> {
        self.record(BackendCall::ResumePlay {
            source: source.to_string(),
            seconds,
        });
        let reject = self.state.lock().reject_play;
        check_status("resume_play", Self::status(reject))
    }

    fn pause(&mut self) -> Result<()> {
        self.record(BackendCall::Pause);
        let state = self.state.lock();
        if let Some(message) = &state.fail_pause {
            return Err(Error::device(message.clone()));
        }
        check_status("pause", Self::status(state.reject_pause))
    }

    fn resume(&mut self) -> Result<()> {
        self.record(BackendCall::Resume);
        Ok(())
    }

    fn stop(&mut self) {
        self.record(BackendCall::Stop);
    }

    fn jump(&mut self, offset_seconds: f64) -> Result<()> {
        self.record(BackendCall::Jump { offset_seconds });
        let reject = self.state.lock().reject_jump;
        check_status("jump", Self::status(reject))
    }

    fn element(&self) -> ElementHandle {
        self.element.clone()
    }
}
