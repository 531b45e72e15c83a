//! Event contract shared by every player tier
//!
//! Every emission carries a full snapshot of the player: current time,
//! seekable range, duration, source, MIME type and state. Listeners are kept
//! in an ordered registry keyed by the handle returned at registration, so a
//! wrapping layer can remove exactly the listener it installed.

use crate::types::{PlaybackState, SeekableRange};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::trace;

/// Event types, mirroring the state machine transitions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EventType {
    Stopped,
    Buffering,
    Playing,
    Paused,
    Complete,
    Error,
    /// Heartbeat emitted on each time sample while playing
    Status,
}

impl std::fmt::Display for EventType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EventType::Stopped => write!(f, "STOPPED"),
            EventType::Buffering => write!(f, "BUFFERING"),
            EventType::Playing => write!(f, "PLAYING"),
            EventType::Paused => write!(f, "PAUSED"),
            EventType::Complete => write!(f, "COMPLETE"),
            EventType::Error => write!(f, "ERROR"),
            EventType::Status => write!(f, "STATUS"),
        }
    }
}

/// A single player emission
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MediaEvent {
    #[serde(rename = "type")]
    pub event_type: EventType,
    pub current_time: Option<f64>,
    pub seekable_range: Option<SeekableRange>,
    pub duration: Option<f64>,
    pub url: Option<String>,
    pub mime_type: Option<String>,
    pub state: PlaybackState,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
}

impl MediaEvent {
    pub fn to_json(&self) -> crate::Result<String> {
        Ok(serde_json::to_string(self)?)
    }
}

/// Listener invoked for every emission
pub type EventCallback = Arc<dyn Fn(&MediaEvent) + Send + Sync>;

/// Handle identifying one registration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ListenerId(pub u64);

impl std::fmt::Display for ListenerId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "listener-{}", self.0)
    }
}

struct Registration {
    owner: String,
    callback: EventCallback,
}

/// Ordered listener registry
///
/// Handles are allocated monotonically, so iterating the map visits
/// listeners in registration order.
#[derive(Default)]
pub struct ListenerRegistry {
    next_id: u64,
    listeners: BTreeMap<ListenerId, Registration>,
}

impl ListenerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `callback` on behalf of `owner`
    pub fn add(&mut self, owner: impl Into<String>, callback: EventCallback) -> ListenerId {
        let id = ListenerId(self.next_id);
        self.next_id += 1;
        let owner = owner.into();
        trace!(%id, owner = %owner, "Listener registered");
        self.listeners.insert(id, Registration { owner, callback });
        id
    }

    /// Remove the registration `id`, only if it belongs to `owner`
    pub fn remove(&mut self, owner: &str, id: ListenerId) -> bool {
        match self.listeners.get(&id) {
            Some(registration) if registration.owner == owner => {
                self.listeners.remove(&id);
                trace!(%id, owner, "Listener removed");
                true
            }
            _ => false,
        }
    }

    pub fn clear(&mut self) {
        self.listeners.clear();
    }

    pub fn len(&self) -> usize {
        self.listeners.len()
    }

    pub fn is_empty(&self) -> bool {
        self.listeners.is_empty()
    }

    /// Deliver `event` to every listener in registration order
    pub fn emit(&self, event: &MediaEvent) {
        for registration in self.listeners.values() {
            (registration.callback)(event);
        }
    }
}

impl std::fmt::Debug for ListenerRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ListenerRegistry")
            .field("listeners", &self.listeners.len())
            .finish()
    }
}
