//! Player contracts and their implementations
//!
//! [`MediaPlayer`] is the operation set every tier supports, including
//! devices that can only start and stop a live stream. [`SeekablePlayer`]
//! adds seeking, pausing and range reporting. A wrapper that cannot seek
//! simply does not implement it, so calling those operations on it is a
//! compile-time error rather than a runtime failure.

mod native;
mod playable;

pub use native::NativePlayer;
pub use playable::PlayableLivePlayer;

use crate::backend::BackendEvent;
use crate::events::{EventCallback, ListenerId};
use crate::types::{ElementHandle, MediaType, PlaybackState, SeekableRange};

/// Operations available on every player tier
pub trait MediaPlayer: Send {
    /// Load media. Legal only from `EMPTY`.
    fn initialise_media(&mut self, media_type: MediaType, url: &str, mime_type: &str);

    /// Start playback from the beginning. Legal only from `STOPPED`.
    fn begin_playback(&mut self);

    fn stop(&mut self);

    /// Discard the loaded media and return to `EMPTY`
    fn reset(&mut self);

    fn state(&self) -> PlaybackState;

    /// Current playhead in seconds; `None` while `STOPPED` or before the
    /// backend has reported a time
    fn current_time(&self) -> Option<f64>;

    fn source(&self) -> Option<&str>;

    fn mime_type(&self) -> Option<&str>;

    fn player_element(&self) -> ElementHandle;

    /// Register `callback` for every emission on behalf of `owner`
    fn add_event_callback(&mut self, owner: &str, callback: EventCallback) -> ListenerId;

    /// Remove a registration made by `owner`. Returns whether one was removed.
    fn remove_event_callback(&mut self, owner: &str, id: ListenerId) -> bool;

    fn remove_all_event_callbacks(&mut self);

    /// Entry point for raw backend notifications
    fn handle_backend_event(&mut self, event: BackendEvent);
}

/// Full contract for players that can seek within their media
pub trait SeekablePlayer: MediaPlayer {
    /// Start playback at `seconds`. Legal only from `STOPPED`.
    fn begin_playback_from(&mut self, seconds: f64);

    /// Seek to `seconds` and continue playing
    fn play_from(&mut self, seconds: f64);

    fn pause(&mut self);

    fn resume(&mut self);

    fn seekable_range(&self) -> Option<SeekableRange>;

    fn duration(&self) -> Option<f64>;
}
