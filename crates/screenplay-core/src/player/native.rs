//! Playback state machine over a native backend
//!
//! Holds the authoritative [`PlaybackState`], guards every operation against
//! the states it is legal from, reconciles seeks with an asynchronously
//! reported playhead and turns raw backend notifications into events.
//!
//! An operation invoked from an illegal state never returns an error to the
//! caller: the session is wiped, the player moves to `ERROR` and an `ERROR`
//! event names the operation and the offending state.

use super::{MediaPlayer, SeekablePlayer};
use crate::backend::{BackendEvent, MediaBackend};
use crate::events::{EventCallback, EventType, ListenerId, ListenerRegistry, MediaEvent};
use crate::policy::SeekPolicy;
use crate::types::{
    ElementHandle, MediaDescriptor, MediaType, PlaybackState, PlayerConfig, SeekableRange,
};
use crate::Error;
use tracing::{debug, info, instrument, trace, warn};

/// Suffix the device plugin needs on HLS sources
const HLS_COMPONENT_SUFFIX: &str = "|COMPONENT=HLS";

/// State machine driving one backend
pub struct NativePlayer<B: MediaBackend> {
    backend: B,
    policy: SeekPolicy,
    pause_retry_limit: Option<u32>,
    state: PlaybackState,
    /// Media of the current session
    media: Option<MediaDescriptor>,
    /// Last playhead in seconds
    current_time: Option<f64>,
    range: Option<SeekableRange>,
    /// Seek waiting for the next time sample
    defer_seeking_to: Option<f64>,
    /// State to settle in once the backend finishes buffering
    post_buffering_state: PlaybackState,
    /// A pause the backend rejected, retried on each time sample
    trying_to_pause: bool,
    pause_retries: u32,
    /// Whether a time sample arrived since the backend was last stopped
    current_time_known: bool,
    /// Backend notifications are only honoured between load and wipe
    handlers_registered: bool,
    listeners: ListenerRegistry,
}

impl<B: MediaBackend> NativePlayer<B> {
    pub fn new(backend: B, config: &PlayerConfig) -> Self {
        Self {
            backend,
            policy: SeekPolicy::from_config(config),
            pause_retry_limit: config.pause_retry_limit,
            state: PlaybackState::Empty,
            media: None,
            current_time: None,
            range: None,
            defer_seeking_to: None,
            post_buffering_state: PlaybackState::Playing,
            trying_to_pause: false,
            pause_retries: 0,
            current_time_known: false,
            handlers_registered: false,
            listeners: ListenerRegistry::new(),
        }
    }

    /// Seek target pending the next time sample, if any
    pub fn deferred_seek(&self) -> Option<f64> {
        self.defer_seeking_to
    }

    /// Whether a rejected pause is waiting to be retried
    pub fn is_trying_to_pause(&self) -> bool {
        self.trying_to_pause
    }

    // ------------------------------------------------------------------
    // Backend notifications
    // ------------------------------------------------------------------

    fn on_metadata(&mut self, duration_ms: f64) {
        let range = SeekableRange::new(0.0, duration_ms / 1000.0);
        debug!(start = range.start, end = range.end, "Seekable range reported");
        self.range = Some(range);
    }

    fn on_current_time(&mut self, millis: f64) {
        self.current_time = Some(millis / 1000.0);
        if self.state == PlaybackState::Playing {
            self.emit(EventType::Status, None);
        }
        self.current_time_known = true;

        if self.defer_seeking_to.is_some() {
            self.apply_deferred_seek();
        }

        if self.trying_to_pause {
            self.retry_pause();
        }
    }

    fn on_device_buffering(&mut self) {
        if self.state == PlaybackState::Playing {
            self.to_buffering();
        }
    }

    fn on_finished_buffering(&mut self) {
        if self.state != PlaybackState::Buffering || self.defer_seeking_to.is_some() {
            return;
        }

        if self.post_buffering_state == PlaybackState::Paused {
            self.try_pause_with_state_transition();
        } else {
            self.to_playing();
        }
    }

    fn on_end_of_media(&mut self) {
        match self.state {
            PlaybackState::Buffering | PlaybackState::Playing | PlaybackState::Paused => {
                self.to_complete()
            }
            state => trace!(%state, "Ignoring end of media"),
        }
    }

    fn on_device_error(&mut self, message: String) {
        let err = Error::device(message);
        warn!(error = %err, code = err.error_code(), "Device reported a fault");
        self.to_error(err.to_string());
    }

    // ------------------------------------------------------------------
    // Seeking and pausing
    // ------------------------------------------------------------------

    fn clamped_time(&self, seconds: f64) -> f64 {
        let clamped = self.policy.clamp(seconds, self.range.as_ref());
        if clamped != seconds {
            if let Some(range) = &self.range {
                debug!(
                    target_time = seconds,
                    clamped,
                    start = range.start,
                    end = range.end,
                    "Seek target clamped to seekable range"
                );
            }
        }
        clamped
    }

    fn is_near_to_current_time(&self, seconds: f64) -> bool {
        self.policy
            .is_near(self.current_time, seconds, self.range.as_ref())
    }

    fn apply_deferred_seek(&mut self) {
        let Some(target) = self.defer_seeking_to.take() else {
            return;
        };
        let clamped = self.clamped_time(target);

        if self.is_near_to_current_time(clamped) {
            debug!(target_time = clamped, "Deferred seek is near the playhead, skipping");
            self.to_playing();
        } else if !self.seek_to(clamped) {
            self.to_playing();
        }
    }

    /// Relative seek to `seconds`; returns whether the backend accepted it
    fn seek_to(&mut self, seconds: f64) -> bool {
        let offset = seconds - self.current_time.unwrap_or_default();
        match self.backend.jump(offset) {
            Ok(()) => {
                debug!(target_time = seconds, offset, "Seek issued");
                self.current_time = Some(seconds);
                true
            }
            Err(e) if e.is_recoverable() => {
                debug!(target_time = seconds, error = %e, "Seek rejected by backend");
                false
            }
            Err(e) => {
                warn!(target_time = seconds, error = %e, "Seek failed");
                false
            }
        }
    }

    fn seek_to_with_failure_state_transition(&mut self, seconds: f64) {
        if !self.seek_to(seconds) {
            self.to_playing();
        }
    }

    fn try_pause_with_state_transition(&mut self) {
        match self.backend.pause() {
            Ok(()) => {
                self.trying_to_pause = false;
                self.pause_retries = 0;
                self.to_paused();
            }
            Err(e) if e.is_recoverable() => {
                debug!(error = %e, "Pause rejected by backend, retrying on next time update");
                self.trying_to_pause = true;
            }
            Err(e) => {
                warn!(error = %e, "Pause failed");
                self.trying_to_pause = false;
                self.to_error(e.to_string());
            }
        }
    }

    fn retry_pause(&mut self) {
        if let Some(limit) = self.pause_retry_limit {
            if self.pause_retries >= limit {
                warn!(retries = self.pause_retries, "Giving up on rejected pause");
                self.trying_to_pause = false;
                self.pause_retries = 0;
                return;
            }
        }
        self.pause_retries += 1;
        self.try_pause_with_state_transition();
    }

    fn resume_backend(&mut self) {
        if let Err(e) = self.backend.resume() {
            warn!(error = %e, "Backend rejected resume");
        }
    }

    /// Source handed to the backend, decorated for HLS
    fn wrapped_source(&self) -> String {
        match &self.media {
            Some(media) if media.is_hls() => format!("{}{}", media.source_url, HLS_COMPONENT_SUFFIX),
            Some(media) => media.source_url.clone(),
            None => String::new(),
        }
    }

    fn stop_player(&mut self) {
        self.backend.stop();
        self.current_time_known = false;
        self.defer_seeking_to = None;
        self.trying_to_pause = false;
        self.pause_retries = 0;
    }

    fn wipe(&mut self) {
        self.stop_player();
        self.media = None;
        self.current_time = None;
        self.range = None;
        self.handlers_registered = false;
    }

    // ------------------------------------------------------------------
    // Transitions
    // ------------------------------------------------------------------

    fn set_state(&mut self, new_state: PlaybackState) {
        let previous = self.state;
        self.state = new_state;
        info!(from = %previous, to = %new_state, "State transition");
    }

    fn to_stopped(&mut self) {
        self.current_time = None;
        self.range = None;
        self.set_state(PlaybackState::Stopped);
        self.emit(EventType::Stopped, None);
    }

    fn to_buffering(&mut self) {
        self.set_state(PlaybackState::Buffering);
        self.emit(EventType::Buffering, None);
    }

    fn to_playing(&mut self) {
        self.set_state(PlaybackState::Playing);
        self.emit(EventType::Playing, None);
    }

    fn to_paused(&mut self) {
        self.set_state(PlaybackState::Paused);
        self.emit(EventType::Paused, None);
    }

    fn to_complete(&mut self) {
        self.set_state(PlaybackState::Complete);
        self.emit(EventType::Complete, None);
    }

    fn to_empty(&mut self) {
        self.wipe();
        self.set_state(PlaybackState::Empty);
    }

    fn to_error(&mut self, message: String) {
        self.wipe();
        self.set_state(PlaybackState::Error);
        self.emit(EventType::Error, Some(message));
    }

    /// Protocol violation: `operation` is not legal in the current state
    fn illegal(&mut self, operation: &'static str) {
        let err = Error::IllegalState {
            operation,
            state: self.state,
        };
        warn!(operation, state = %self.state, "Illegal operation");
        self.to_error(err.to_string());
    }

    /// Start the backend; a refusal to play is unrecoverable
    fn start_backend(&mut self, from: Option<f64>) -> bool {
        let source = self.wrapped_source();
        let result = match from {
            Some(seconds) => self.backend.resume_play(&source, seconds),
            None => self.backend.play(&source),
        };
        match result {
            Ok(()) => true,
            Err(e) => {
                self.to_error(e.to_string());
                false
            }
        }
    }

    fn emit(&self, event_type: EventType, error_message: Option<String>) {
        let event = MediaEvent {
            event_type,
            current_time: self.current_time(),
            seekable_range: self.range,
            duration: SeekablePlayer::duration(self),
            url: self.media.as_ref().map(|m| m.source_url.clone()),
            mime_type: self.media.as_ref().map(|m| m.mime_type.clone()),
            state: self.state,
            error_message,
        };
        self.listeners.emit(&event);
    }
}

impl<B: MediaBackend> MediaPlayer for NativePlayer<B> {
    fn initialise_media(&mut self, media_type: MediaType, url: &str, mime_type: &str) {
        if self.state != PlaybackState::Empty {
            return self.illegal("initialise_media");
        }
        info!(%media_type, live = media_type.is_live(), url, mime_type, "Initialising media");
        self.media = Some(MediaDescriptor::new(media_type, url, mime_type));
        self.handlers_registered = true;
        self.to_stopped();
    }

    fn begin_playback(&mut self) {
        self.post_buffering_state = PlaybackState::Playing;
        match self.state {
            PlaybackState::Stopped => {
                self.to_buffering();
                self.start_backend(None);
            }
            _ => self.illegal("begin_playback"),
        }
    }

    fn stop(&mut self) {
        match self.state {
            PlaybackState::Stopped => {}
            PlaybackState::Buffering
            | PlaybackState::Playing
            | PlaybackState::Paused
            | PlaybackState::Complete => {
                self.stop_player();
                self.to_stopped();
            }
            _ => self.illegal("stop"),
        }
    }

    fn reset(&mut self) {
        match self.state {
            PlaybackState::Empty => {}
            PlaybackState::Stopped | PlaybackState::Error => self.to_empty(),
            _ => self.illegal("reset"),
        }
    }

    fn state(&self) -> PlaybackState {
        self.state
    }

    fn current_time(&self) -> Option<f64> {
        if self.state == PlaybackState::Stopped {
            None
        } else {
            self.current_time
        }
    }

    fn source(&self) -> Option<&str> {
        self.media.as_ref().map(|m| m.source_url.as_str())
    }

    fn mime_type(&self) -> Option<&str> {
        self.media.as_ref().map(|m| m.mime_type.as_str())
    }

    fn player_element(&self) -> ElementHandle {
        self.backend.element()
    }

    fn add_event_callback(&mut self, owner: &str, callback: EventCallback) -> ListenerId {
        self.listeners.add(owner, callback)
    }

    fn remove_event_callback(&mut self, owner: &str, id: ListenerId) -> bool {
        self.listeners.remove(owner, id)
    }

    fn remove_all_event_callbacks(&mut self) {
        self.listeners.clear();
    }

    fn handle_backend_event(&mut self, event: BackendEvent) {
        if !self.handlers_registered {
            trace!(?event, "Ignoring backend event with no media loaded");
            return;
        }

        match event {
            BackendEvent::StreamInfoReady { duration_ms } => self.on_metadata(duration_ms),
            BackendEvent::CurrentPlayTime { millis } => self.on_current_time(millis),
            BackendEvent::BufferingStart => self.on_device_buffering(),
            BackendEvent::BufferingComplete => self.on_finished_buffering(),
            BackendEvent::RenderingComplete => self.on_end_of_media(),
            BackendEvent::DeviceError { fault } => self.on_device_error(fault.message()),
        }
    }
}

impl<B: MediaBackend> SeekablePlayer for NativePlayer<B> {
    #[instrument(level = "debug", skip(self), fields(state = %self.state))]
    fn begin_playback_from(&mut self, seconds: f64) {
        self.post_buffering_state = PlaybackState::Playing;
        let seeking_to = self.clamped_time(seconds);

        match self.state {
            PlaybackState::Stopped => {
                if self.start_backend(Some(seeking_to)) {
                    self.to_buffering();
                }
            }
            _ => self.illegal("begin_playback_from"),
        }
    }

    #[instrument(level = "debug", skip(self), fields(state = %self.state))]
    fn play_from(&mut self, seconds: f64) {
        self.post_buffering_state = PlaybackState::Playing;
        self.trying_to_pause = false;
        let seeking_to = self.clamped_time(seconds);

        match self.state {
            PlaybackState::Buffering => {
                self.defer_seeking_to = Some(seeking_to);
            }
            PlaybackState::Playing => {
                self.defer_seeking_to = None;
                self.to_buffering();
                if !self.current_time_known {
                    self.defer_seeking_to = Some(seeking_to);
                } else if self.is_near_to_current_time(seeking_to) {
                    debug!(target_time = seeking_to, "Seek target is near the playhead, skipping");
                    self.to_playing();
                } else {
                    self.seek_to_with_failure_state_transition(seeking_to);
                }
            }
            PlaybackState::Paused => {
                self.defer_seeking_to = None;
                self.to_buffering();
                if !self.current_time_known {
                    self.defer_seeking_to = Some(seeking_to);
                    self.resume_backend();
                } else if self.is_near_to_current_time(seeking_to) {
                    debug!(target_time = seeking_to, "Seek target is near the playhead, skipping");
                    self.resume_backend();
                    self.to_playing();
                } else {
                    self.seek_to_with_failure_state_transition(seeking_to);
                    self.resume_backend();
                }
            }
            PlaybackState::Complete => {
                self.defer_seeking_to = None;
                self.backend.stop();
                if self.start_backend(Some(seeking_to)) {
                    self.to_buffering();
                }
            }
            _ => self.illegal("play_from"),
        }
    }

    fn pause(&mut self) {
        self.post_buffering_state = PlaybackState::Paused;
        match self.state {
            PlaybackState::Buffering | PlaybackState::Paused => {}
            PlaybackState::Playing => {
                self.pause_retries = 0;
                self.try_pause_with_state_transition();
            }
            _ => self.illegal("pause"),
        }
    }

    fn resume(&mut self) {
        self.post_buffering_state = PlaybackState::Playing;
        match self.state {
            PlaybackState::Playing => {
                self.trying_to_pause = false;
            }
            PlaybackState::Buffering => {
                if self.trying_to_pause {
                    self.trying_to_pause = false;
                    self.to_playing();
                }
            }
            PlaybackState::Paused => {
                self.resume_backend();
                self.to_playing();
            }
            _ => self.illegal("resume"),
        }
    }

    fn seekable_range(&self) -> Option<SeekableRange> {
        self.range
    }

    fn duration(&self) -> Option<f64> {
        self.range.map(|r| r.duration())
    }
}
