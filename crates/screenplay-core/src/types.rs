//! Core types for Screenplay

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Unique identifier for a playback session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SessionId(pub Uuid);

impl SessionId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for SessionId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for SessionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Player state machine states
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PlaybackState {
    /// No media loaded
    Empty,
    /// Media loaded, playback not started
    Stopped,
    /// Waiting on the backend
    Buffering,
    Playing,
    Paused,
    /// Reached the end of the media
    Complete,
    /// Unrecoverable failure or protocol violation; leave with `reset`
    Error,
}

impl std::fmt::Display for PlaybackState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PlaybackState::Empty => write!(f, "EMPTY"),
            PlaybackState::Stopped => write!(f, "STOPPED"),
            PlaybackState::Buffering => write!(f, "BUFFERING"),
            PlaybackState::Playing => write!(f, "PLAYING"),
            PlaybackState::Paused => write!(f, "PAUSED"),
            PlaybackState::Complete => write!(f, "COMPLETE"),
            PlaybackState::Error => write!(f, "ERROR"),
        }
    }
}

/// Kind of media handed to `initialise_media`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MediaType {
    Audio,
    Video,
    LiveAudio,
    LiveVideo,
}

impl MediaType {
    pub fn is_live(&self) -> bool {
        matches!(self, MediaType::LiveAudio | MediaType::LiveVideo)
    }

    /// The live counterpart of this media type. Anything that is not audio
    /// is treated as video.
    pub fn to_live(self) -> MediaType {
        match self {
            MediaType::Audio | MediaType::LiveAudio => MediaType::LiveAudio,
            MediaType::Video | MediaType::LiveVideo => MediaType::LiveVideo,
        }
    }
}

impl std::fmt::Display for MediaType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MediaType::Audio => write!(f, "audio"),
            MediaType::Video => write!(f, "video"),
            MediaType::LiveAudio => write!(f, "live-audio"),
            MediaType::LiveVideo => write!(f, "live-video"),
        }
    }
}

/// Whether content is finite (static) or a live window
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WindowType {
    /// On-demand content
    Static,
    /// Live stream whose window start stays fixed while the end grows
    Growing,
    /// Live stream with a fixed-length window that moves forward
    Sliding,
}

impl WindowType {
    pub fn is_live(&self) -> bool {
        !matches!(self, WindowType::Static)
    }
}

impl std::fmt::Display for WindowType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            WindowType::Static => write!(f, "static"),
            WindowType::Growing => write!(f, "growing"),
            WindowType::Sliding => write!(f, "sliding"),
        }
    }
}

/// How much control a device offers over a live stream
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LiveSupport {
    /// Live playback unavailable
    None,
    /// Play and stop only; time is simulated locally
    Playable,
    /// Full seeking within the live window
    Seekable,
}

/// Seekable range reported by the backend, in seconds
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SeekableRange {
    pub start: f64,
    pub end: f64,
}

impl SeekableRange {
    pub fn new(start: f64, end: f64) -> Self {
        Self { start, end }
    }

    /// Duration of the media; the range always starts at zero for the
    /// backends this crate drives, so this is the range end
    pub fn duration(&self) -> f64 {
        self.end
    }
}

/// Media loaded for the current session
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MediaDescriptor {
    pub media_type: MediaType,
    pub source_url: String,
    pub mime_type: String,
}

impl MediaDescriptor {
    pub fn new(media_type: MediaType, source_url: impl Into<String>, mime_type: impl Into<String>) -> Self {
        Self {
            media_type,
            source_url: source_url.into(),
            mime_type: mime_type.into(),
        }
    }

    /// Whether the MIME type names an HLS playlist
    pub fn is_hls(&self) -> bool {
        let mime = self.mime_type.to_lowercase();
        mime == "application/vnd.apple.mpegurl" || mime == "application/x-mpegurl"
    }
}

/// Live window boundaries as reported by the stream, in milliseconds
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct TimeWindow {
    pub start_ms: f64,
    pub end_ms: f64,
}

impl TimeWindow {
    pub fn new(start_ms: f64, end_ms: f64) -> Self {
        Self { start_ms, end_ms }
    }

    pub fn start_seconds(&self) -> f64 {
        self.start_ms / 1000.0
    }
}

/// Opaque handle to the element a backend renders into
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ElementHandle(pub String);

impl ElementHandle {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }
}

impl std::fmt::Display for ElementHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Player configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlayerConfig {
    /// Margin kept from the end of the seekable range when clamping (seconds)
    pub clamp_offset_from_end: f64,
    /// Distance under which a seek is treated as a no-op (seconds)
    pub current_time_tolerance: f64,
    /// Lead added to the live window start when playable live playback begins (seconds)
    pub live_start_lead: f64,
    /// Control level offered by the device over live streams
    pub live_support: LiveSupport,
    /// Maximum number of time samples on which a rejected pause is retried
    /// (`None` retries until the backend accepts or the intent is superseded)
    pub pause_retry_limit: Option<u32>,
}

impl Default for PlayerConfig {
    fn default() -> Self {
        Self {
            clamp_offset_from_end: 1.1,
            current_time_tolerance: 2.5,
            live_start_lead: 100.0,
            live_support: LiveSupport::Playable,
            pause_retry_limit: None,
        }
    }
}

impl PlayerConfig {
    /// Parse a configuration from JSON; missing fields take their defaults
    pub fn from_json(json: &str) -> Result<Self> {
        let config: PlayerConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        let fields = [
            ("clamp_offset_from_end", self.clamp_offset_from_end),
            ("current_time_tolerance", self.current_time_tolerance),
            ("live_start_lead", self.live_start_lead),
        ];
        for (name, value) in fields {
            if !value.is_finite() || value < 0.0 {
                return Err(Error::InvalidConfig(format!(
                    "{} must be a non-negative number, got {}",
                    name, value
                )));
            }
        }
        Ok(())
    }
}
