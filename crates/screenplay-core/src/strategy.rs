//! Playback strategy selection
//!
//! Picks the player tier for a window type and the device's declared live
//! support. Static content and seekable live streams get the bare native
//! state machine; play-only live streams get it wrapped in
//! [`PlayableLivePlayer`].

use crate::backend::MediaBackend;
use crate::player::{MediaPlayer, NativePlayer, PlayableLivePlayer, SeekablePlayer};
use crate::types::{LiveSupport, PlayerConfig, TimeWindow, WindowType};
use crate::{Error, Result};
use tracing::info;

/// Native player over a type-erased backend
pub type DynNativePlayer = NativePlayer<Box<dyn MediaBackend>>;

/// The player tier in use for a session
pub enum PlaybackStrategy {
    /// Full contract, seeking included
    Seekable(DynNativePlayer),
    /// Play and stop only, with locally simulated live time
    Playable(PlayableLivePlayer<DynNativePlayer>),
}

impl PlaybackStrategy {
    pub fn new(
        window_type: WindowType,
        config: &PlayerConfig,
        window: TimeWindow,
        backend: Box<dyn MediaBackend>,
    ) -> Result<Self> {
        config.validate()?;
        let native = NativePlayer::new(backend, config);

        let strategy = match (window_type.is_live(), config.live_support) {
            (false, _) | (_, LiveSupport::Seekable) => PlaybackStrategy::Seekable(native),
            (_, LiveSupport::Playable) => {
                PlaybackStrategy::Playable(PlayableLivePlayer::new(native, config, window))
            }
            (_, LiveSupport::None) => {
                return Err(Error::UnsupportedLiveSupport {
                    window: window_type.to_string(),
                });
            }
        };

        info!(
            window = %window_type,
            live_support = ?config.live_support,
            tier = strategy.name(),
            "Playback strategy selected"
        );
        Ok(strategy)
    }

    pub fn name(&self) -> &'static str {
        match self {
            PlaybackStrategy::Seekable(_) => "seekable",
            PlaybackStrategy::Playable(_) => "playable",
        }
    }

    pub fn player(&self) -> &dyn MediaPlayer {
        match self {
            PlaybackStrategy::Seekable(player) => player,
            PlaybackStrategy::Playable(player) => player,
        }
    }

    pub fn player_mut(&mut self) -> &mut dyn MediaPlayer {
        match self {
            PlaybackStrategy::Seekable(player) => player,
            PlaybackStrategy::Playable(player) => player,
        }
    }

    /// The full contract, when this tier supports it
    pub fn seekable(&self) -> Option<&dyn SeekablePlayer> {
        match self {
            PlaybackStrategy::Seekable(player) => Some(player),
            PlaybackStrategy::Playable(_) => None,
        }
    }

    pub fn seekable_mut(&mut self) -> Option<&mut dyn SeekablePlayer> {
        match self {
            PlaybackStrategy::Seekable(player) => Some(player),
            PlaybackStrategy::Playable(_) => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::SimulatedBackend;
    use crate::types::{MediaType, PlaybackState};

    fn select(window_type: WindowType, live_support: LiveSupport) -> Result<PlaybackStrategy> {
        let config = PlayerConfig {
            live_support,
            ..PlayerConfig::default()
        };
        PlaybackStrategy::new(
            window_type,
            &config,
            TimeWindow::new(0.0, 7_200_000.0),
            Box::new(SimulatedBackend::default()),
        )
    }

    #[test]
    fn test_static_is_always_seekable() {
        for support in [LiveSupport::None, LiveSupport::Playable, LiveSupport::Seekable] {
            let strategy = select(WindowType::Static, support).unwrap();
            assert_eq!(strategy.name(), "seekable");
        }
    }

    #[test]
    fn test_live_tiers() {
        assert_eq!(select(WindowType::Sliding, LiveSupport::Playable).unwrap().name(), "playable");
        assert_eq!(select(WindowType::Growing, LiveSupport::Seekable).unwrap().name(), "seekable");
    }

    #[test]
    fn test_live_without_support_fails() {
        let err = select(WindowType::Sliding, LiveSupport::None).err().unwrap();
        assert_eq!(err.error_code(), "LIVE_UNSUPPORTED");
    }

    #[test]
    fn test_playable_tier_has_no_seeking() {
        let mut strategy = select(WindowType::Sliding, LiveSupport::Playable).unwrap();
        assert!(strategy.seekable_mut().is_none());

        let player = strategy.player_mut();
        player.initialise_media(MediaType::Video, "http://example.com/live.m3u8", "application/x-mpegurl");
        player.begin_playback();
        assert_eq!(player.state(), PlaybackState::Buffering);
        assert_eq!(player.current_time(), Some(100.0));
    }
}
