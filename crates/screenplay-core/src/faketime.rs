//! Simulated playhead clock for live backends that cannot report one

use crate::types::PlaybackState;
use tokio::time::Instant;

/// Locally advanced current time, driven by playback state updates.
///
/// While the last observed state was `PLAYING`, the stored time advances by
/// the wall-clock time elapsed between consecutive updates. Drift is bounded
/// by the interval at which the wrapped backend delivers its events.
#[derive(Debug, Clone, Default)]
pub struct FakeTime {
    current_time: Option<f64>,
    last_sample: Option<Instant>,
    was_playing: bool,
}

impl FakeTime {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current simulated time in seconds, `None` until first set
    pub fn current_time(&self) -> Option<f64> {
        self.current_time
    }

    /// Jump the clock to `seconds`. The next update does not extrapolate
    /// across the jump.
    pub fn set_current_time(&mut self, seconds: f64) {
        self.current_time = Some(seconds);
        self.was_playing = false;
    }

    /// Feed a playback state observed now
    pub fn update(&mut self, state: PlaybackState) {
        self.update_at(state, Instant::now());
    }

    /// Feed a playback state observed at `now`
    pub fn update_at(&mut self, state: PlaybackState, now: Instant) {
        if self.was_playing {
            if let (Some(current), Some(last)) = (self.current_time, self.last_sample) {
                let elapsed = now.saturating_duration_since(last);
                self.current_time = Some(current + elapsed.as_secs_f64());
            }
        }

        self.last_sample = Some(now);
        self.was_playing = state == PlaybackState::Playing;
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }
}
