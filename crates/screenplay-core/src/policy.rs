//! Seek clamping and near-time tolerance
//!
//! Many devices cannot seek to the very end of a range, so targets are kept a
//! small margin short of it. Targets within the tolerance of the current
//! playhead are treated as no-ops.

use crate::types::{PlayerConfig, SeekableRange};

/// Stateless seek decisions parameterised by the player configuration
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SeekPolicy {
    /// Margin kept from the end of the range (seconds)
    pub clamp_offset_from_end: f64,
    /// Maximum distance for a target to count as near (seconds, inclusive)
    pub tolerance: f64,
}

impl Default for SeekPolicy {
    fn default() -> Self {
        Self::from_config(&PlayerConfig::default())
    }
}

impl SeekPolicy {
    pub fn new(clamp_offset_from_end: f64, tolerance: f64) -> Self {
        Self {
            clamp_offset_from_end,
            tolerance,
        }
    }

    pub fn from_config(config: &PlayerConfig) -> Self {
        Self::new(config.clamp_offset_from_end, config.current_time_tolerance)
    }

    /// Clamp a target into the seekable range, stopping short of the end.
    ///
    /// Without a range the target is returned unchanged.
    pub fn clamp(&self, seconds: f64, range: Option<&SeekableRange>) -> f64 {
        let Some(range) = range else {
            return seconds;
        };
        let near_to_end = (range.end - self.clamp_offset_from_end).max(range.start);
        if seconds < range.start {
            range.start
        } else if seconds > near_to_end {
            near_to_end
        } else {
            seconds
        }
    }

    /// Whether the clamped target is within tolerance of the current time.
    ///
    /// An unknown current time is never near anything.
    pub fn is_near(&self, current_time: Option<f64>, seconds: f64, range: Option<&SeekableRange>) -> bool {
        match current_time {
            Some(current) => (current - self.clamp(seconds, range)).abs() <= self.tolerance,
            None => false,
        }
    }
}
