//! Simulation scripts
//!
//! A script names the window being played and lists steps to run in order.
//! Each step is either a caller operation, a raw backend notification, a
//! pause in wall-clock time, or a toggle of an injected backend failure:
//!
//! ```json
//! {
//!   "window": "static",
//!   "steps": [
//!     { "op": "initialise_media", "media_type": "VIDEO", "url": "http://example.com/a.mp4", "mime_type": "video/mp4" },
//!     { "op": "begin_playback" },
//!     { "event": "buffering_complete" },
//!     { "wait_ms": 500 },
//!     { "reject": "pause", "enabled": true }
//!   ]
//! }
//! ```

use anyhow::Context;
use screenplay_core::{BackendEvent, Operation, SimulatedBackend, TimeWindow, WindowType};
use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Script {
    #[serde(default = "default_window")]
    pub window: WindowType,
    #[serde(default)]
    pub time_window: TimeWindow,
    pub steps: Vec<Step>,
}

fn default_window() -> WindowType {
    WindowType::Static
}

/// Backend primitive a script can make fail
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RejectTarget {
    Play,
    Pause,
    Jump,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Step {
    Operation(Operation),
    Backend(BackendEvent),
    Wait { wait_ms: u64 },
    Reject { reject: RejectTarget, enabled: bool },
}

impl Step {
    /// Short description for reports
    pub fn describe(&self) -> String {
        match self {
            Step::Operation(Operation::InitialiseMedia { media_type, url, .. }) => {
                format!("initialise_media {} {}", media_type, url)
            }
            Step::Operation(Operation::BeginPlaybackFrom { seconds }) => {
                format!("begin_playback_from {}", seconds)
            }
            Step::Operation(Operation::PlayFrom { seconds }) => format!("play_from {}", seconds),
            Step::Operation(op) => op.name().to_string(),
            Step::Backend(event) => format!("backend {:?}", event),
            Step::Wait { wait_ms } => format!("wait {}ms", wait_ms),
            Step::Reject { reject, enabled } => format!("reject {:?} = {}", reject, enabled),
        }
    }
}

impl RejectTarget {
    pub fn apply(self, backend: &SimulatedBackend, enabled: bool) {
        match self {
            RejectTarget::Play => backend.set_reject_play(enabled),
            RejectTarget::Pause => backend.set_reject_pause(enabled),
            RejectTarget::Jump => backend.set_reject_jump(enabled),
        }
    }
}

impl Script {
    pub fn from_json(json: &str) -> anyhow::Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let json = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read script {}", path.display()))?;
        Self::from_json(&json).with_context(|| format!("Invalid script {}", path.display()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use screenplay_core::MediaType;

    #[test]
    fn test_parse_steps() {
        let script = Script::from_json(
            r#"{
                "steps": [
                    { "op": "initialise_media", "media_type": "VIDEO", "url": "u", "mime_type": "video/mp4" },
                    { "op": "play_from", "seconds": 12.5 },
                    { "event": "current_play_time", "millis": 1000 },
                    { "wait_ms": 250 },
                    { "reject": "jump", "enabled": true }
                ]
            }"#,
        )
        .unwrap();

        assert_eq!(script.window, WindowType::Static);
        assert!(matches!(
            &script.steps[0],
            Step::Operation(Operation::InitialiseMedia { media_type: MediaType::Video, .. })
        ));
        assert!(matches!(script.steps[1], Step::Operation(Operation::PlayFrom { seconds }) if seconds == 12.5));
        assert!(matches!(script.steps[2], Step::Backend(BackendEvent::CurrentPlayTime { .. })));
        assert!(matches!(script.steps[3], Step::Wait { wait_ms: 250 }));
        assert!(matches!(
            script.steps[4],
            Step::Reject { reject: RejectTarget::Jump, enabled: true }
        ));
    }

    #[test]
    fn test_demo_scripts_parse() {
        let seek = Script::from_json(include_str!("../../../demos/static_seek.json")).unwrap();
        assert_eq!(seek.window, WindowType::Static);

        let live = Script::from_json(include_str!("../../../demos/live_playable.json")).unwrap();
        assert_eq!(live.window, WindowType::Sliding);
    }

    #[test]
    fn test_unknown_step_is_rejected() {
        assert!(Script::from_json(r#"{ "steps": [ { "op": "rewind" } ] }"#).is_err());
    }
}
