//! Screenplay Core - Playback Abstraction Library
//!
//! This crate provides a uniform player over heterogeneous playback backends:
//! - A guarded playback state machine over a native backend
//! - Seek clamping and near-playhead tolerance
//! - Event emission to owner-scoped listeners
//! - Simulated live time for devices that can only start and stop streams
//! - Strategy selection by window type and live support
//! - An async session host for commands and backend notifications
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                       Screenplay Core                           │
//! ├─────────────────────────────────────────────────────────────────┤
//! │                                                                 │
//! │                    ┌─────────────────┐                          │
//! │                    │ Playback Session│                          │
//! │                    └────────┬────────┘                          │
//! │                             │                                   │
//! │                    ┌────────┴────────┐                          │
//! │                    │    Strategy     │                          │
//! │                    └────────┬────────┘                          │
//! │                             │                                   │
//! │  ┌──────────────┐  ┌────────┴────────┐  ┌──────────────┐        │
//! │  │  Playable    │──│  Native Player  │──│ Seek Policy  │        │
//! │  │  (FakeTime)  │  │ (state machine) │  └──────────────┘        │
//! │  └──────────────┘  └────────┬────────┘                          │
//! │                             │                                   │
//! │  ┌──────────────┐  ┌────────┴────────┐                          │
//! │  │   Listener   │  │  Media Backend  │                          │
//! │  │   Registry   │  │                 │                          │
//! │  └──────────────┘  └─────────────────┘                          │
//! └─────────────────────────────────────────────────────────────────┘
//! ```

pub mod error;
pub mod types;
pub mod policy;
pub mod faketime;
pub mod events;
pub mod backend;
pub mod player;
pub mod strategy;
pub mod session;

pub use error::{Error, Result};
pub use types::*;
pub use policy::SeekPolicy;
pub use faketime::FakeTime;
pub use events::{EventCallback, EventType, ListenerId, ListenerRegistry, MediaEvent};
pub use backend::{BackendCall, BackendEvent, DeviceFault, MediaBackend, SimulatedBackend};
pub use player::{MediaPlayer, NativePlayer, PlayableLivePlayer, SeekablePlayer};
pub use strategy::PlaybackStrategy;
pub use session::{Operation, PlaybackSession, PlayerSnapshot, SessionHandle};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Initialize the library
pub fn init() {
    tracing::info!(version = VERSION, "Screenplay Core initialized");
}
