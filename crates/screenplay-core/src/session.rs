//! Playback Session - async host for one player
//!
//! Coordinates:
//! - Caller commands arriving through cloneable [`SessionHandle`]s
//! - Raw backend notifications arriving on an mpsc channel
//! - Event fan-out to any number of broadcast subscribers
//!
//! The player lives on a single task, so commands and notifications are
//! applied one at a time and never interleave mid-transition. Pending
//! backend notifications are drained before the next command.

use crate::{
    backend::BackendEvent,
    events::MediaEvent,
    player::SeekablePlayer,
    strategy::PlaybackStrategy,
    types::*,
    Error, Result,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::{broadcast, mpsc, oneshot};
use tracing::{debug, info, instrument};

/// Owner name of the session's own event listener
const SESSION_OWNER: &str = "session";

/// Capacity of the command queue
const COMMAND_CAPACITY: usize = 64;

/// Capacity of the event broadcast; slow subscribers observe a lag error
const EVENT_CAPACITY: usize = 256;

/// A caller operation on the player
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum Operation {
    InitialiseMedia {
        media_type: MediaType,
        url: String,
        mime_type: String,
    },
    BeginPlayback,
    BeginPlaybackFrom { seconds: f64 },
    PlayFrom { seconds: f64 },
    Pause,
    Resume,
    Stop,
    Reset,
    /// Read the player without changing it
    Snapshot,
}

impl Operation {
    pub fn name(&self) -> &'static str {
        match self {
            Operation::InitialiseMedia { .. } => "initialise_media",
            Operation::BeginPlayback => "begin_playback",
            Operation::BeginPlaybackFrom { .. } => "begin_playback_from",
            Operation::PlayFrom { .. } => "play_from",
            Operation::Pause => "pause",
            Operation::Resume => "resume",
            Operation::Stop => "stop",
            Operation::Reset => "reset",
            Operation::Snapshot => "snapshot",
        }
    }
}

/// Read-only view of the player after an operation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayerSnapshot {
    pub tier: String,
    pub state: PlaybackState,
    pub current_time: Option<f64>,
    pub seekable_range: Option<SeekableRange>,
    pub duration: Option<f64>,
    pub source: Option<String>,
    pub mime_type: Option<String>,
    pub element: ElementHandle,
}

impl PlayerSnapshot {
    fn capture(strategy: &PlaybackStrategy) -> Self {
        let player = strategy.player();
        let seekable = strategy.seekable();
        Self {
            tier: strategy.name().to_string(),
            state: player.state(),
            current_time: player.current_time(),
            seekable_range: seekable.and_then(|p| p.seekable_range()),
            duration: seekable.and_then(|p| p.duration()),
            source: player.source().map(str::to_string),
            mime_type: player.mime_type().map(str::to_string),
            element: player.player_element(),
        }
    }
}

enum SessionCommand {
    Execute {
        operation: Operation,
        reply: oneshot::Sender<Result<PlayerSnapshot>>,
    },
    Shutdown,
}

/// Spawns and owns the playback task
pub struct PlaybackSession;

impl PlaybackSession {
    /// Start a session task for `strategy`, fed by `backend_events`.
    ///
    /// Must be called from within a tokio runtime.
    pub fn spawn(
        mut strategy: PlaybackStrategy,
        backend_events: mpsc::UnboundedReceiver<BackendEvent>,
    ) -> SessionHandle {
        let id = SessionId::new();
        let (command_tx, command_rx) = mpsc::channel(COMMAND_CAPACITY);
        let (event_tx, _) = broadcast::channel(EVENT_CAPACITY);

        let publisher = event_tx.clone();
        strategy.player_mut().add_event_callback(
            SESSION_OWNER,
            Arc::new(move |event: &MediaEvent| {
                // No subscribers is not an error
                let _ = publisher.send(event.clone());
            }),
        );

        info!(session_id = %id, tier = strategy.name(), "Playback session started");
        tokio::spawn(run(id, strategy, command_rx, backend_events));

        SessionHandle {
            id,
            commands: command_tx,
            events: event_tx,
        }
    }
}

async fn run(
    id: SessionId,
    mut strategy: PlaybackStrategy,
    mut commands: mpsc::Receiver<SessionCommand>,
    mut backend_events: mpsc::UnboundedReceiver<BackendEvent>,
) {
    let mut backend_open = true;

    loop {
        tokio::select! {
            biased;

            event = backend_events.recv(), if backend_open => match event {
                Some(event) => {
                    debug!(session_id = %id, ?event, "Backend notification");
                    strategy.player_mut().handle_backend_event(event);
                }
                None => {
                    debug!(session_id = %id, "Backend notification channel closed");
                    backend_open = false;
                }
            },

            command = commands.recv() => match command {
                Some(SessionCommand::Execute { operation, reply }) => {
                    let result = apply(&mut strategy, operation);
                    // The caller may have stopped waiting
                    let _ = reply.send(result);
                }
                Some(SessionCommand::Shutdown) | None => break,
            },
        }
    }

    strategy.player_mut().remove_all_event_callbacks();
    info!(session_id = %id, "Playback session ended");
}

fn seekable<'a>(
    strategy: &'a mut PlaybackStrategy,
    operation: &'static str,
) -> Result<&'a mut dyn SeekablePlayer> {
    strategy.seekable_mut().ok_or(Error::Unsupported(operation))
}

fn apply(strategy: &mut PlaybackStrategy, operation: Operation) -> Result<PlayerSnapshot> {
    let name = operation.name();
    match operation {
        Operation::InitialiseMedia {
            media_type,
            url,
            mime_type,
        } => strategy.player_mut().initialise_media(media_type, &url, &mime_type),
        Operation::BeginPlayback => strategy.player_mut().begin_playback(),
        Operation::BeginPlaybackFrom { seconds } => seekable(strategy, name)?.begin_playback_from(seconds),
        Operation::PlayFrom { seconds } => seekable(strategy, name)?.play_from(seconds),
        Operation::Pause => seekable(strategy, name)?.pause(),
        Operation::Resume => seekable(strategy, name)?.resume(),
        Operation::Stop => strategy.player_mut().stop(),
        Operation::Reset => strategy.player_mut().reset(),
        Operation::Snapshot => {}
    }
    Ok(PlayerSnapshot::capture(strategy))
}

/// Cloneable handle to a running session
#[derive(Clone)]
pub struct SessionHandle {
    id: SessionId,
    commands: mpsc::Sender<SessionCommand>,
    events: broadcast::Sender<MediaEvent>,
}

impl SessionHandle {
    pub fn id(&self) -> SessionId {
        self.id
    }

    /// Receive every event emitted from now on
    pub fn subscribe(&self) -> broadcast::Receiver<MediaEvent> {
        self.events.subscribe()
    }

    /// Run `operation` on the player and return its state afterwards
    #[instrument(skip(self), fields(session_id = %self.id))]
    pub async fn execute(&self, operation: Operation) -> Result<PlayerSnapshot> {
        let (reply, response) = oneshot::channel();
        self.commands
            .send(SessionCommand::Execute { operation, reply })
            .await
            .map_err(|_| Error::SessionClosed)?;
        response.await.map_err(|_| Error::SessionClosed)?
    }

    pub async fn initialise_media(
        &self,
        media_type: MediaType,
        url: impl Into<String>,
        mime_type: impl Into<String>,
    ) -> Result<PlayerSnapshot> {
        self.execute(Operation::InitialiseMedia {
            media_type,
            url: url.into(),
            mime_type: mime_type.into(),
        })
        .await
    }

    pub async fn begin_playback(&self) -> Result<PlayerSnapshot> {
        self.execute(Operation::BeginPlayback).await
    }

    pub async fn begin_playback_from(&self, seconds: f64) -> Result<PlayerSnapshot> {
        self.execute(Operation::BeginPlaybackFrom { seconds }).await
    }

    pub async fn play_from(&self, seconds: f64) -> Result<PlayerSnapshot> {
        self.execute(Operation::PlayFrom { seconds }).await
    }

    pub async fn pause(&self) -> Result<PlayerSnapshot> {
        self.execute(Operation::Pause).await
    }

    pub async fn resume(&self) -> Result<PlayerSnapshot> {
        self.execute(Operation::Resume).await
    }

    pub async fn stop(&self) -> Result<PlayerSnapshot> {
        self.execute(Operation::Stop).await
    }

    pub async fn reset(&self) -> Result<PlayerSnapshot> {
        self.execute(Operation::Reset).await
    }

    pub async fn snapshot(&self) -> Result<PlayerSnapshot> {
        self.execute(Operation::Snapshot).await
    }

    /// Stop the session task. Later calls on any handle fail with
    /// [`Error::SessionClosed`].
    pub async fn shutdown(&self) -> Result<()> {
        self.commands
            .send(SessionCommand::Shutdown)
            .await
            .map_err(|_| Error::SessionClosed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::SimulatedBackend;
    use crate::events::EventType;

    fn spawn(
        window_type: WindowType,
    ) -> (SessionHandle, mpsc::UnboundedSender<BackendEvent>, SimulatedBackend) {
        let backend = SimulatedBackend::default();
        let strategy = PlaybackStrategy::new(
            window_type,
            &PlayerConfig::default(),
            TimeWindow::default(),
            Box::new(backend.clone()),
        )
        .unwrap();
        let (backend_tx, backend_rx) = mpsc::unbounded_channel();
        (PlaybackSession::spawn(strategy, backend_rx), backend_tx, backend)
    }

    #[tokio::test]
    async fn test_session_creation() {
        let (session, _backend_tx, _) = spawn(WindowType::Static);
        let snapshot = session.snapshot().await.unwrap();
        assert_eq!(snapshot.state, PlaybackState::Empty);
        assert_eq!(snapshot.tier, "seekable");
        assert_eq!(snapshot.current_time, None);
    }

    #[tokio::test]
    async fn test_commands_and_notifications_are_ordered() {
        let (session, backend_tx, _) = spawn(WindowType::Static);
        let mut events = session.subscribe();

        session
            .initialise_media(MediaType::Video, "http://example.com/a.mp4", "video/mp4")
            .await
            .unwrap();
        session.begin_playback().await.unwrap();
        backend_tx
            .send(BackendEvent::StreamInfoReady { duration_ms: 60_000.0 })
            .unwrap();
        backend_tx.send(BackendEvent::BufferingComplete).unwrap();
        let snapshot = session.snapshot().await.unwrap();

        assert_eq!(snapshot.state, PlaybackState::Playing);
        assert_eq!(snapshot.duration, Some(60.0));

        let mut types = Vec::new();
        while let Ok(event) = events.try_recv() {
            types.push(event.event_type);
        }
        assert_eq!(types, vec![EventType::Stopped, EventType::Buffering, EventType::Playing]);
    }

    #[tokio::test]
    async fn test_playable_tier_rejects_seeking() {
        let (session, _backend_tx, backend) = spawn(WindowType::Sliding);
        session
            .initialise_media(MediaType::Audio, "http://example.com/radio.m3u8", "application/x-mpegurl")
            .await
            .unwrap();

        let err = session.play_from(30.0).await.unwrap_err();
        assert!(matches!(err, Error::Unsupported("play_from")));
        assert!(backend.calls().is_empty());

        let snapshot = session.begin_playback().await.unwrap();
        assert_eq!(snapshot.tier, "playable");
        assert_eq!(snapshot.current_time, Some(100.0));
    }

    #[tokio::test]
    async fn test_shutdown_closes_session() {
        let (session, _backend_tx, _) = spawn(WindowType::Static);
        let other = session.clone();
        session.shutdown().await.unwrap();

        let err = other.snapshot().await.unwrap_err();
        assert!(matches!(err, Error::SessionClosed));
    }
}
