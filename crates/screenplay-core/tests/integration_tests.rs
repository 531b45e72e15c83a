//! Integration tests for Screenplay Core

use parking_lot::Mutex;
use screenplay_core::{
    BackendCall, BackendEvent, EventType, FakeTime, MediaEvent, MediaPlayer, MediaType,
    NativePlayer, PlaybackSession, PlaybackState, PlaybackStrategy, PlayerConfig, SeekPolicy,
    SeekableRange, SeekablePlayer, SimulatedBackend, TimeWindow, WindowType,
};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;

struct Recorded {
    player: NativePlayer<SimulatedBackend>,
    backend: SimulatedBackend,
    events: Arc<Mutex<Vec<MediaEvent>>>,
}

fn recorded() -> Recorded {
    let backend = SimulatedBackend::default();
    let mut player = NativePlayer::new(backend.clone(), &PlayerConfig::default());
    let events = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&events);
    player.add_event_callback("test", Arc::new(move |ev: &MediaEvent| sink.lock().push(ev.clone())));
    Recorded { player, backend, events }
}

/// Drive a fresh player into `state` through legal transitions only
fn player_in(state: PlaybackState) -> Recorded {
    let mut rec = recorded();
    let player = &mut rec.player;
    if state == PlaybackState::Empty {
        return rec;
    }
    player.initialise_media(MediaType::Video, "http://example.com/movie.mp4", "video/mp4");
    if state == PlaybackState::Stopped {
        return rec;
    }
    player.begin_playback();
    if state == PlaybackState::Buffering {
        return rec;
    }
    player.handle_backend_event(BackendEvent::StreamInfoReady { duration_ms: 120_000.0 });
    player.handle_backend_event(BackendEvent::BufferingComplete);
    player.handle_backend_event(BackendEvent::CurrentPlayTime { millis: 5_000.0 });
    match state {
        PlaybackState::Paused => player.pause(),
        PlaybackState::Complete => player.handle_backend_event(BackendEvent::RenderingComplete),
        _ => {}
    }
    assert_eq!(player.state(), state);
    rec
}

/// Invoke the mutating operation called `name`
fn invoke(player: &mut NativePlayer<SimulatedBackend>, name: &str) {
    match name {
        "initialise_media" => {
            player.initialise_media(MediaType::Audio, "http://example.com/other.mp3", "audio/mpeg")
        }
        "begin_playback" => player.begin_playback(),
        "begin_playback_from" => player.begin_playback_from(10.0),
        "play_from" => player.play_from(10.0),
        "pause" => player.pause(),
        "resume" => player.resume(),
        "stop" => player.stop(),
        "reset" => player.reset(),
        other => panic!("unknown operation {}", other),
    }
}

// =============================================================================
// State Machine Tests
// =============================================================================

#[test]
fn test_legal_sequence_tracks_transition_table() {
    let mut rec = recorded();
    let p = &mut rec.player;

    let mut seen = Vec::new();
    p.initialise_media(MediaType::Video, "http://example.com/movie.mp4", "video/mp4");
    seen.push(p.state());
    p.begin_playback_from(20.0);
    seen.push(p.state());
    p.handle_backend_event(BackendEvent::BufferingComplete);
    seen.push(p.state());
    p.pause();
    seen.push(p.state());
    p.resume();
    seen.push(p.state());
    p.handle_backend_event(BackendEvent::BufferingStart);
    seen.push(p.state());
    p.handle_backend_event(BackendEvent::BufferingComplete);
    seen.push(p.state());
    p.handle_backend_event(BackendEvent::RenderingComplete);
    seen.push(p.state());
    p.stop();
    seen.push(p.state());
    p.reset();
    seen.push(p.state());

    use PlaybackState::*;
    assert_eq!(
        seen,
        vec![Stopped, Buffering, Playing, Paused, Playing, Buffering, Playing, Complete, Stopped, Empty]
    );
}

#[test]
fn test_illegal_operations_always_error() {
    use PlaybackState::*;
    let cases = [
        (Stopped, "initialise_media"),
        (Playing, "initialise_media"),
        (Empty, "begin_playback"),
        (Playing, "begin_playback"),
        (Empty, "begin_playback_from"),
        (Paused, "begin_playback_from"),
        (Empty, "play_from"),
        (Stopped, "play_from"),
        (Empty, "pause"),
        (Stopped, "pause"),
        (Complete, "pause"),
        (Empty, "resume"),
        (Complete, "resume"),
        (Empty, "stop"),
        (Buffering, "reset"),
        (Playing, "reset"),
        (Paused, "reset"),
        (Complete, "reset"),
    ];

    for (state, name) in cases {
        let mut rec = player_in(state);
        invoke(&mut rec.player, name);

        assert_eq!(rec.player.state(), Error, "{} from {}", name, state);
        let events = rec.events.lock();
        let last = events.last().expect("an event is emitted");
        assert_eq!(last.event_type, EventType::Error);
        let message = last.error_message.as_deref().unwrap_or_default();
        assert!(!message.is_empty());
        assert!(message.contains(name), "{:?} should name {}", message, name);
    }
}

#[test]
fn test_deferred_seek_applied_once_on_first_sample() {
    let mut rec = player_in(PlaybackState::Buffering);
    rec.backend.clear_calls();

    rec.player.play_from(60.0);
    assert_eq!(rec.backend.jump_count(), 0);

    rec.player.handle_backend_event(BackendEvent::CurrentPlayTime { millis: 0.0 });
    assert_eq!(rec.backend.calls(), vec![BackendCall::Jump { offset_seconds: 60.0 }]);

    for millis in [60_000.0, 61_000.0, 62_000.0] {
        rec.player.handle_backend_event(BackendEvent::CurrentPlayTime { millis });
    }
    assert_eq!(rec.backend.jump_count(), 1);
}

#[test]
fn test_unknown_playhead_defers_seek_while_playing() {
    let mut rec = player_in(PlaybackState::Playing);
    rec.player.stop();
    rec.player.begin_playback();
    rec.player.handle_backend_event(BackendEvent::BufferingComplete);
    rec.backend.clear_calls();

    // No time sample since the restart
    rec.player.play_from(30.0);
    assert_eq!(rec.player.state(), PlaybackState::Buffering);
    assert_eq!(rec.backend.jump_count(), 0);

    rec.player.handle_backend_event(BackendEvent::CurrentPlayTime { millis: 0.0 });
    assert_eq!(rec.backend.jump_count(), 1);
}

// =============================================================================
// Policy Tests
// =============================================================================

#[test]
fn test_clamp_is_idempotent() {
    let policy = SeekPolicy::default();
    let range = SeekableRange::new(10.0, 200.0);
    for x in [-50.0, 0.0, 10.0, 57.3, 198.9, 199.5, 250.0] {
        let once = policy.clamp(x, Some(&range));
        assert_eq!(policy.clamp(once, Some(&range)), once);
    }
}

#[test]
fn test_is_near_boundary_inclusive() {
    let policy = SeekPolicy::default();
    assert!(policy.is_near(Some(10.0), 12.5, None));
    assert!(policy.is_near(Some(10.0), 7.5, None));
    assert!(!policy.is_near(Some(10.0), 12.75, None));
    assert!(!policy.is_near(None, 10.0, None));
}

// =============================================================================
// Live Time Tests
// =============================================================================

#[tokio::test(start_paused = true)]
async fn test_fake_time_advances_while_playing() {
    let mut clock = FakeTime::new();
    clock.set_current_time(10.0);
    clock.update(PlaybackState::Playing);
    tokio::time::advance(Duration::from_millis(1000)).await;
    clock.update(PlaybackState::Playing);
    assert_eq!(clock.current_time(), Some(11.0));
}

#[tokio::test(start_paused = true)]
async fn test_fake_time_holds_while_paused() {
    let mut clock = FakeTime::new();
    clock.set_current_time(10.0);
    clock.update(PlaybackState::Paused);
    tokio::time::advance(Duration::from_millis(1000)).await;
    clock.update(PlaybackState::Playing);
    assert_eq!(clock.current_time(), Some(10.0));
}

// =============================================================================
// Playable Tier Tests
// =============================================================================

fn playable() -> (PlaybackStrategy, SimulatedBackend) {
    let backend = SimulatedBackend::default();
    let strategy = PlaybackStrategy::new(
        WindowType::Sliding,
        &PlayerConfig::default(),
        TimeWindow::default(),
        Box::new(backend.clone()),
    )
    .unwrap();
    (strategy, backend)
}

#[test]
fn test_playable_begin_playback_seeds_live_lead() {
    let (mut strategy, backend) = playable();
    let player = strategy.player_mut();
    player.initialise_media(MediaType::Video, "http://example.com/live.m3u8", "application/x-mpegurl");
    player.begin_playback();

    assert_eq!(player.current_time(), Some(100.0));
    assert_eq!(
        backend.calls(),
        vec![BackendCall::Play { source: "http://example.com/live.m3u8|COMPONENT=HLS".to_string() }]
    );
}

#[tokio::test(start_paused = true)]
async fn test_playable_events_carry_live_time() {
    let (mut strategy, _) = playable();
    let times = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&times);
    let player = strategy.player_mut();
    player.add_event_callback("ui", Arc::new(move |ev: &MediaEvent| sink.lock().push(ev.current_time)));

    player.initialise_media(MediaType::Video, "http://example.com/live.m3u8", "application/x-mpegurl");
    player.begin_playback();
    player.handle_backend_event(BackendEvent::BufferingComplete);
    tokio::time::advance(Duration::from_secs(4)).await;
    player.handle_backend_event(BackendEvent::CurrentPlayTime { millis: 900.0 });

    assert_eq!(*times.lock(), vec![None, Some(100.0), Some(100.0), Some(104.0)]);
}

// =============================================================================
// Listener Tests
// =============================================================================

#[test]
fn test_remove_event_callback_leaves_others() {
    let mut rec = recorded();
    let removed = Arc::new(Mutex::new(0));
    let kept = Arc::new(Mutex::new(0));

    let r = Arc::clone(&removed);
    let id = rec.player.add_event_callback("overlay", Arc::new(move |_: &MediaEvent| *r.lock() += 1));
    let k = Arc::clone(&kept);
    rec.player.add_event_callback("stats", Arc::new(move |_: &MediaEvent| *k.lock() += 1));

    // Wrong owner cannot remove it
    assert!(!rec.player.remove_event_callback("stats", id));
    assert!(rec.player.remove_event_callback("overlay", id));

    rec.player.initialise_media(MediaType::Video, "http://example.com/movie.mp4", "video/mp4");
    assert_eq!(*removed.lock(), 0);
    assert_eq!(*kept.lock(), 1);
    assert_eq!(rec.events.lock().len(), 1);
}

// =============================================================================
// Session Tests
// =============================================================================

#[tokio::test]
async fn test_session_round_trip() {
    let backend = SimulatedBackend::default();
    let strategy = PlaybackStrategy::new(
        WindowType::Static,
        &PlayerConfig::default(),
        TimeWindow::default(),
        Box::new(backend.clone()),
    )
    .unwrap();
    let (backend_tx, backend_rx) = mpsc::unbounded_channel();
    let session = PlaybackSession::spawn(strategy, backend_rx);
    let mut events = session.subscribe();

    session
        .initialise_media(MediaType::Video, "http://example.com/movie.mp4", "video/mp4")
        .await
        .unwrap();
    session.begin_playback_from(30.0).await.unwrap();
    backend_tx.send(BackendEvent::StreamInfoReady { duration_ms: 90_000.0 }).unwrap();
    backend_tx.send(BackendEvent::BufferingComplete).unwrap();
    backend_tx.send(BackendEvent::CurrentPlayTime { millis: 30_000.0 }).unwrap();

    let snapshot = session.pause().await.unwrap();
    assert_eq!(snapshot.state, PlaybackState::Paused);
    assert_eq!(snapshot.current_time, Some(30.0));
    assert_eq!(snapshot.seekable_range, Some(SeekableRange::new(0.0, 90.0)));

    let mut types = Vec::new();
    while let Ok(event) = events.try_recv() {
        types.push(event.event_type);
    }
    assert_eq!(
        types,
        vec![
            EventType::Stopped,
            EventType::Buffering,
            EventType::Playing,
            EventType::Status,
            EventType::Paused,
        ]
    );

    session.shutdown().await.unwrap();
}
