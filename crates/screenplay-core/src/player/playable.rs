//! Live wrapper for devices that can only start and stop a stream
//!
//! The wrapped player is told it is serving live media and its playhead is
//! replaced by a [`FakeTime`] clock seeded near the live edge when playback
//! begins. The wrapper implements [`MediaPlayer`] only; seeking, pausing and
//! range queries are not part of this tier.

use super::MediaPlayer;
use crate::backend::BackendEvent;
use crate::events::{EventCallback, ListenerId, MediaEvent};
use crate::faketime::FakeTime;
use crate::types::{ElementHandle, MediaType, PlaybackState, PlayerConfig, TimeWindow};
use parking_lot::Mutex;
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::debug;

/// Owner under which the clock-tracking listener is installed
const TRACKER_OWNER: &str = "playable-live-time";

/// A caller's registration and the intercepting listener installed for it
#[derive(Debug, Clone)]
struct CallbackRegistration {
    owner: String,
    installed: ListenerId,
}

pub struct PlayableLivePlayer<P: MediaPlayer> {
    player: P,
    fake_time: Arc<Mutex<FakeTime>>,
    /// Time the clock is seeded with when playback begins (seconds)
    live_start: f64,
    registrations: BTreeMap<ListenerId, CallbackRegistration>,
    next_id: u64,
}

impl<P: MediaPlayer> PlayableLivePlayer<P> {
    pub fn new(player: P, config: &PlayerConfig, window: TimeWindow) -> Self {
        let mut wrapper = Self {
            player,
            fake_time: Arc::new(Mutex::new(FakeTime::new())),
            live_start: window.start_seconds() + config.live_start_lead,
            registrations: BTreeMap::new(),
            next_id: 0,
        };
        wrapper.install_tracker();
        wrapper
    }

    /// Feed every wrapped-player event into the clock. Installed before any
    /// caller listener so callers observe the updated time.
    fn install_tracker(&mut self) {
        let fake_time = Arc::clone(&self.fake_time);
        self.player.add_event_callback(
            TRACKER_OWNER,
            Arc::new(move |event: &MediaEvent| fake_time.lock().update(event.state)),
        );
    }

    /// Time the clock is seeded with by `begin_playback`
    pub fn live_start(&self) -> f64 {
        self.live_start
    }

    pub fn inner(&self) -> &P {
        &self.player
    }
}

impl<P: MediaPlayer> MediaPlayer for PlayableLivePlayer<P> {
    fn initialise_media(&mut self, media_type: MediaType, url: &str, mime_type: &str) {
        let live_type = media_type.to_live();
        debug!(from = %media_type, to = %live_type, "Substituting live media type");
        self.player.initialise_media(live_type, url, mime_type);
    }

    fn begin_playback(&mut self) {
        self.fake_time.lock().set_current_time(self.live_start);
        self.player.begin_playback();
    }

    fn stop(&mut self) {
        self.player.stop();
    }

    fn reset(&mut self) {
        self.player.reset();
        self.fake_time.lock().reset();
    }

    fn state(&self) -> PlaybackState {
        self.player.state()
    }

    fn current_time(&self) -> Option<f64> {
        if self.player.state() == PlaybackState::Stopped {
            None
        } else {
            self.fake_time.lock().current_time()
        }
    }

    fn source(&self) -> Option<&str> {
        self.player.source()
    }

    fn mime_type(&self) -> Option<&str> {
        self.player.mime_type()
    }

    fn player_element(&self) -> ElementHandle {
        self.player.player_element()
    }

    fn add_event_callback(&mut self, owner: &str, callback: EventCallback) -> ListenerId {
        let fake_time = Arc::clone(&self.fake_time);
        let interceptor: EventCallback = Arc::new(move |event: &MediaEvent| {
            let mut event = event.clone();
            event.current_time = if event.state == PlaybackState::Stopped {
                None
            } else {
                fake_time.lock().current_time()
            };
            callback(&event);
        });

        let installed = self.player.add_event_callback(owner, interceptor);
        let id = ListenerId(self.next_id);
        self.next_id += 1;
        self.registrations.insert(
            id,
            CallbackRegistration {
                owner: owner.to_string(),
                installed,
            },
        );
        id
    }

    fn remove_event_callback(&mut self, owner: &str, id: ListenerId) -> bool {
        match self.registrations.get(&id) {
            Some(registration) if registration.owner == owner => {
                let installed = registration.installed;
                self.registrations.remove(&id);
                self.player.remove_event_callback(owner, installed)
            }
            _ => false,
        }
    }

    fn remove_all_event_callbacks(&mut self) {
        self.registrations.clear();
        self.player.remove_all_event_callbacks();
        self.install_tracker();
    }

    fn handle_backend_event(&mut self, event: BackendEvent) {
        self.player.handle_backend_event(event);
    }
}
