//! Media Player
//!
//! Remote-controlled player handle.

use super::{MediaError, PlayerEvent, PlayerState, Track};
use std::sync::{Arc, Mutex};
use tokio::sync::broadcast;

/// Trait for embeddable media players
pub trait MediaPlayer: Send {
    /// Load a track
    fn load(&self, track: &Track) -> Result<(), MediaError>;

    /// Start playback
    fn play(&self);

    /// Pause playback
    fn pause(&self);

    /// Subscribe to player events
    fn subscribe_events(&self) -> broadcast::Receiver<PlayerEvent>;
}

#[derive(Debug, Default)]
struct HeadlessState {
    loaded: Vec<String>,
    playing: bool,
}

/// Player without output that reports what it was told to do.
///
/// Clones share the same state and event channel.
#[derive(Clone)]
pub struct HeadlessPlayer {
    state: Arc<Mutex<HeadlessState>>,
    event_tx: broadcast::Sender<PlayerEvent>,
}

impl Default for HeadlessPlayer {
    fn default() -> Self {
        Self::new()
    }
}

impl HeadlessPlayer {
    pub fn new() -> Self {
        let (event_tx, _) = broadcast::channel(100);
        Self {
            state: Arc::new(Mutex::new(HeadlessState::default())),
            event_tx,
        }
    }

    /// Announce that the player is ready
    pub fn mark_ready(&self) {
        self.emit(PlayerEvent::Ready);
    }

    /// Inject an event as if the player produced it
    pub fn emit(&self, event: PlayerEvent) {
        let _ = self.event_tx.send(event);
    }

    /// Track ids loaded so far, oldest first
    pub fn loaded(&self) -> Vec<String> {
        self.state.lock().map(|s| s.loaded.clone()).unwrap_or_default()
    }

    pub fn is_playing(&self) -> bool {
        self.state.lock().map(|s| s.playing).unwrap_or(false)
    }
}

impl MediaPlayer for HeadlessPlayer {
    fn load(&self, track: &Track) -> Result<(), MediaError> {
        let mut state = self
            .state
            .lock()
            .map_err(|_| MediaError::LoadFailed(track.id.clone()))?;
        state.loaded.push(track.id.clone());
        state.playing = false;
        tracing::debug!("Loaded track {} ({})", track.id, track.title);
        Ok(())
    }

    fn play(&self) {
        if let Ok(mut state) = self.state.lock() {
            if !state.playing {
                state.playing = true;
                self.emit(PlayerEvent::StateChanged(PlayerState::Playing));
            }
        }
    }

    fn pause(&self) {
        if let Ok(mut state) = self.state.lock() {
            if state.playing {
                state.playing = false;
                self.emit(PlayerEvent::StateChanged(PlayerState::Paused));
            }
        }
    }

    fn subscribe_events(&self) -> broadcast::Receiver<PlayerEvent> {
        self.event_tx.subscribe()
    }
}
