//! Playback coordinator.
//!
//! Lifecycle: `Uninitialized -> PlayerReady -> {Playing, Paused}`. Errors
//! never halt the machine; after `recovery_delay_ms` the coordinator moves
//! on to the next track.

use super::{MediaError, MediaPlayer, PlaybackState, PlayerEvent, PlayerState, Track};
use crate::config::MediaSettings;
use crate::error::RideError;

/// Coordinator lifecycle phase
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PlaybackPhase {
    #[default]
    Uninitialized,
    PlayerReady,
    Playing,
    Paused,
}

pub struct PlaybackCoordinator<P: MediaPlayer> {
    player: P,
    state: PlaybackState,
    phase: PlaybackPhase,
    recovery_delay_ms: u64,
    autoplay: bool,
    /// When the pending error recovery fires
    recovery_deadline_ms: Option<u64>,
    /// Latest time seen through `on_event` or `poll`
    clock_ms: u64,
}

impl<P: MediaPlayer> PlaybackCoordinator<P> {
    pub fn new(player: P, settings: &MediaSettings) -> Self {
        Self {
            player,
            state: PlaybackState::default(),
            phase: PlaybackPhase::Uninitialized,
            recovery_delay_ms: settings.recovery_delay_ms,
            autoplay: settings.autoplay,
            recovery_deadline_ms: None,
            clock_ms: 0,
        }
    }

    pub fn state(&self) -> &PlaybackState {
        &self.state
    }

    pub fn phase(&self) -> PlaybackPhase {
        self.phase
    }

    pub fn player(&self) -> &P {
        &self.player
    }

    pub fn current_track(&self) -> Option<&Track> {
        self.state.current_track()
    }

    /// Deadline of the pending error recovery, if any
    pub fn recovery_deadline(&self) -> Option<u64> {
        self.recovery_deadline_ms
    }

    /// Replace the playlist and restart from its first track.
    pub fn load_playlist(&mut self, tracks: Vec<Track>) {
        tracing::info!("Playlist loaded ({} tracks)", tracks.len());
        self.state.playlist = tracks;
        self.state.current_index = 0;
        self.recovery_deadline_ms = None;
        if self.state.is_player_ready {
            self.load_current(false);
        }
    }

    /// Handle an event reported by the player.
    pub fn on_event(&mut self, event: PlayerEvent, now_ms: u64) {
        self.clock_ms = self.clock_ms.max(now_ms);
        match event {
            PlayerEvent::Ready => {
                if self.state.is_player_ready {
                    return;
                }
                tracing::info!("Media player ready");
                self.state.is_player_ready = true;
                self.phase = PlaybackPhase::PlayerReady;
                // Anything selected before readiness takes effect now
                self.load_current(self.autoplay);
            }
            PlayerEvent::StateChanged(PlayerState::Playing) => {
                self.state.is_playing = true;
                self.phase = PlaybackPhase::Playing;
            }
            PlayerEvent::StateChanged(PlayerState::Paused) => {
                self.state.is_playing = false;
                self.phase = PlaybackPhase::Paused;
            }
            PlayerEvent::StateChanged(PlayerState::Buffering) => {}
            PlayerEvent::StateChanged(PlayerState::Ended) => {
                tracing::debug!("Track ended");
                self.step(1, true);
            }
            PlayerEvent::Error(message) => self.fail(MediaError::PlayerError(message)),
        }
    }

    /// Fire the pending error recovery once its deadline has passed.
    pub fn poll(&mut self, now_ms: u64) {
        self.clock_ms = self.clock_ms.max(now_ms);
        if let Some(deadline) = self.recovery_deadline_ms {
            if now_ms >= deadline {
                tracing::debug!("Recovering from playback error");
                self.step(1, true);
            }
        }
    }

    /// Toggle play/pause. Returns false when the player is not ready.
    pub fn toggle_play(&mut self) -> bool {
        if !self.state.is_player_ready {
            return false;
        }
        if self.state.is_playing {
            self.player.pause();
            self.state.is_playing = false;
            self.phase = PlaybackPhase::Paused;
        } else {
            self.player.play();
            self.state.is_playing = true;
            self.phase = PlaybackPhase::Playing;
        }
        true
    }

    pub fn next(&mut self) {
        let keep_playing = self.state.is_playing;
        self.step(1, keep_playing);
    }

    pub fn previous(&mut self) {
        let keep_playing = self.state.is_playing;
        self.step(-1, keep_playing);
    }

    /// Jump to `index`.
    pub fn select(&mut self, index: usize) -> Result<(), MediaError> {
        if self.state.playlist.is_empty() {
            return Err(MediaError::EmptyPlaylist);
        }
        if index >= self.state.playlist.len() {
            return Err(MediaError::LoadFailed(format!("no track at index {}", index)));
        }
        self.state.current_index = index;
        self.recovery_deadline_ms = None;
        if self.state.is_player_ready {
            let keep_playing = self.state.is_playing;
            self.load_current(keep_playing);
        }
        Ok(())
    }

    /// Move `delta` tracks, wrapping around. Empty playlists are left alone.
    fn step(&mut self, delta: isize, play: bool) {
        self.recovery_deadline_ms = None;
        let len = self.state.playlist.len();
        if len == 0 {
            return;
        }
        let next = (self.state.current_index as isize + delta).rem_euclid(len as isize);
        self.state.current_index = next as usize;
        if self.state.is_player_ready {
            self.load_current(play || self.autoplay);
        }
    }

    fn load_current(&mut self, play: bool) {
        let Some(track) = self.state.current_track().cloned() else {
            return;
        };
        self.state.is_playing = false;
        if let Err(e) = self.player.load(&track) {
            self.fail(e);
            return;
        }
        self.phase = PlaybackPhase::PlayerReady;
        if play {
            self.player.play();
            self.state.is_playing = true;
            self.phase = PlaybackPhase::Playing;
        }
    }

    fn fail(&mut self, error: MediaError) {
        let error = RideError::from(error);
        tracing::warn!("{}", error);
        self.state.is_playing = false;
        if self.recovery_deadline_ms.is_none() {
            self.recovery_deadline_ms = Some(self.clock_ms + self.recovery_delay_ms);
        }
    }
}
