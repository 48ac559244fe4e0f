//! Media Playback Module
//!
//! Drives an embedded audio/video player through a fixed lifecycle,
//! independent of navigation.

pub mod coordinator;
pub mod player;
pub mod playlist;

use serde::{Deserialize, Serialize};
use thiserror::Error;

// Re-export main types
pub use coordinator::{PlaybackCoordinator, PlaybackPhase};
pub use player::{HeadlessPlayer, MediaPlayer};
pub use playlist::{fetch_playlist_or_empty, HttpPlaylistSource, PlaylistSource, StaticPlaylist};

/// Media-related errors
#[derive(Debug, Clone, PartialEq, Error)]
pub enum MediaError {
    #[error("Player not ready")]
    PlayerNotReady,

    #[error("Playlist is empty")]
    EmptyPlaylist,

    #[error("Failed to load track: {0}")]
    LoadFailed(String),

    #[error("Player error: {0}")]
    PlayerError(String),

    #[error("Playlist unavailable: {0}")]
    PlaylistUnavailable(String),
}

/// A playable item
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Track {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub artist: String,
    pub media_url: String,
}

impl Track {
    pub fn new(
        id: impl Into<String>,
        title: impl Into<String>,
        artist: impl Into<String>,
        media_url: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            artist: artist.into(),
            media_url: media_url.into(),
        }
    }
}

/// Observable playback state
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct PlaybackState {
    pub playlist: Vec<Track>,
    pub current_index: usize,
    pub is_playing: bool,
    pub is_player_ready: bool,
}

impl PlaybackState {
    /// Track at `current_index`, if the playlist is not empty
    pub fn current_track(&self) -> Option<&Track> {
        self.playlist.get(self.current_index)
    }
}

/// State reported by the player
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlayerState {
    Playing,
    Paused,
    Buffering,
    /// End of track reached
    Ended,
}

/// Player events
#[derive(Debug, Clone, PartialEq)]
pub enum PlayerEvent {
    /// Player handle became usable
    Ready,
    StateChanged(PlayerState),
    /// Error occurred
    Error(String),
}
