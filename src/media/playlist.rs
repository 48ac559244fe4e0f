//! Playlist sources.

use super::{MediaError, Track};
use crate::error::RideError;
use std::time::Duration;

/// Trait for read-only playlist providers
pub trait PlaylistSource: Send + Sync {
    /// Fetch the full playlist
    fn fetch(&self) -> impl std::future::Future<Output = Result<Vec<Track>, MediaError>> + Send;
}

/// Fixed in-memory playlist
#[derive(Debug, Clone, Default)]
pub struct StaticPlaylist {
    tracks: Vec<Track>,
}

impl StaticPlaylist {
    pub fn new(tracks: Vec<Track>) -> Self {
        Self { tracks }
    }
}

impl PlaylistSource for StaticPlaylist {
    async fn fetch(&self) -> Result<Vec<Track>, MediaError> {
        Ok(self.tracks.clone())
    }
}

/// Playlist served as a JSON array of tracks
pub struct HttpPlaylistSource {
    http: reqwest::Client,
    url: String,
}

impl HttpPlaylistSource {
    pub fn new(url: impl Into<String>, timeout: Duration) -> Result<Self, MediaError> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| MediaError::PlaylistUnavailable(e.to_string()))?;
        Ok(Self {
            http,
            url: url.into(),
        })
    }
}

impl PlaylistSource for HttpPlaylistSource {
    async fn fetch(&self) -> Result<Vec<Track>, MediaError> {
        tracing::debug!("Fetching playlist from {}", self.url);

        let response = self
            .http
            .get(&self.url)
            .send()
            .await
            .map_err(|e| MediaError::PlaylistUnavailable(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(MediaError::PlaylistUnavailable(format!("HTTP {}", status)));
        }

        response
            .json::<Vec<Track>>()
            .await
            .map_err(|e| MediaError::PlaylistUnavailable(e.to_string()))
    }
}

/// Fetch a playlist, falling back to an empty one on failure.
pub async fn fetch_playlist_or_empty<S: PlaylistSource>(source: &S) -> Vec<Track> {
    match source.fetch().await {
        Ok(tracks) => tracks,
        Err(e) => {
            tracing::warn!("{}", RideError::from(e));
            Vec::new()
        }
    }
}
