//! Integration tests for playlist loading and playback sequencing

use crate::integration::mock_services::tracks;
use ridemode::config::MediaSettings;
use ridemode::media::{
    fetch_playlist_or_empty, HeadlessPlayer, HttpPlaylistSource, PlaybackCoordinator,
    PlayerEvent, PlayerState, StaticPlaylist,
};
use std::time::Duration;

#[tokio::test]
async fn test_playlist_wraps_after_last_track() {
    let playlist = fetch_playlist_or_empty(&StaticPlaylist::new(tracks())).await;
    let player = HeadlessPlayer::new();
    let mut media = PlaybackCoordinator::new(player.clone(), &MediaSettings::default());
    media.load_playlist(playlist);

    media.on_event(PlayerEvent::Ready, 0);
    assert_eq!(player.loaded(), vec!["t1"]);
    assert!(player.is_playing());

    for i in 1..=3u64 {
        media.on_event(PlayerEvent::StateChanged(PlayerState::Ended), i * 1000);
    }

    assert_eq!(media.state().current_index, 0);
    assert_eq!(player.loaded(), vec!["t1", "t2", "t3", "t1"]);
    assert_eq!(media.current_track().map(|t| t.title.as_str()), Some("Highway Star"));
}

#[tokio::test]
async fn test_error_skips_after_delay() {
    let player = HeadlessPlayer::new();
    let mut media = PlaybackCoordinator::new(player.clone(), &MediaSettings::default());
    media.load_playlist(tracks());
    media.on_event(PlayerEvent::Ready, 0);

    media.on_event(PlayerEvent::Error("decoder failed".to_string()), 10_000);
    assert_eq!(media.recovery_deadline(), Some(11_500));

    media.poll(11_499);
    assert_eq!(media.state().current_index, 0);

    media.poll(11_500);
    assert_eq!(media.state().current_index, 1);
    assert_eq!(media.recovery_deadline(), None);
    assert_eq!(player.loaded(), vec!["t1", "t2"]);
}

#[tokio::test]
async fn test_unreachable_playlist_yields_empty() {
    // Nothing listens on the discard port
    let source = HttpPlaylistSource::new("http://127.0.0.1:9/playlist.json", Duration::from_secs(2))
        .unwrap();
    let playlist = fetch_playlist_or_empty(&source).await;
    assert!(playlist.is_empty());

    let player = HeadlessPlayer::new();
    let mut media = PlaybackCoordinator::new(player.clone(), &MediaSettings::default());
    media.load_playlist(playlist);
    media.on_event(PlayerEvent::Ready, 0);
    media.next();
    assert!(media.current_track().is_none());
    assert!(player.loaded().is_empty());
}
