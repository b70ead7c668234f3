use color_eyre::eyre::{Result, WrapErr};
use tracing::instrument;

use crate::models::{PlaylistConcept, ResolvedTrack, SavedPlaylist};
use crate::ports::spotify::SpotifyClient;

/// Spotify's limit on URIs per add-tracks call
pub const MAX_TRACKS_PER_REQUEST: usize = 100;

/// URIs of the tracks that were actually found, in playlist order.
pub fn playable_uris(tracks: &[ResolvedTrack]) -> Vec<String> {
    tracks
        .iter()
        .filter(|track| track.is_found())
        .map(|track| track.uri.clone())
        .collect()
}

/// Create a private playlist for the current user and attach the found tracks.
///
/// Creation failing is an error. Attaching tracks failing is not: the playlist
/// already exists, so the failure is logged and reported on the result.
#[instrument(skip_all, fields(title = %concept.title))]
pub async fn save_playlist(
    spotify: &dyn SpotifyClient,
    concept: &PlaylistConcept,
    tracks: &[ResolvedTrack],
) -> Result<SavedPlaylist> {
    let user_id = spotify
        .current_user_id()
        .await
        .wrap_err("Failed to fetch spotify profile")?;

    let playlist = spotify
        .create_playlist(&user_id, &concept.title, &concept.description)
        .await
        .wrap_err("Failed to create playlist")?;
    tracing::info!("Created playlist {} for user {}", playlist.id, user_id);

    let uris = playable_uris(tracks);
    let mut tracks_added = 0;
    let mut track_error = None;

    for chunk in uris.chunks(MAX_TRACKS_PER_REQUEST) {
        match spotify.add_tracks(&playlist.id, chunk).await {
            Ok(()) => tracks_added += chunk.len(),
            Err(e) => {
                tracing::error!(
                    "Failed to add tracks to playlist {}: {:#}",
                    playlist.id,
                    e
                );
                track_error = Some(format!("{:#}", e));
                break;
            }
        }
    }

    Ok(SavedPlaylist {
        playlist_id: playlist.id,
        playlist_url: playlist.url,
        tracks_added,
        track_error,
    })
}
