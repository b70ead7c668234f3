use std::time::Duration;

use color_eyre::eyre::{Result, WrapErr};

use crate::ports::spotify::{SpotifyApiPlaylist, SpotifyApiTrack, SpotifyClient};
use crate::spotify_rs::client::SpotifyClient as SpotifyRsClient;

const SPOTIFY_PLAYLIST_URL: &str = "https://open.spotify.com/playlist";

#[derive(Debug, Clone)]
pub struct SpotifyApiCredentials {
    client_id: String,
    client_secret: String,
}

impl SpotifyApiCredentials {
    pub fn new(client_id: String, client_secret: String) -> Self {
        Self {
            client_id,
            client_secret,
        }
    }

    /// Both values must be present and non-empty for the proxy to exchange codes.
    pub fn from_parts(client_id: Option<String>, client_secret: Option<String>) -> Option<Self> {
        match (client_id, client_secret) {
            (Some(id), Some(secret)) if !id.is_empty() && !secret.is_empty() => {
                Some(Self::new(id, secret))
            }
            _ => None,
        }
    }

    pub fn client_secret(&self) -> &str {
        &self.client_secret
    }

    pub fn client_id(&self) -> &str {
        &self.client_id
    }
}

/// Web URL for a playlist id, used when the API omits `external_urls`.
pub fn playlist_web_url(playlist_id: &str) -> String {
    format!("{}/{}", SPOTIFY_PLAYLIST_URL, playlist_id)
}

/// Production adapter from the raw Web API client to the `SpotifyClient` port.
pub struct SpotifyApiAdapter {
    client: SpotifyRsClient,
}

impl SpotifyApiAdapter {
    pub fn new(access_token: String, timeout: Duration) -> Self {
        Self {
            client: SpotifyRsClient::new(access_token, timeout),
        }
    }

    #[cfg(test)]
    pub fn with_client(client: SpotifyRsClient) -> Self {
        Self { client }
    }
}

#[async_trait::async_trait]
impl SpotifyClient for SpotifyApiAdapter {
    async fn search_track(&self, query: &str) -> Result<Option<SpotifyApiTrack>> {
        let tracks = self
            .client
            .search_tracks(query, 1)
            .await
            .wrap_err_with(|| format!("Failed to search spotify for `{}`", query))?;

        Ok(tracks.into_iter().next().map(|track| SpotifyApiTrack {
            id: track.id,
            name: track.name,
            uri: track.uri,
            artists: track.artists.into_iter().map(|a| a.name).collect(),
            album_name: track.album.name,
            album_art_url: track.album.images.into_iter().next().map(|i| i.url),
        }))
    }

    async fn current_user_id(&self) -> Result<String> {
        let user = self
            .client
            .get_current_user()
            .await
            .wrap_err("Failed to get current spotify user")?;
        Ok(user.id)
    }

    async fn create_playlist(
        &self,
        user_id: &str,
        name: &str,
        description: &str,
    ) -> Result<SpotifyApiPlaylist> {
        let playlist = self
            .client
            .create_playlist(user_id, name, description, false)
            .await
            .wrap_err("Failed to create spotify playlist")?;

        let url = playlist
            .external_urls
            .spotify
            .unwrap_or_else(|| playlist_web_url(&playlist.id));
        Ok(SpotifyApiPlaylist {
            id: playlist.id,
            url,
        })
    }

    async fn add_tracks(&self, playlist_id: &str, uris: &[String]) -> Result<()> {
        let snapshot_id = self
            .client
            .add_tracks_to_playlist(playlist_id, uris)
            .await
            .wrap_err("Failed to add tracks to spotify playlist")?;
        tracing::debug!(
            "Added {} tracks to playlist {}, snapshot {}",
            uris.len(),
            playlist_id,
            snapshot_id
        );
        Ok(())
    }
}
