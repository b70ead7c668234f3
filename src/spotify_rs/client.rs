use std::time::Duration;

use color_eyre::Result;
use color_eyre::eyre::WrapErr;

use crate::spotify_rs::types::{
    AddTracksRequest, CreatePlaylistRequest, SearchResponse, SnapshotResponse, SpotifyPlaylist,
    SpotifyTrack, SpotifyUser,
};

pub const SPOTIFY_API_URL: &str = "https://api.spotify.com/v1";

/// Spotify Web API client bound to one user's access token
pub struct SpotifyClient {
    access_token: String,
    base_url: String,
    timeout: Duration,
    client: reqwest::Client,
}

impl SpotifyClient {
    pub fn new(access_token: String, timeout: Duration) -> Self {
        Self::with_base_url(access_token, SPOTIFY_API_URL.to_string(), timeout)
    }

    pub fn with_base_url(access_token: String, base_url: String, timeout: Duration) -> Self {
        Self {
            access_token,
            base_url: base_url.trim_end_matches('/').to_string(),
            timeout,
            client: reqwest::Client::new(),
        }
    }

    /// Get the current user's profile
    pub async fn get_current_user(&self) -> Result<SpotifyUser> {
        let response = self
            .client
            .get(format!("{}/me", self.base_url))
            .bearer_auth(&self.access_token)
            .timeout(self.timeout)
            .send()
            .await?
            .error_for_status()?;

        let user: SpotifyUser = response.json().await?;
        Ok(user)
    }

    /// Search tracks, returning at most `limit` results in relevance order
    pub async fn search_tracks(&self, query: &str, limit: u32) -> Result<Vec<SpotifyTrack>> {
        let limit = limit.to_string();
        let response = self
            .client
            .get(format!("{}/search", self.base_url))
            .query(&[("q", query), ("type", "track"), ("limit", limit.as_str())])
            .bearer_auth(&self.access_token)
            .timeout(self.timeout)
            .send()
            .await?
            .error_for_status()?;

        let page: SearchResponse = response
            .json()
            .await
            .wrap_err("Failed to parse search response")?;
        Ok(page.tracks.items)
    }

    /// Create a playlist owned by `user_id`
    pub async fn create_playlist(
        &self,
        user_id: &str,
        name: &str,
        description: &str,
        public: bool,
    ) -> Result<SpotifyPlaylist> {
        let response = self
            .client
            .post(format!(
                "{}/users/{}/playlists",
                self.base_url,
                urlencoding::encode(user_id)
            ))
            .bearer_auth(&self.access_token)
            .json(&CreatePlaylistRequest {
                name,
                description,
                public,
            })
            .timeout(self.timeout)
            .send()
            .await?
            .error_for_status()?;

        let playlist: SpotifyPlaylist = response
            .json()
            .await
            .wrap_err("Failed to parse created playlist")?;
        Ok(playlist)
    }

    /// Append tracks to a playlist. Spotify accepts at most 100 URIs per call.
    pub async fn add_tracks_to_playlist(&self, playlist_id: &str, uris: &[String]) -> Result<String> {
        let response = self
            .client
            .post(format!("{}/playlists/{}/tracks", self.base_url, playlist_id))
            .bearer_auth(&self.access_token)
            .json(&AddTracksRequest { uris })
            .timeout(self.timeout)
            .send()
            .await?
            .error_for_status()?;

        let snapshot: SnapshotResponse = response.json().await?;
        Ok(snapshot.snapshot_id)
    }
}

#[cfg(test)]
mod tests {
    use axum::http::{Method, StatusCode};
    use serde_json::json;

    use super::*;
    use crate::test_utils::StubServer;

    fn client(server: &StubServer) -> SpotifyClient {
        SpotifyClient::with_base_url(
            "token".into(),
            format!("{}/", server.url),
            Duration::from_secs(5),
        )
    }

    fn track_json() -> serde_json::Value {
        json!({
            "id": "2KH16WveTQWT6KOG9Rg6e2",
            "name": "Eye of the Tiger",
            "uri": "spotify:track:2KH16WveTQWT6KOG9Rg6e2",
            "duration_ms": 245000,
            "artists": [{"id": "26bcq2nyj5GB7uRr3", "name": "Survivor"}],
            "album": {
                "id": "4PNrz3Bk0ys3gE",
                "name": "Eye of the Tiger",
                "images": [{"url": "https://i.scdn.co/image/large", "width": 640, "height": 640}]
            }
        })
    }

    #[tokio::test]
    async fn test_search_tracks_sends_track_query() {
        let server = StubServer::start(|_| {
            (StatusCode::OK, json!({"tracks": {"items": [track_json()], "total": 1}}))
        })
        .await;

        let tracks = client(&server)
            .search_tracks("Eye of the Tiger by Survivor", 1)
            .await
            .unwrap();
        assert_eq!(tracks.len(), 1);
        assert_eq!(tracks[0].uri, "spotify:track:2KH16WveTQWT6KOG9Rg6e2");
        assert_eq!(tracks[0].artists[0].name, "Survivor");
        assert_eq!(tracks[0].album.images[0].url, "https://i.scdn.co/image/large");

        let request = server.only_request();
        assert_eq!(request.method, Method::GET);
        assert_eq!(request.path, "/search");
        assert_eq!(request.header("authorization"), Some("Bearer token"));
        let query = request.query_pairs();
        assert_eq!(query.len(), 3);
        assert_eq!(query["q"], "Eye of the Tiger by Survivor");
        assert_eq!(query["type"], "track");
        assert_eq!(query["limit"], "1");
    }

    #[tokio::test]
    async fn test_create_playlist_sends_private_playlist_body() {
        let server = StubServer::start(|_| {
            (
                StatusCode::CREATED,
                json!({
                    "id": "3cEYpjA9oz9GiPac4AsH4n",
                    "name": "Morning Run",
                    "snapshot_id": "MSw",
                    "external_urls": {"spotify": "https://open.spotify.com/playlist/3cEYpjA9oz9GiPac4AsH4n"}
                }),
            )
        })
        .await;

        let playlist = client(&server)
            .create_playlist("wizzler", "Morning Run", "Fast songs", false)
            .await
            .unwrap();
        assert_eq!(playlist.id, "3cEYpjA9oz9GiPac4AsH4n");
        assert_eq!(
            playlist.external_urls.spotify.as_deref(),
            Some("https://open.spotify.com/playlist/3cEYpjA9oz9GiPac4AsH4n")
        );

        let request = server.only_request();
        assert_eq!(request.method, Method::POST);
        assert_eq!(request.path, "/users/wizzler/playlists");
        assert_eq!(request.header("authorization"), Some("Bearer token"));
        assert_eq!(
            request.json(),
            json!({"name": "Morning Run", "description": "Fast songs", "public": false})
        );
    }

    #[tokio::test]
    async fn test_add_tracks_sends_uris_and_returns_snapshot() {
        let server =
            StubServer::start(|_| (StatusCode::CREATED, json!({"snapshot_id": "MiwxNjE"}))).await;

        let uris = vec![
            "spotify:track:2KH16WveTQWT6KOG9Rg6e2".to_string(),
            "spotify:track:4uLU6hMCjMI75M1A2tKUQC".to_string(),
        ];
        let snapshot = client(&server)
            .add_tracks_to_playlist("3cEYpjA9oz9GiPac4AsH4n", &uris)
            .await
            .unwrap();
        assert_eq!(snapshot, "MiwxNjE");

        let request = server.only_request();
        assert_eq!(request.method, Method::POST);
        assert_eq!(request.path, "/playlists/3cEYpjA9oz9GiPac4AsH4n/tracks");
        assert_eq!(request.json(), json!({"uris": uris}));
    }

    #[tokio::test]
    async fn test_get_current_user() {
        let server = StubServer::start(|_| {
            (StatusCode::OK, json!({"id": "wizzler", "display_name": "Wizzler"}))
        })
        .await;

        let user = client(&server).get_current_user().await.unwrap();
        assert_eq!(user.id, "wizzler");
        assert_eq!(server.only_request().path, "/me");
    }

    #[tokio::test]
    async fn test_error_status_is_an_error() {
        let server = StubServer::start(|_| {
            (
                StatusCode::UNAUTHORIZED,
                json!({"error": {"status": 401, "message": "The access token expired"}}),
            )
        })
        .await;

        assert!(client(&server).get_current_user().await.is_err());
        assert!(client(&server).search_tracks("anything", 1).await.is_err());
    }
}
