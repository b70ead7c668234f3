use color_eyre::eyre::Result;

/// Decoupled representation of a Spotify track from the search API.
#[derive(Debug, Clone)]
pub struct SpotifyApiTrack {
    pub id: String,
    pub name: String,
    pub uri: String,
    pub artists: Vec<String>,
    pub album_name: String,
    pub album_art_url: Option<String>,
}

/// Decoupled representation of a freshly created Spotify playlist.
#[derive(Debug, Clone)]
pub struct SpotifyApiPlaylist {
    pub id: String,
    pub url: String,
}

/// Port trait wrapping the Spotify API capabilities used by business logic.
///
/// Implementations live in `services::spotify::client` (production) or test mocks.
#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait SpotifyClient: Send + Sync {
    /// Top track for a free-text query, `None` when nothing matched.
    async fn search_track(&self, query: &str) -> Result<Option<SpotifyApiTrack>>;
    async fn current_user_id(&self) -> Result<String>;
    async fn create_playlist(
        &self,
        user_id: &str,
        name: &str,
        description: &str,
    ) -> Result<SpotifyApiPlaylist>;
    async fn add_tracks(&self, playlist_id: &str, uris: &[String]) -> Result<()>;
}
