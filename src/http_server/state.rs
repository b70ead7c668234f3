use std::sync::Arc;

use crate::ports::accounts::SpotifyAccounts;
use crate::services::playlist_generation::PlaylistGenerator;
use crate::services::spotify::client::SpotifyApiCredentials;

/// State for the token exchange proxy
pub struct AuthProxyState {
    pub accounts: Arc<dyn SpotifyAccounts>,
    /// `None` when the client id or secret is not configured
    pub spotify_credentials: Option<SpotifyApiCredentials>,
    /// Used when a request doesn't carry its own `redirect_uri`
    pub default_redirect_uri: Option<String>,
}

/// State for the playlist generation proxy
pub struct GenerationProxyState {
    pub generator: PlaylistGenerator,
}
