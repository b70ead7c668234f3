use crate::services::spotify::client::SpotifyApiCredentials;
use crate::spotify_rs::auth::{ExchangeCodeForTokenError, RefreshTokenError};
use crate::spotify_rs::types::SpotifyTokenResponse;

/// Port trait over the Spotify accounts service (token endpoint).
#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait SpotifyAccounts: Send + Sync {
    async fn exchange_code(
        &self,
        credentials: &SpotifyApiCredentials,
        code: &str,
        redirect_uri: &str,
    ) -> Result<SpotifyTokenResponse, ExchangeCodeForTokenError>;

    async fn refresh_token(
        &self,
        credentials: &SpotifyApiCredentials,
        refresh_token: &str,
    ) -> Result<SpotifyTokenResponse, RefreshTokenError>;
}
