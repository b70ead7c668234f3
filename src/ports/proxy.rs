use crate::models::GenerationResponse;
use crate::spotify_rs::types::SpotifyTokenResponse;

#[derive(Debug, thiserror::Error)]
pub enum ProxyClientError {
    #[error("Failed to reach proxy: {0}")]
    Transport(String),
    #[error("Proxy rejected the request ({status}): {message}")]
    Rejected { status: u16, message: String },
    #[error("Failed to parse proxy response: {0}")]
    InvalidResponse(String),
}

/// Port trait over the two tunesmith proxies, as seen from the client.
#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait PlaylistProxy: Send + Sync {
    async fn generate_playlist(&self, prompt: &str)
    -> Result<GenerationResponse, ProxyClientError>;

    async fn exchange_code(
        &self,
        code: &str,
        redirect_uri: &str,
    ) -> Result<SpotifyTokenResponse, ProxyClientError>;

    async fn refresh_token(
        &self,
        refresh_token: &str,
    ) -> Result<SpotifyTokenResponse, ProxyClientError>;
}
