use std::collections::HashMap;
use std::time::Duration;

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use rand::Rng;

use crate::spotify_rs::types::{SpotifyAuthResponse, SpotifyTokenResponse};

pub const SPOTIFY_AUTH_URL: &str = "https://accounts.spotify.com/authorize";
pub const SPOTIFY_TOKEN_URL: &str = "https://accounts.spotify.com/api/token";

pub const SPOTIFY_SCOPES: [&str; 3] = [
    "playlist-modify-public",
    "playlist-modify-private",
    "user-read-private",
];

/// Generate a random string from the URL-safe unreserved charset
fn generate_random_string(length: usize) -> String {
    let mut rng = rand::rng();
    (0..length)
        .map(|_| {
            const CHARSET: &[u8] =
                b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789-._~";
            CHARSET[rng.random_range(0..CHARSET.len())] as char
        })
        .collect()
}

/// Generate a random state parameter for CSRF protection
fn generate_state() -> String {
    generate_random_string(16)
}

/// `Authorization` header value for the confidential client
pub fn basic_auth_header(client_id: &str, client_secret: &str) -> String {
    format!(
        "Basic {}",
        STANDARD.encode(format!("{}:{}", client_id, client_secret))
    )
}

/// Build the authorization-code URL the user has to open, along with the
/// state that must come back on the redirect.
pub fn initiate_oauth(client_id: &str, redirect_uri: &str) -> SpotifyAuthResponse {
    let state = generate_state();
    let scope = SPOTIFY_SCOPES.join(" ");

    let auth_url = format!(
        "{}?client_id={}&response_type=code&redirect_uri={}&state={}&scope={}",
        SPOTIFY_AUTH_URL,
        urlencoding::encode(client_id),
        urlencoding::encode(redirect_uri),
        urlencoding::encode(&state),
        urlencoding::encode(&scope)
    );

    SpotifyAuthResponse { auth_url, state }
}

#[derive(Debug, thiserror::Error)]
pub enum ExchangeCodeForTokenError {
    #[error("Invalid code: {reason}")]
    InvalidCode { reason: String },
    #[error("Failed to send http request: {0}")]
    FailedToSendRequest(reqwest::Error),
    #[error("Failed to parse response: {0}")]
    FailedToParseResponse(reqwest::Error),
}

/// Exchange authorization code for access token
/// https://developer.spotify.com/documentation/web-api/tutorials/code-flow
pub async fn exchange_code_for_token(
    client: &reqwest::Client,
    token_url: &str,
    client_id: &str,
    client_secret: &str,
    code: &str,
    // Must match the redirect URI used to build the authorize URL
    redirect_uri: &str,
    timeout: Duration,
) -> Result<SpotifyTokenResponse, ExchangeCodeForTokenError> {
    let mut params = HashMap::new();
    params.insert("grant_type", "authorization_code");
    params.insert("code", code);
    params.insert("redirect_uri", redirect_uri);

    let response = client
        .post(token_url)
        // Serializes to x-www-form-urlencoded and sets the header (as required by spotify)
        .form(&params)
        .header("Authorization", basic_auth_header(client_id, client_secret))
        .timeout(timeout)
        .send()
        .await
        .map_err(ExchangeCodeForTokenError::FailedToSendRequest)?;

    if !response.status().is_success() {
        return Err(ExchangeCodeForTokenError::InvalidCode {
            reason: response
                .text()
                .await
                .unwrap_or("Failed to get error text".to_string()),
        });
    }

    let token_response: SpotifyTokenResponse = response
        .json()
        .await
        .map_err(ExchangeCodeForTokenError::FailedToParseResponse)?;

    Ok(token_response)
}

#[derive(Debug, thiserror::Error)]
pub enum RefreshTokenError {
    #[error("Invalid refresh token: {reason}")]
    InvalidRefreshToken { reason: String },
    #[error("Failed to send http request: {0}")]
    FailedToSendRequest(reqwest::Error),
    #[error("Failed to parse response: {0}")]
    FailedToParseResponse(reqwest::Error),
}

/// Refresh an access token using a refresh token
pub async fn refresh_access_token(
    client: &reqwest::Client,
    token_url: &str,
    client_id: &str,
    client_secret: &str,
    refresh_token: &str,
    timeout: Duration,
) -> Result<SpotifyTokenResponse, RefreshTokenError> {
    let mut params = HashMap::new();
    params.insert("grant_type", "refresh_token");
    params.insert("refresh_token", refresh_token);

    let response = client
        .post(token_url)
        .form(&params)
        .header("Authorization", basic_auth_header(client_id, client_secret))
        .timeout(timeout)
        .send()
        .await
        .map_err(RefreshTokenError::FailedToSendRequest)?;

    if !response.status().is_success() {
        return Err(RefreshTokenError::InvalidRefreshToken {
            reason: response
                .text()
                .await
                .unwrap_or("Failed to get error text".to_string()),
        });
    }

    let token_response: SpotifyTokenResponse = response
        .json()
        .await
        .map_err(RefreshTokenError::FailedToParseResponse)?;

    Ok(token_response)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generate_state() {
        let state = generate_state();
        assert_eq!(state.len(), 16);
        assert!(state.chars().all(|c| c.is_ascii_alphanumeric()
            || c == '-'
            || c == '.'
            || c == '_'
            || c == '~'));
    }

    #[test]
    fn test_basic_auth_header() {
        // base64("id:secret")
        assert_eq!(basic_auth_header("id", "secret"), "Basic aWQ6c2VjcmV0");
    }

    #[test]
    fn test_basic_auth_header_keeps_padding() {
        // base64("ab:c") needs padding
        assert_eq!(basic_auth_header("a", "b"), "Basic YTpi");
        assert_eq!(basic_auth_header("ab", "c"), "Basic YWI6Yw==");
    }

    #[test]
    fn test_initiate_oauth() {
        let client_id = "test_client_id";
        let redirect_uri = "http://localhost:3000/callback";
        let response = initiate_oauth(client_id, redirect_uri);

        assert!(response.auth_url.starts_with(SPOTIFY_AUTH_URL));
        assert!(response.auth_url.contains(client_id));
        assert!(response.auth_url.contains("response_type=code"));
        assert!(
            response
                .auth_url
                .contains("redirect_uri=http%3A%2F%2Flocalhost%3A3000%2Fcallback")
        );
        assert!(response.auth_url.contains("playlist-modify-private"));
        assert!(response.auth_url.contains(&format!("state={}", response.state)));
    }
}
