use std::sync::Arc;

use axum::{
    Json,
    extract::{State, rejection::JsonRejection},
};
use serde::{Deserialize, Serialize};
use tracing::instrument;

use crate::http_server::error::AuthProxyError;
use crate::http_server::state::AuthProxyState;
use crate::services::spotify::client::SpotifyApiCredentials;
use crate::spotify_rs::types::SpotifyTokenResponse;

#[derive(Debug, Default, Deserialize)]
pub struct TokenExchangeRequest {
    #[serde(default)]
    pub code: Option<String>,
    #[serde(default)]
    pub redirect_uri: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct TokenRefreshRequest {
    #[serde(default)]
    pub refresh_token: Option<String>,
}

/// Token fields passed through from Spotify unchanged
#[derive(Debug, Serialize, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub refresh_token: Option<String>,
    pub expires_in: u64,
}

impl From<SpotifyTokenResponse> for TokenResponse {
    fn from(token: SpotifyTokenResponse) -> Self {
        Self {
            access_token: token.access_token,
            refresh_token: token.refresh_token,
            expires_in: token.expires_in,
        }
    }
}

/// A body that isn't JSON is treated like an empty one.
fn body_or_default<T: Default>(body: Result<Json<T>, JsonRejection>) -> T {
    match body {
        Ok(Json(body)) => body,
        Err(rejection) => {
            log::debug!("Unreadable auth request body: {}", rejection);
            T::default()
        }
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

fn credentials(state: &AuthProxyState) -> Result<&SpotifyApiCredentials, AuthProxyError> {
    state.spotify_credentials.as_ref().ok_or_else(|| {
        log::error!("Missing Spotify credentials");
        AuthProxyError::CredentialsNotConfigured
    })
}

/// POST / and POST /auth/spotify - exchange an authorization code for tokens
#[instrument(skip_all)]
pub async fn exchange_token(
    State(state): State<Arc<AuthProxyState>>,
    body: Result<Json<TokenExchangeRequest>, JsonRejection>,
) -> Result<Json<TokenResponse>, AuthProxyError> {
    let request = body_or_default(body);
    tracing::info!("Received auth request");

    let code = non_empty(request.code).ok_or(AuthProxyError::MissingCode)?;
    let credentials = credentials(&state)?;
    let redirect_uri = non_empty(request.redirect_uri)
        .or_else(|| state.default_redirect_uri.clone())
        .ok_or(AuthProxyError::MissingRedirectUri)?;

    tracing::info!("Exchanging code for token with Spotify");
    let token = state
        .accounts
        .exchange_code(credentials, &code, &redirect_uri)
        .await?;
    tracing::info!("Token exchange successful");

    Ok(Json(token.into()))
}

/// POST /auth/spotify/refresh - trade a refresh token for a new access token
#[instrument(skip_all)]
pub async fn refresh_token(
    State(state): State<Arc<AuthProxyState>>,
    body: Result<Json<TokenRefreshRequest>, JsonRejection>,
) -> Result<Json<TokenResponse>, AuthProxyError> {
    let request = body_or_default(body);

    let refresh_token =
        non_empty(request.refresh_token).ok_or(AuthProxyError::MissingRefreshToken)?;
    let credentials = credentials(&state)?;

    let token = state
        .accounts
        .refresh_token(credentials, &refresh_token)
        .await?;
    tracing::info!("Token refresh successful");

    Ok(Json(token.into()))
}
