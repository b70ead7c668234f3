use std::time::Duration;

use crate::ports::accounts::SpotifyAccounts;
use crate::services::spotify::client::SpotifyApiCredentials;
use crate::spotify_rs::auth::{
    ExchangeCodeForTokenError, RefreshTokenError, SPOTIFY_TOKEN_URL, exchange_code_for_token,
    refresh_access_token,
};
use crate::spotify_rs::types::SpotifyTokenResponse;

/// Talks to the Spotify accounts service on behalf of the token exchange proxy.
pub struct SpotifyAccountService {
    client: reqwest::Client,
    token_url: String,
    timeout: Duration,
}

impl SpotifyAccountService {
    pub fn new(timeout: Duration) -> Self {
        Self::with_token_url(SPOTIFY_TOKEN_URL.to_string(), timeout)
    }

    pub fn with_token_url(token_url: String, timeout: Duration) -> Self {
        Self {
            client: reqwest::Client::new(),
            token_url,
            timeout,
        }
    }
}

#[async_trait::async_trait]
impl SpotifyAccounts for SpotifyAccountService {
    #[tracing::instrument(skip_all)]
    async fn exchange_code(
        &self,
        credentials: &SpotifyApiCredentials,
        code: &str,
        redirect_uri: &str,
    ) -> Result<SpotifyTokenResponse, ExchangeCodeForTokenError> {
        exchange_code_for_token(
            &self.client,
            &self.token_url,
            credentials.client_id(),
            credentials.client_secret(),
            code,
            redirect_uri,
            self.timeout,
        )
        .await
    }

    #[tracing::instrument(skip_all)]
    async fn refresh_token(
        &self,
        credentials: &SpotifyApiCredentials,
        refresh_token: &str,
    ) -> Result<SpotifyTokenResponse, RefreshTokenError> {
        refresh_access_token(
            &self.client,
            &self.token_url,
            credentials.client_id(),
            credentials.client_secret(),
            refresh_token,
            self.timeout,
        )
        .await
    }
}

#[cfg(test)]
mod tests {
    use axum::http::{Method, StatusCode};
    use serde_json::json;

    use super::*;
    use crate::test_utils::StubServer;

    fn credentials() -> SpotifyApiCredentials {
        SpotifyApiCredentials::new("id".into(), "secret".into())
    }

    fn service(server: &StubServer) -> SpotifyAccountService {
        SpotifyAccountService::with_token_url(
            format!("{}/api/token", server.url),
            Duration::from_secs(5),
        )
    }

    #[tokio::test]
    async fn test_exchange_code_posts_form_with_basic_auth() {
        let server = StubServer::start(|_| {
            (
                StatusCode::OK,
                json!({
                    "access_token": "access",
                    "token_type": "Bearer",
                    "expires_in": 3600,
                    "refresh_token": "refresh",
                    "scope": "playlist-modify-private"
                }),
            )
        })
        .await;

        let token = service(&server)
            .exchange_code(&credentials(), "AQBcode", "http://127.0.0.1:8888/callback")
            .await
            .unwrap();
        assert_eq!(token.access_token, "access");
        assert_eq!(token.expires_in, 3600);
        assert_eq!(token.refresh_token.as_deref(), Some("refresh"));

        let request = server.only_request();
        assert_eq!(request.method, Method::POST);
        assert_eq!(request.path, "/api/token");
        assert_eq!(
            request.header("content-type"),
            Some("application/x-www-form-urlencoded")
        );
        assert_eq!(request.header("authorization"), Some("Basic aWQ6c2VjcmV0"));

        let form = request.form();
        assert_eq!(form.len(), 3);
        assert_eq!(form["grant_type"], "authorization_code");
        assert_eq!(form["code"], "AQBcode");
        assert_eq!(form["redirect_uri"], "http://127.0.0.1:8888/callback");
    }

    #[tokio::test]
    async fn test_exchange_code_rejected_keeps_upstream_body() {
        let server = StubServer::start(|_| {
            (
                StatusCode::BAD_REQUEST,
                json!({"error": "invalid_grant", "error_description": "Invalid authorization code"}),
            )
        })
        .await;

        let err = service(&server)
            .exchange_code(&credentials(), "expired", "http://127.0.0.1:8888/callback")
            .await
            .unwrap_err();
        match err {
            ExchangeCodeForTokenError::InvalidCode { reason } => {
                assert!(reason.contains("invalid_grant"));
            }
            other => panic!("unexpected error: {}", other),
        }
    }

    #[tokio::test]
    async fn test_refresh_token_posts_refresh_grant() {
        let server = StubServer::start(|_| {
            (
                StatusCode::OK,
                json!({"access_token": "fresh", "token_type": "Bearer", "expires_in": 3600}),
            )
        })
        .await;

        let token = service(&server)
            .refresh_token(&credentials(), "refresh")
            .await
            .unwrap();
        assert_eq!(token.access_token, "fresh");
        assert!(token.refresh_token.is_none());

        let request = server.only_request();
        assert_eq!(request.header("authorization"), Some("Basic aWQ6c2VjcmV0"));
        let form = request.form();
        assert_eq!(form.len(), 2);
        assert_eq!(form["grant_type"], "refresh_token");
        assert_eq!(form["refresh_token"], "refresh");
    }

    #[tokio::test]
    async fn test_refresh_token_rejected() {
        let server = StubServer::start(|_| {
            (StatusCode::BAD_REQUEST, json!({"error": "invalid_grant"}))
        })
        .await;

        let err = service(&server)
            .refresh_token(&credentials(), "revoked")
            .await
            .unwrap_err();
        assert!(matches!(err, RefreshTokenError::InvalidRefreshToken { .. }));
    }
}
