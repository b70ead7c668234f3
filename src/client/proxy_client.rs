use std::time::Duration;

use color_eyre::eyre::{Context, Result};
use reqwest::{Client, Response};
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::models::GenerationResponse;
use crate::ports::proxy::{PlaylistProxy, ProxyClientError};
use crate::spotify_rs::types::SpotifyTokenResponse;

#[derive(Debug, Serialize)]
struct GenerateBody<'a> {
    prompt: &'a str,
}

#[derive(Debug, Serialize)]
struct ExchangeBody<'a> {
    code: &'a str,
    redirect_uri: &'a str,
}

#[derive(Debug, Serialize)]
struct RefreshBody<'a> {
    refresh_token: &'a str,
}

/// HTTP client for the auth and generation proxies
pub struct HttpPlaylistProxy {
    auth_url: String,
    generate_url: String,
    client: Client,
}

impl HttpPlaylistProxy {
    pub fn new(auth_url: &str, generate_url: &str, timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .wrap_err("Failed to create HTTP client")?;

        Ok(Self {
            auth_url: auth_url.trim_end_matches('/').to_string(),
            generate_url: generate_url.trim_end_matches('/').to_string(),
            client,
        })
    }

    async fn post<B: Serialize, T: DeserializeOwned>(
        &self,
        url: String,
        body: &B,
    ) -> Result<T, ProxyClientError> {
        let response = self
            .client
            .post(&url)
            .json(body)
            .send()
            .await
            .map_err(|e| ProxyClientError::Transport(e.to_string()))?;

        if !response.status().is_success() {
            return Err(rejection(response).await);
        }

        response
            .json::<T>()
            .await
            .map_err(|e| ProxyClientError::InvalidResponse(e.to_string()))
    }
}

async fn rejection(response: Response) -> ProxyClientError {
    let status = response.status().as_u16();
    let body = response.text().await.unwrap_or_default();
    ProxyClientError::Rejected {
        status,
        message: error_message(&body),
    }
}

/// Human readable message out of either proxy's error body.
///
/// The auth proxy sends `{error: "...", details?}`, the generation proxy
/// sends `{error: true, message}`. Anything else is passed through as is.
pub fn error_message(body: &str) -> String {
    let Ok(json) = serde_json::from_str::<Value>(body) else {
        return body.to_string();
    };

    match (&json["error"], &json["message"], &json["details"]) {
        (Value::String(error), _, Value::String(details)) => format!("{}: {}", error, details),
        (Value::String(error), _, _) => error.clone(),
        (_, Value::String(message), _) => message.clone(),
        _ => body.to_string(),
    }
}

#[async_trait::async_trait]
impl PlaylistProxy for HttpPlaylistProxy {
    #[tracing::instrument(skip_all)]
    async fn generate_playlist(
        &self,
        prompt: &str,
    ) -> Result<GenerationResponse, ProxyClientError> {
        self.post(
            format!("{}/api/generate-playlist", self.generate_url),
            &GenerateBody { prompt },
        )
        .await
    }

    #[tracing::instrument(skip_all)]
    async fn exchange_code(
        &self,
        code: &str,
        redirect_uri: &str,
    ) -> Result<SpotifyTokenResponse, ProxyClientError> {
        self.post(
            format!("{}/auth/spotify", self.auth_url),
            &ExchangeBody { code, redirect_uri },
        )
        .await
    }

    #[tracing::instrument(skip_all)]
    async fn refresh_token(
        &self,
        refresh_token: &str,
    ) -> Result<SpotifyTokenResponse, ProxyClientError> {
        self.post(
            format!("{}/auth/spotify/refresh", self.auth_url),
            &RefreshBody { refresh_token },
        )
        .await
    }
}
