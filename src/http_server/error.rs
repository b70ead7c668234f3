use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;

use crate::models::Refusal;
use crate::ports::llm::LlmError;
use crate::spotify_rs::auth::{ExchangeCodeForTokenError, RefreshTokenError};

/// Failures of the token exchange proxy, each with a fixed JSON body.
#[derive(Debug, thiserror::Error)]
pub enum AuthProxyError {
    #[error("Authorization code is required")]
    MissingCode,
    #[error("Refresh token is required")]
    MissingRefreshToken,
    #[error("Redirect URI is required")]
    MissingRedirectUri,
    #[error("Spotify credentials not configured")]
    CredentialsNotConfigured,
    #[error("Failed to exchange authorization code")]
    ExchangeFailed { details: String },
    #[error("Failed to refresh access token")]
    RefreshFailed { details: String },
    #[error("Internal server error")]
    Internal { details: String },
}

#[derive(Debug, Serialize)]
struct AuthErrorBody {
    error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    details: Option<String>,
}

impl AuthProxyError {
    fn status(&self) -> StatusCode {
        match self {
            AuthProxyError::MissingCode
            | AuthProxyError::MissingRefreshToken
            | AuthProxyError::MissingRedirectUri
            | AuthProxyError::ExchangeFailed { .. }
            | AuthProxyError::RefreshFailed { .. } => StatusCode::BAD_REQUEST,
            AuthProxyError::CredentialsNotConfigured | AuthProxyError::Internal { .. } => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    fn details(&self) -> Option<String> {
        match self {
            AuthProxyError::ExchangeFailed { details }
            | AuthProxyError::RefreshFailed { details }
            | AuthProxyError::Internal { details } => Some(details.clone()),
            _ => None,
        }
    }
}

impl IntoResponse for AuthProxyError {
    fn into_response(self) -> Response {
        let status = self.status();
        let details = self.details();

        match &details {
            Some(details) => log::error!("{}: {}", self, details),
            None if status.is_server_error() => log::error!("{}", self),
            None => log::debug!("{}", self),
        }

        let body = AuthErrorBody {
            error: self.to_string(),
            details,
        };
        (status, Json(body)).into_response()
    }
}

impl From<ExchangeCodeForTokenError> for AuthProxyError {
    fn from(err: ExchangeCodeForTokenError) -> Self {
        match err {
            ExchangeCodeForTokenError::InvalidCode { reason } => {
                AuthProxyError::ExchangeFailed { details: reason }
            }
            other => AuthProxyError::Internal {
                details: other.to_string(),
            },
        }
    }
}

impl From<RefreshTokenError> for AuthProxyError {
    fn from(err: RefreshTokenError) -> Self {
        match err {
            RefreshTokenError::InvalidRefreshToken { reason } => {
                AuthProxyError::RefreshFailed { details: reason }
            }
            other => AuthProxyError::Internal {
                details: other.to_string(),
            },
        }
    }
}

/// The generation proxy only fails when the model provider is unreachable.
#[derive(Debug, thiserror::Error)]
pub enum GenerationProxyError {
    #[error("Proxy error")]
    Upstream(#[from] LlmError),
}

impl IntoResponse for GenerationProxyError {
    fn into_response(self) -> Response {
        let GenerationProxyError::Upstream(ref source) = self;
        log::error!("Proxy error details: {}", source);

        (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(Refusal::with_message(self.to_string())),
        )
            .into_response()
    }
}
