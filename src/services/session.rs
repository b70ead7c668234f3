use std::path::{Path, PathBuf};

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::spotify_rs::types::SpotifyTokenResponse;

/// Refresh a little before Spotify would reject the token
const EXPIRY_LEEWAY_SECS: i64 = 60;

/// The user's Spotify credentials, held client-side only.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SpotifySession {
    pub access_token: String,
    pub refresh_token: Option<String>,
    pub expires_in_seconds: u64,
    pub obtained_at: DateTime<Utc>,
}

impl SpotifySession {
    pub fn from_token_response(token: SpotifyTokenResponse, now: DateTime<Utc>) -> Self {
        Self {
            access_token: token.access_token,
            refresh_token: token.refresh_token,
            expires_in_seconds: token.expires_in,
            obtained_at: now,
        }
    }

    /// Apply a refresh response. Spotify may omit the refresh token, in which
    /// case the old one stays valid.
    pub fn refreshed(self, token: SpotifyTokenResponse, now: DateTime<Utc>) -> Self {
        Self {
            access_token: token.access_token,
            refresh_token: token.refresh_token.or(self.refresh_token),
            expires_in_seconds: token.expires_in,
            obtained_at: now,
        }
    }

    pub fn expires_at(&self) -> DateTime<Utc> {
        let lifetime = i64::try_from(self.expires_in_seconds)
            .unwrap_or(i64::MAX)
            .min(i64::MAX / 1000);
        self.obtained_at
            .checked_add_signed(Duration::seconds(lifetime))
            .unwrap_or(DateTime::<Utc>::MAX_UTC)
    }

    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now + Duration::seconds(EXPIRY_LEEWAY_SECS) >= self.expires_at()
    }
}

#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error("Failed to access session file {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Session file {path} is corrupt: {source}")]
    Corrupt {
        path: PathBuf,
        source: serde_json::Error,
    },
    #[error("Failed to serialize session: {0}")]
    Serialize(serde_json::Error),
}

/// Single-slot session storage. Saving overwrites, clearing deletes.
#[derive(Debug, Clone)]
pub struct SessionStore {
    path: PathBuf,
}

impl SessionStore {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn load(&self) -> Result<Option<SpotifySession>, SessionError> {
        let contents = match std::fs::read_to_string(&self.path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(source) => {
                return Err(SessionError::Io {
                    path: self.path.clone(),
                    source,
                });
            }
        };

        serde_json::from_str(&contents)
            .map(Some)
            .map_err(|source| SessionError::Corrupt {
                path: self.path.clone(),
                source,
            })
    }

    pub fn save(&self, session: &SpotifySession) -> Result<(), SessionError> {
        let io_error = |source| SessionError::Io {
            path: self.path.clone(),
            source,
        };

        let contents = serde_json::to_string_pretty(session).map_err(SessionError::Serialize)?;
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent).map_err(io_error)?;
        }
        std::fs::write(&self.path, contents).map_err(io_error)?;
        log::debug!("Saved spotify session to {}", self.path.display());
        Ok(())
    }

    pub fn clear(&self) -> Result<(), SessionError> {
        match std::fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(source) => Err(SessionError::Io {
                path: self.path.clone(),
                source,
            }),
        }
    }
}
