use url::Url;

use crate::spotify_rs::auth::initiate_oauth;

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum RedirectError {
    #[error("Not a valid redirect URL: {0}")]
    InvalidUrl(String),
    #[error("Spotify authorization failed: {0}")]
    Denied(String),
    #[error("State mismatch, the redirect does not belong to this login")]
    StateMismatch,
    #[error("Redirect URL has no authorization code")]
    MissingCode,
}

/// One pending authorization: the URL to open and the CSRF state to expect back.
#[derive(Debug, Clone)]
pub struct PendingLogin {
    pub auth_url: String,
    pub redirect_uri: String,
    state: String,
}

impl PendingLogin {
    pub fn new(client_id: &str, redirect_uri: &str) -> Self {
        let response = initiate_oauth(client_id, redirect_uri);
        Self {
            auth_url: response.auth_url,
            redirect_uri: redirect_uri.to_string(),
            state: response.state,
        }
    }

    pub fn state(&self) -> &str {
        &self.state
    }

    /// Pull the authorization code out of the URL Spotify redirected to.
    /// An `error` parameter wins over everything else.
    pub fn code_from_redirect(&self, redirect: &str) -> Result<String, RedirectError> {
        let url = Url::parse(redirect.trim())
            .map_err(|e| RedirectError::InvalidUrl(e.to_string()))?;

        let mut code = None;
        let mut state = None;
        for (key, value) in url.query_pairs() {
            match key.as_ref() {
                "error" => return Err(RedirectError::Denied(value.into_owned())),
                "code" => code = Some(value.into_owned()),
                "state" => state = Some(value.into_owned()),
                _ => {}
            }
        }

        if state.as_deref() != Some(self.state.as_str()) {
            return Err(RedirectError::StateMismatch);
        }

        code.filter(|c| !c.is_empty())
            .ok_or(RedirectError::MissingCode)
    }
}
