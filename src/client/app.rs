use std::sync::Arc;

use chrono::Utc;
use color_eyre::eyre::{Result, WrapErr, bail, eyre};
use tracing::instrument;

use crate::models::{GenerationResponse, PlaylistConcept, ResolvedTrack, SavedPlaylist};
use crate::ports::proxy::PlaylistProxy;
use crate::ports::spotify::SpotifyClient;
use crate::services::playlist_save::save_playlist;
use crate::services::session::{SessionStore, SpotifySession};
use crate::services::track_resolution::TrackResolver;

pub const EMPTY_PROMPT_MESSAGE: &str = "Please enter a description for your playlist.";
pub const GENERATION_FAILED_MESSAGE: &str = "Failed to generate playlist. Please try again.";
pub const SAVE_FAILED_MESSAGE: &str = "Failed to save playlist.";
pub const SESSION_EXPIRED_MESSAGE: &str = "Your Spotify session expired. Please log in again.";

/// Builds a Spotify API client for an access token
pub type SpotifyFactory = Box<dyn Fn(&str) -> Arc<dyn SpotifyClient> + Send + Sync>;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AppPhase {
    Auth,
    Input,
    Generating,
    Result {
        concept: PlaylistConcept,
        tracks: Vec<ResolvedTrack>,
    },
}

/// Client-side orchestration: session, prompt, generation, resolution, save.
pub struct ClientApp {
    proxy: Arc<dyn PlaylistProxy>,
    spotify_factory: SpotifyFactory,
    sessions: SessionStore,
    resolver: TrackResolver,
    phase: AppPhase,
    session: Option<SpotifySession>,
    message: Option<String>,
    saved: Option<SavedPlaylist>,
}

impl ClientApp {
    pub fn new(
        proxy: Arc<dyn PlaylistProxy>,
        spotify_factory: SpotifyFactory,
        sessions: SessionStore,
        resolve_concurrency: usize,
    ) -> Result<Self> {
        Ok(Self {
            proxy,
            spotify_factory,
            sessions,
            resolver: TrackResolver::new(resolve_concurrency)?,
            phase: AppPhase::Auth,
            session: None,
            message: None,
            saved: None,
        })
    }

    pub fn phase(&self) -> &AppPhase {
        &self.phase
    }

    /// Inline message for the user, set by the last operation
    pub fn message(&self) -> Option<&str> {
        self.message.as_deref()
    }

    pub fn saved(&self) -> Option<&SavedPlaylist> {
        self.saved.as_ref()
    }

    pub fn is_authenticated(&self) -> bool {
        self.session.is_some()
    }

    /// Pick up the cached session. Expired sessions are refreshed when
    /// possible and dropped otherwise.
    #[instrument(skip_all)]
    pub async fn restore_session(&mut self) -> Result<()> {
        let session = match self.sessions.load() {
            Ok(Some(session)) => session,
            Ok(None) => {
                self.enter_auth(None);
                return Ok(());
            }
            Err(e) => {
                tracing::warn!("Discarding unreadable session: {}", e);
                self.sessions.clear()?;
                self.enter_auth(None);
                return Ok(());
            }
        };

        match self.fresh(session).await {
            Some(session) => {
                self.session = Some(session);
                self.phase = AppPhase::Input;
            }
            None => self.enter_auth(None),
        }
        Ok(())
    }

    /// Exchange an authorization code through the proxy and cache the session.
    #[instrument(skip_all)]
    pub async fn authenticate(&mut self, code: &str, redirect_uri: &str) -> Result<()> {
        let token = self
            .proxy
            .exchange_code(code, redirect_uri)
            .await
            .wrap_err("Failed to connect to Spotify")?;

        let session = SpotifySession::from_token_response(token, Utc::now());
        self.sessions.save(&session)?;
        self.session = Some(session);
        self.message = None;
        self.phase = AppPhase::Input;
        tracing::info!("Connected to Spotify");
        Ok(())
    }

    /// Generate a concept for `prompt` and resolve its tracks. Refusals and
    /// failures land back in `Input` with a message.
    #[instrument(skip_all)]
    pub async fn submit_prompt(&mut self, prompt: &str) -> Result<()> {
        if self.phase != AppPhase::Input {
            bail!("Not ready for a new prompt");
        }
        if prompt.trim().is_empty() {
            self.message = Some(EMPTY_PROMPT_MESSAGE.to_string());
            return Ok(());
        }

        self.message = None;
        self.saved = None;
        self.phase = AppPhase::Generating;

        let concept = match self.proxy.generate_playlist(prompt).await {
            Ok(GenerationResponse::Concept(concept)) => concept,
            Ok(GenerationResponse::Refusal(refusal)) => {
                self.message = Some(refusal.message);
                self.phase = AppPhase::Input;
                return Ok(());
            }
            Err(e) => {
                tracing::error!("Playlist generation failed: {}", e);
                self.message = Some(GENERATION_FAILED_MESSAGE.to_string());
                self.phase = AppPhase::Input;
                return Ok(());
            }
        };
        tracing::info!("Generated playlist concept `{}`", concept.title);

        let Some(spotify) = self.spotify().await else {
            return Ok(());
        };
        let tracks = self
            .resolver
            .resolve(spotify.as_ref(), &concept.search_queries)
            .await;

        self.phase = AppPhase::Result { concept, tracks };
        Ok(())
    }

    /// Back to `Input`, discarding the current result
    pub fn new_playlist(&mut self) {
        if matches!(self.phase, AppPhase::Result { .. }) {
            self.phase = AppPhase::Input;
        }
        self.message = None;
        self.saved = None;
    }

    /// Persist the current result as a private playlist.
    #[instrument(skip_all)]
    pub async fn save_to_spotify(&mut self) -> Result<SavedPlaylist> {
        let AppPhase::Result { concept, tracks } = self.phase.clone() else {
            bail!("Nothing to save yet");
        };

        let Some(spotify) = self.spotify().await else {
            return Err(eyre!(SESSION_EXPIRED_MESSAGE));
        };

        match save_playlist(spotify.as_ref(), &concept, &tracks).await {
            Ok(saved) => {
                self.message = saved
                    .track_error
                    .as_ref()
                    .map(|_| "Playlist created, but some tracks could not be added.".to_string());
                self.saved = Some(saved.clone());
                Ok(saved)
            }
            Err(e) => {
                tracing::error!("Failed to save playlist: {:#}", e);
                self.message = Some(SAVE_FAILED_MESSAGE.to_string());
                Err(e.wrap_err(SAVE_FAILED_MESSAGE))
            }
        }
    }

    /// Forget the session from any state
    pub fn disconnect(&mut self) -> Result<()> {
        self.sessions.clear()?;
        self.enter_auth(None);
        Ok(())
    }

    fn enter_auth(&mut self, message: Option<&str>) {
        self.session = None;
        self.saved = None;
        self.message = message.map(str::to_string);
        self.phase = AppPhase::Auth;
    }

    /// Spotify client for the current session, refreshing it first if needed.
    /// `None` means the session is gone and the app is back in `Auth`.
    async fn spotify(&mut self) -> Option<Arc<dyn SpotifyClient>> {
        let Some(session) = self.session.take() else {
            self.enter_auth(None);
            return None;
        };

        match self.fresh(session).await {
            Some(session) => {
                let spotify = (self.spotify_factory)(&session.access_token);
                self.session = Some(session);
                Some(spotify)
            }
            None => {
                self.enter_auth(Some(SESSION_EXPIRED_MESSAGE));
                None
            }
        }
    }

    /// The session if still usable, refreshing through the proxy when expired.
    /// Unusable sessions are removed from the store.
    async fn fresh(&self, session: SpotifySession) -> Option<SpotifySession> {
        if !session.is_expired(Utc::now()) {
            return Some(session);
        }

        let refreshed = match session.refresh_token.clone() {
            Some(refresh_token) => match self.proxy.refresh_token(&refresh_token).await {
                Ok(token) => Some(session.refreshed(token, Utc::now())),
                Err(e) => {
                    tracing::warn!("Failed to refresh spotify session: {}", e);
                    None
                }
            },
            None => None,
        };

        let result = match &refreshed {
            Some(session) => self.sessions.save(session),
            None => self.sessions.clear(),
        };
        if let Err(e) = result {
            tracing::warn!("Failed to update session file: {}", e);
        }
        refreshed
    }
}
