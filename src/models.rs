use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Number of search queries the model must return for a playlist concept.
pub const SEARCH_QUERY_COUNT: usize = 15;

/// Fixed text returned whenever the model declines, or returns something unusable.
pub const REFUSAL_MESSAGE: &str = "I'm Melody, your music expert! I can only help with creating playlists. Please describe a mood, vibe, or activity.";

/// A playlist idea produced by the language model for a single prompt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct PlaylistConcept {
    pub title: String,
    pub description: String,
    /// Mixed song/artist/genre search text, in the order the model suggested.
    #[schemars(length(min = 15, max = 15))]
    pub search_queries: Vec<String>,
}

/// The model's structured refusal for non-music requests.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct Refusal {
    pub error: bool,
    pub message: String,
}

impl Refusal {
    pub fn melody() -> Self {
        Self {
            error: true,
            message: REFUSAL_MESSAGE.to_string(),
        }
    }

    pub fn with_message(message: impl Into<String>) -> Self {
        Self {
            error: true,
            message: message.into(),
        }
    }
}

/// Body returned by `POST /api/generate-playlist`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(untagged)]
pub enum GenerationResponse {
    Refusal(Refusal),
    Concept(PlaylistConcept),
}

/// One search query resolved against Spotify.
///
/// An empty `uri` marks a query with no match; the entry is kept as a
/// placeholder so the list lines up with the queries.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResolvedTrack {
    pub id: String,
    pub name: String,
    pub artist: String,
    pub album: String,
    pub album_art_url: String,
    pub uri: String,
}

impl ResolvedTrack {
    pub fn is_found(&self) -> bool {
        !self.uri.is_empty()
    }
}

/// Playlist persisted to the user's Spotify account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SavedPlaylist {
    pub playlist_id: String,
    pub playlist_url: String,
    pub tracks_added: usize,
    /// Set when creation succeeded but attaching tracks did not.
    pub track_error: Option<String>,
}
