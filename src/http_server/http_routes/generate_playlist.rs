use std::sync::Arc;

use axum::{
    Json,
    extract::{State, rejection::JsonRejection},
};
use serde::Deserialize;
use tracing::instrument;

use crate::http_server::error::GenerationProxyError;
use crate::http_server::state::GenerationProxyState;
use crate::models::GenerationResponse;

#[derive(Debug, Default, Deserialize)]
pub struct GeneratePlaylistRequest {
    #[serde(default)]
    pub prompt: String,
}

/// POST /api/generate-playlist - prompt in, concept or refusal out
#[instrument(skip_all)]
pub async fn generate_playlist(
    State(state): State<Arc<GenerationProxyState>>,
    body: Result<Json<GeneratePlaylistRequest>, JsonRejection>,
) -> Result<Json<GenerationResponse>, GenerationProxyError> {
    let request = match body {
        Ok(Json(request)) => request,
        Err(rejection) => {
            log::debug!("Unreadable generate request body: {}", rejection);
            GeneratePlaylistRequest::default()
        }
    };

    let response = state.generator.generate(&request.prompt).await?;
    Ok(Json(response))
}
