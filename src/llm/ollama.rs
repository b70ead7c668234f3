use std::time::Duration;

use color_eyre::eyre::{Context, Result};
use ollama_native::Ollama;
use schemars::schema_for;

use crate::models::GenerationResponse;
use crate::ports::llm::{CompletionRequest, LlmClient, LlmError};

pub const OLLAMA_URL: &str = "http://localhost:11434";
pub const OLLAMA_MODEL: &str = "nemotron-3-nano:30b";

/// Local Ollama model, constrained to the generation response schema
pub struct OllamaClient {
    ollama: Ollama,
    model: String,
    json_schema: String,
    timeout: Duration,
}

impl OllamaClient {
    pub fn new(url: &str, model: String, timeout: Duration) -> Result<Self> {
        let json_schema = schema_for!(GenerationResponse);
        let json_schema = serde_json::to_string_pretty(&json_schema)
            .wrap_err("Failed to convert JSON schema to string")?;

        Ok(Self {
            ollama: Ollama::new(url),
            model,
            json_schema,
            timeout,
        })
    }
}

/// Ollama's generate endpoint has a single prompt, so the instruction leads it.
fn combined_prompt(request: &CompletionRequest) -> String {
    format!("{}\n\nUser request:\n{}\n", request.system, request.user)
}

#[async_trait::async_trait]
impl LlmClient for OllamaClient {
    #[tracing::instrument(skip_all, fields(model = %self.model))]
    async fn complete(&self, request: &CompletionRequest) -> Result<Option<String>, LlmError> {
        let prompt = combined_prompt(request);

        let response = tokio::time::timeout(
            self.timeout,
            self.ollama
                .generate(&self.model)
                .prompt(&prompt)
                .format(&self.json_schema),
        )
        .await
        .map_err(|_| LlmError::FailedToSendRequest("Timed out waiting for ollama".to_string()))?
        .map_err(|e| LlmError::FailedToSendRequest(e.to_string()))?;

        if response.response.trim().is_empty() {
            return Ok(None);
        }
        Ok(Some(response.response))
    }
}
