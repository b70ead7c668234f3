/// A single system + user completion request.
#[derive(Debug, Clone, PartialEq)]
pub struct CompletionRequest {
    pub system: String,
    pub user: String,
    pub temperature: f32,
    pub max_tokens: u32,
}

#[derive(Debug, thiserror::Error)]
pub enum LlmError {
    #[error("Failed to send request to LLM provider: {0}")]
    FailedToSendRequest(String),
    #[error("LLM provider returned {status}: {body}")]
    UpstreamStatus { status: u16, body: String },
    #[error("Failed to parse LLM provider response: {0}")]
    FailedToParseResponse(String),
}

/// Port trait over a hosted language model.
///
/// `Ok(None)` means the provider answered but produced no text.
#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait LlmClient: Send + Sync {
    async fn complete(&self, request: &CompletionRequest) -> Result<Option<String>, LlmError>;
}
