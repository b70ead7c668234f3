use std::time::Duration;

use color_eyre::eyre::{Context, Result};
use reqwest::{Client, header};
use serde::{Deserialize, Serialize};

use crate::ports::llm::{CompletionRequest, LlmClient, LlmError};

pub const OPENAI_API_URL: &str = "https://api.openai.com/v1";
pub const OPENAI_MODEL: &str = "gpt-4o-mini";

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Serialize)]
struct ResponseFormat {
    #[serde(rename = "type")]
    format_type: &'static str,
}

#[derive(Debug, Serialize)]
struct ChatCompletionRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    temperature: f32,
    max_tokens: u32,
    response_format: ResponseFormat,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: Option<ChoiceMessage>,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    content: Option<String>,
}

/// OpenAI-compatible chat completions client
pub struct OpenAiClient {
    api_key: String,
    base_url: String,
    model: String,
    client: Client,
}

impl OpenAiClient {
    pub fn new(api_key: String, base_url: String, model: String, timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .wrap_err("Failed to create HTTP client")?;

        Ok(Self {
            api_key,
            base_url: base_url.trim_end_matches('/').to_string(),
            model,
            client,
        })
    }
}

#[async_trait::async_trait]
impl LlmClient for OpenAiClient {
    #[tracing::instrument(skip_all, fields(model = %self.model))]
    async fn complete(&self, request: &CompletionRequest) -> Result<Option<String>, LlmError> {
        let body = ChatCompletionRequest {
            model: &self.model,
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: &request.system,
                },
                ChatMessage {
                    role: "user",
                    content: &request.user,
                },
            ],
            temperature: request.temperature,
            max_tokens: request.max_tokens,
            response_format: ResponseFormat {
                format_type: "json_object",
            },
        };

        let response = self
            .client
            .post(format!("{}/chat/completions", self.base_url))
            .header(header::CONTENT_TYPE, "application/json")
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| LlmError::FailedToSendRequest(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(LlmError::UpstreamStatus { status, body });
        }

        let completion: ChatCompletionResponse = response
            .json()
            .await
            .map_err(|e| LlmError::FailedToParseResponse(e.to_string()))?;

        tracing::debug!("OpenAI returned {} choices", completion.choices.len());

        Ok(first_content(completion))
    }
}

fn first_content(completion: ChatCompletionResponse) -> Option<String> {
    completion
        .choices
        .into_iter()
        .next()
        .and_then(|choice| choice.message)
        .and_then(|message| message.content)
}

#[cfg(test)]
mod tests {
    use axum::http::{Method, StatusCode};
    use serde_json::json;

    use super::*;
    use crate::test_utils::StubServer;

    fn openai(server: &StubServer) -> OpenAiClient {
        OpenAiClient::new(
            "sk-test".into(),
            format!("{}/v1/", server.url),
            OPENAI_MODEL.into(),
            Duration::from_secs(5),
        )
        .unwrap()
    }

    fn completion_request() -> CompletionRequest {
        CompletionRequest {
            system: "You are Melody".into(),
            user: "Songs for a rainy day".into(),
            temperature: 0.8,
            max_tokens: 600,
        }
    }

    #[tokio::test]
    async fn test_complete_posts_chat_completion() {
        let server = StubServer::start(|_| {
            (
                StatusCode::OK,
                json!({"choices": [{"message": {"role": "assistant", "content": "{\"title\":\"Rain\"}"}}]}),
            )
        })
        .await;

        let content = openai(&server).complete(&completion_request()).await.unwrap();
        assert_eq!(content.as_deref(), Some(r#"{"title":"Rain"}"#));

        let request = server.only_request();
        assert_eq!(request.method, Method::POST);
        assert_eq!(request.path, "/v1/chat/completions");
        assert_eq!(request.header("authorization"), Some("Bearer sk-test"));

        let body = request.json();
        assert_eq!(body["model"], OPENAI_MODEL);
        assert_eq!(body["messages"][0], json!({"role": "system", "content": "You are Melody"}));
        assert_eq!(
            body["messages"][1],
            json!({"role": "user", "content": "Songs for a rainy day"})
        );
        assert_eq!(body["max_tokens"], 600);
        assert_eq!(body["response_format"], json!({"type": "json_object"}));
    }

    #[tokio::test]
    async fn test_complete_maps_error_status() {
        let server = StubServer::start(|_| {
            (
                StatusCode::UNAUTHORIZED,
                json!({"error": {"message": "Incorrect API key provided"}}),
            )
        })
        .await;

        let err = openai(&server)
            .complete(&completion_request())
            .await
            .unwrap_err();
        match err {
            LlmError::UpstreamStatus { status, body } => {
                assert_eq!(status, 401);
                assert!(body.contains("Incorrect API key"));
            }
            other => panic!("unexpected error: {}", other),
        }
    }

    #[tokio::test]
    async fn test_complete_without_content() {
        let server = StubServer::start(|_| (StatusCode::OK, json!({"choices": []}))).await;
        let content = openai(&server).complete(&completion_request()).await.unwrap();
        assert!(content.is_none());
    }

    #[test]
    fn test_request_body_shape() {
        let body = ChatCompletionRequest {
            model: OPENAI_MODEL,
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: "sys",
                },
                ChatMessage {
                    role: "user",
                    content: "hi",
                },
            ],
            temperature: 0.8,
            max_tokens: 600,
            response_format: ResponseFormat {
                format_type: "json_object",
            },
        };
        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(json["model"], "gpt-4o-mini");
        assert_eq!(json["messages"][0]["role"], "system");
        assert_eq!(json["messages"][1]["content"], "hi");
        assert_eq!(json["max_tokens"], 600);
        assert_eq!(json["response_format"]["type"], "json_object");
    }

    #[test]
    fn test_first_content_present() {
        let completion: ChatCompletionResponse = serde_json::from_str(
            r#"{"choices": [{"message": {"role": "assistant", "content": "{\"a\":1}"}}]}"#,
        )
        .unwrap();
        assert_eq!(first_content(completion).as_deref(), Some(r#"{"a":1}"#));
    }

    #[test]
    fn test_first_content_missing() {
        let empty: ChatCompletionResponse = serde_json::from_str(r#"{"choices": []}"#).unwrap();
        assert!(first_content(empty).is_none());

        let no_choices: ChatCompletionResponse =
            serde_json::from_str(r#"{"error": {"message": "bad key"}}"#).unwrap();
        assert!(first_content(no_choices).is_none());

        let null_content: ChatCompletionResponse =
            serde_json::from_str(r#"{"choices": [{"message": {"content": null}}]}"#).unwrap();
        assert!(first_content(null_content).is_none());
    }
}
