use std::sync::Arc;

use tracing::instrument;

use crate::llm::system_prompt::playlist_curator_prompt;
use crate::models::{GenerationResponse, PlaylistConcept, Refusal, SEARCH_QUERY_COUNT};
use crate::ports::llm::{CompletionRequest, LlmClient, LlmError};

/// Why model output was turned into a refusal
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ConceptRejection {
    #[error("model output is not a playlist concept: {0}")]
    NotAConcept(String),
    #[error("title is blank")]
    BlankTitle,
    #[error("expected 15 search queries, got {0}")]
    WrongQueryCount(usize),
    #[error("search query {0} is blank")]
    BlankQuery(usize),
}

/// Asks the model for a playlist concept and guarantees a well-formed answer.
pub struct PlaylistGenerator {
    llm: Arc<dyn LlmClient>,
    system_prompt: String,
    temperature: f32,
    max_tokens: u32,
}

impl PlaylistGenerator {
    pub fn new(llm: Arc<dyn LlmClient>, temperature: f32, max_tokens: u32) -> Self {
        Self {
            llm,
            system_prompt: playlist_curator_prompt(),
            temperature,
            max_tokens,
        }
    }

    /// Returns either a validated concept or the fixed refusal.
    /// Only transport-level failures of the provider surface as errors.
    #[instrument(skip(self))]
    pub async fn generate(&self, prompt: &str) -> Result<GenerationResponse, LlmError> {
        let prompt = prompt.trim();
        if prompt.is_empty() {
            tracing::info!("Blank prompt, refusing without calling the model");
            return Ok(GenerationResponse::Refusal(Refusal::melody()));
        }

        let request = CompletionRequest {
            system: self.system_prompt.clone(),
            user: prompt.to_string(),
            temperature: self.temperature,
            max_tokens: self.max_tokens,
        };

        let Some(content) = self.llm.complete(&request).await? else {
            tracing::warn!("Model returned no content");
            return Ok(GenerationResponse::Refusal(Refusal::melody()));
        };

        match parse_concept(&content) {
            Ok(concept) => {
                tracing::info!("Generated playlist concept `{}`", concept.title);
                Ok(GenerationResponse::Concept(concept))
            }
            Err(rejection) => {
                tracing::info!("Replying with refusal: {}", rejection);
                tracing::debug!("Rejected model output: {}", content);
                Ok(GenerationResponse::Refusal(Refusal::melody()))
            }
        }
    }
}

/// Models sometimes wrap JSON in a markdown fence.
fn strip_code_fence(text: &str) -> &str {
    let trimmed = text.trim();
    if let Some(rest) = trimmed.strip_prefix("```") {
        let rest = rest.strip_prefix("json").unwrap_or(rest);
        if let Some(inner) = rest.trim_end().strip_suffix("```") {
            return inner.trim();
        }
    }
    trimmed
}

/// Parse-or-reject: the text must be exactly the success shape.
pub fn parse_concept(text: &str) -> Result<PlaylistConcept, ConceptRejection> {
    let concept: PlaylistConcept = serde_json::from_str(strip_code_fence(text))
        .map_err(|e| ConceptRejection::NotAConcept(e.to_string()))?;

    let title = concept.title.trim().to_string();
    if title.is_empty() {
        return Err(ConceptRejection::BlankTitle);
    }
    if concept.search_queries.len() != SEARCH_QUERY_COUNT {
        return Err(ConceptRejection::WrongQueryCount(
            concept.search_queries.len(),
        ));
    }

    let mut search_queries = Vec::with_capacity(SEARCH_QUERY_COUNT);
    for (index, query) in concept.search_queries.iter().enumerate() {
        let query = query.trim();
        if query.is_empty() {
            return Err(ConceptRejection::BlankQuery(index));
        }
        search_queries.push(query.to_string());
    }

    Ok(PlaylistConcept {
        title,
        description: concept.description.trim().to_string(),
        search_queries,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::REFUSAL_MESSAGE;
    use crate::ports::llm::MockLlmClient;

    fn concept_json(query_count: usize) -> String {
        let queries: Vec<String> = (0..query_count)
            .map(|i| format!("Song {i} by Artist {i}"))
            .collect();
        serde_json::json!({
            "title": "Sunrise Sprint",
            "description": "High-energy tracks to get moving",
            "searchQueries": queries,
        })
        .to_string()
    }

    fn generator_returning(content: Option<String>) -> PlaylistGenerator {
        let mut llm = MockLlmClient::new();
        llm.expect_complete()
            .times(1)
            .returning(move |_| Ok(content.clone()));
        PlaylistGenerator::new(Arc::new(llm), 0.8, 600)
    }

    fn assert_refusal(response: GenerationResponse) {
        match response {
            GenerationResponse::Refusal(refusal) => {
                assert!(refusal.error);
                assert_eq!(refusal.message, REFUSAL_MESSAGE);
            }
            GenerationResponse::Concept(concept) => panic!("expected refusal, got {concept:?}"),
        }
    }

    #[tokio::test]
    async fn test_generate_returns_concept() {
        let generator = generator_returning(Some(concept_json(15)));

        let response = generator
            .generate("Upbeat songs for a morning workout")
            .await
            .unwrap();

        let GenerationResponse::Concept(concept) = response else {
            panic!("expected concept");
        };
        assert_eq!(concept.title, "Sunrise Sprint");
        assert_eq!(concept.search_queries.len(), SEARCH_QUERY_COUNT);
        assert_eq!(concept.search_queries[0], "Song 0 by Artist 0");
        assert_eq!(concept.search_queries[14], "Song 14 by Artist 14");
    }

    #[tokio::test]
    async fn test_generate_sends_fixed_instruction() {
        let mut llm = MockLlmClient::new();
        llm.expect_complete()
            .withf(|request| {
                request.system.contains("Melody")
                    && request.user == "Chill indie tracks for studying"
                    && request.temperature == 0.8
                    && request.max_tokens == 600
            })
            .times(1)
            .returning(|_| Ok(Some(concept_json(15))));
        let generator = PlaylistGenerator::new(Arc::new(llm), 0.8, 600);

        generator
            .generate("  Chill indie tracks for studying  ")
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_model_refusal_is_normalized() {
        let generator = generator_returning(Some(
            r#"{"error": true, "message": "I'm Melody! Only playlists, sorry."}"#.to_string(),
        ));

        let response = generator.generate("Write me a recipe for pasta").await.unwrap();
        assert_refusal(response);
    }

    #[tokio::test]
    async fn test_malformed_output_becomes_refusal() {
        let generator = generator_returning(Some("Sure! Here's a playlist: {title:".to_string()));
        assert_refusal(generator.generate("road trip").await.unwrap());
    }

    #[tokio::test]
    async fn test_wrong_query_count_becomes_refusal() {
        let generator = generator_returning(Some(concept_json(14)));
        assert_refusal(generator.generate("road trip").await.unwrap());
    }

    #[tokio::test]
    async fn test_missing_content_becomes_refusal() {
        let generator = generator_returning(None);
        assert_refusal(generator.generate("road trip").await.unwrap());
    }

    #[tokio::test]
    async fn test_blank_prompt_skips_model() {
        let mut llm = MockLlmClient::new();
        llm.expect_complete().never();
        let generator = PlaylistGenerator::new(Arc::new(llm), 0.8, 600);

        assert_refusal(generator.generate("   ").await.unwrap());
    }

    #[tokio::test]
    async fn test_transport_error_propagates() {
        let mut llm = MockLlmClient::new();
        llm.expect_complete()
            .returning(|_| Err(LlmError::FailedToSendRequest("connection refused".into())));
        let generator = PlaylistGenerator::new(Arc::new(llm), 0.8, 600);

        let result = generator.generate("road trip").await;
        assert!(matches!(result, Err(LlmError::FailedToSendRequest(_))));
    }

    #[test]
    fn test_parse_concept_strips_code_fence() {
        let fenced = format!("```json\n{}\n```", concept_json(15));
        assert!(parse_concept(&fenced).is_ok());

        let bare_fence = format!("```\n{}\n```", concept_json(15));
        assert!(parse_concept(&bare_fence).is_ok());
    }

    #[test]
    fn test_parse_concept_rejections() {
        assert_eq!(
            parse_concept(&concept_json(16)),
            Err(ConceptRejection::WrongQueryCount(16))
        );

        let blank_title = serde_json::json!({
            "title": "  ",
            "description": "d",
            "searchQueries": vec!["q"; 15],
        })
        .to_string();
        assert_eq!(parse_concept(&blank_title), Err(ConceptRejection::BlankTitle));

        let mut queries = vec!["q"; 15];
        queries[3] = " ";
        let blank_query = serde_json::json!({
            "title": "t",
            "description": "d",
            "searchQueries": queries,
        })
        .to_string();
        assert_eq!(parse_concept(&blank_query), Err(ConceptRejection::BlankQuery(3)));

        let wrong_types = r#"{"title": "t", "description": "d", "searchQueries": "rock"}"#;
        assert!(matches!(
            parse_concept(wrong_types),
            Err(ConceptRejection::NotAConcept(_))
        ));
    }
}
