pub mod ollama;
pub mod openai;
pub mod system_prompt;

use std::sync::Arc;

use color_eyre::eyre::{Result, eyre};

use crate::config::LlmConfig;
use crate::ports::llm::LlmClient;

use self::ollama::OllamaClient;
use self::openai::OpenAiClient;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LlmProvider {
    #[default]
    Openai,
    Ollama,
}

/// Build the configured provider. OpenAI needs an API key, Ollama does not.
pub fn build_llm_client(
    config: &LlmConfig,
    openai_api_key: Option<String>,
) -> Result<Arc<dyn LlmClient>> {
    let timeout = config.timeout()?;
    match config.provider {
        LlmProvider::Openai => {
            let api_key = openai_api_key
                .filter(|key| !key.is_empty())
                .ok_or_else(|| eyre!("OPENAI_API_KEY is required for the openai provider"))?;
            let client = OpenAiClient::new(
                api_key,
                config.base_url.clone().unwrap_or(openai::OPENAI_API_URL.to_string()),
                config.model.clone().unwrap_or(openai::OPENAI_MODEL.to_string()),
                timeout,
            )?;
            Ok(Arc::new(client))
        }
        LlmProvider::Ollama => {
            let base_url = config.base_url.clone().unwrap_or(ollama::OLLAMA_URL.to_string());
            let client = OllamaClient::new(
                &base_url,
                config.model.clone().unwrap_or(ollama::OLLAMA_MODEL.to_string()),
                timeout,
            )?;
            Ok(Arc::new(client))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_openai_requires_api_key() {
        let config = LlmConfig::default();
        assert!(build_llm_client(&config, None).is_err());
        assert!(build_llm_client(&config, Some(String::new())).is_err());
        assert!(build_llm_client(&config, Some("sk-test".into())).is_ok());
    }

    #[test]
    fn test_ollama_needs_no_key() {
        let config = LlmConfig {
            provider: LlmProvider::Ollama,
            ..LlmConfig::default()
        };
        assert!(build_llm_client(&config, None).is_ok());
    }
}
