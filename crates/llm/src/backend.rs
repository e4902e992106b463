//! An Ollama-compatible chat backend implementing the `ChatModel` capability.

use crate::LlmError;
use advisor_rag_core::{ChatModel, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct LlmConfig {
    pub endpoint: String,
    pub model: String,
    pub temperature: f32,
    pub max_tokens: usize,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            endpoint: "http://localhost:11434".to_string(),
            model: "qwen2.5:7b".to_string(),
            temperature: 0.2,
            max_tokens: 512,
        }
    }
}

#[derive(Debug, Serialize)]
struct GenerateRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    stream: bool,
    options: GenerateOptions,
}

#[derive(Debug, Serialize)]
struct GenerateOptions {
    temperature: f32,
    num_predict: usize,
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    response: String,
}

/// A chat backend that POSTs to an Ollama-compatible `/api/generate`
/// endpoint. One call per `chat`; no session/KV-cache reuse, since each
/// pipeline stage's calls are independent and short-lived.
pub struct OllamaChatBackend {
    client: reqwest::Client,
    config: LlmConfig,
}

impl OllamaChatBackend {
    pub fn new(config: LlmConfig) -> Self {
        Self {
            client: reqwest::Client::new(),
            config,
        }
    }

    fn api_url(&self) -> String {
        format!("{}/api/generate", self.config.endpoint)
    }
}

#[async_trait]
impl ChatModel for OllamaChatBackend {
    async fn chat(&self, prompt: &str, timeout: Duration) -> Result<String> {
        let request = GenerateRequest {
            model: &self.config.model,
            prompt,
            stream: false,
            options: GenerateOptions {
                temperature: self.config.temperature,
                num_predict: self.config.max_tokens as usize,
            },
        };

        let send = self.client.post(self.api_url()).json(&request).send();

        let response = tokio::time::timeout(timeout, send)
            .await
            .map_err(|_| LlmError::Timeout)?
            .map_err(LlmError::from)?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(LlmError::Api(format!("{}: {}", status, body)).into());
        }

        let parsed: GenerateResponse = response
            .json()
            .await
            .map_err(|e| LlmError::InvalidResponse(e.to_string()))?;

        Ok(parsed.response)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_has_a_model() {
        let cfg = LlmConfig::default();
        assert!(!cfg.model.is_empty());
        assert!(cfg.max_tokens > 0);
    }

    #[test]
    fn api_url_appends_generate_path() {
        let backend = OllamaChatBackend::new(LlmConfig::default());
        assert_eq!(backend.api_url(), "http://localhost:11434/api/generate");
    }
}
