//! Dense embeddings via an Ollama-compatible `/api/embed` endpoint.

use crate::RagError;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone)]
pub struct EmbeddingConfig {
    pub endpoint: String,
    pub model: String,
    pub dim: usize,
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            endpoint: "http://localhost:11434".to_string(),
            model: "qwen3-embedding:0.6b".to_string(),
            dim: 1024,
        }
    }
}

#[derive(Debug, Serialize)]
struct EmbedRequest<'a> {
    model: &'a str,
    input: &'a str,
}

#[derive(Debug, Deserialize)]
struct EmbedResponse {
    embeddings: Vec<Vec<f32>>,
}

/// A thin client around an embedding endpoint. Query embeddings use a
/// retrieval instruction prefix; document embeddings (used only at ingest
/// time, out of scope here) do not.
pub struct Embedder {
    client: reqwest::Client,
    config: EmbeddingConfig,
}

const RETRIEVAL_INSTRUCTION: &str =
    "Given a user question about wealth management, retrieve relevant information that answers it";

impl Embedder {
    pub fn new(config: EmbeddingConfig) -> Self {
        Self {
            client: reqwest::Client::new(),
            config,
        }
    }

    pub fn dim(&self) -> usize {
        self.config.dim
    }

    pub async fn embed_query(&self, query: &str) -> Result<Vec<f32>, RagError> {
        let formatted = format!("Instruct: {}\nQuery:{}", RETRIEVAL_INSTRUCTION, query);
        self.embed_raw(&formatted).await
    }

    async fn embed_raw(&self, text: &str) -> Result<Vec<f32>, RagError> {
        let request = EmbedRequest {
            model: &self.config.model,
            input: text,
        };
        let url = format!("{}/api/embed", self.config.endpoint);

        let response = self
            .client
            .post(&url)
            .json(&request)
            .send()
            .await
            .map_err(|e| RagError::Embedding(format!("request failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(RagError::Embedding(format!("{}: {}", status, body)));
        }

        let parsed: EmbedResponse = response
            .json()
            .await
            .map_err(|e| RagError::Embedding(format!("failed to parse response: {}", e)))?;

        parsed
            .embeddings
            .into_iter()
            .next()
            .ok_or_else(|| RagError::Embedding("no embedding returned".to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_has_nonzero_dim() {
        let cfg = EmbeddingConfig::default();
        assert!(cfg.dim > 0);
        assert!(!cfg.model.is_empty());
    }
}
