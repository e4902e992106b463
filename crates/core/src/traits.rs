//! Capability traits for the external collaborators the pipeline consumes:
//! the vector store + lexical index (`Retriever`), and the LLM provider
//! (`ChatModel`). Concrete adapters live in the `rag` and `llm` crates;
//! the pipeline only ever depends on these traits.

use crate::{Error, Result};
use crate::pipeline_state::{MetricsRecord, FeedbackRecord};
use async_trait::async_trait;

/// One hit from either leg of hybrid search.
#[derive(Debug, Clone)]
pub struct RetrievedHit {
    pub id: String,
    pub text: String,
    pub source_path: String,
    pub chunk_index: usize,
    pub metadata: std::collections::HashMap<String, String>,
    pub score: f32,
}

/// Collection-level statistics used for startup dimension checks.
#[derive(Debug, Clone, Copy)]
pub struct CollectionStats {
    pub doc_count: usize,
    pub embedding_dim: usize,
}

/// The vector store + lexical index capability. Implementations own their
/// own concurrency contract; callers treat this as an external service.
#[async_trait]
pub trait Retriever: Send + Sync {
    async fn embed(&self, text: &str) -> Result<Vec<f32>>;

    async fn search_semantic(
        &self,
        collection: &str,
        vector: &[f32],
        k: usize,
    ) -> Result<Vec<RetrievedHit>>;

    async fn search_lexical(
        &self,
        collection: &str,
        text: &str,
        k: usize,
    ) -> Result<Vec<RetrievedHit>>;

    async fn stats(&self, collection: &str) -> Result<CollectionStats>;
}

/// The LLM provider capability.
#[async_trait]
pub trait ChatModel: Send + Sync {
    /// Generate text for `prompt`, honouring `timeout` as a strict deadline.
    async fn chat(&self, prompt: &str, timeout: std::time::Duration) -> Result<String>;

    /// Optional external rerank model: returns one confidence per passage,
    /// in the same order as `passages`.
    async fn rerank(&self, _query: &str, _passages: &[&str]) -> Result<Option<Vec<f32>>> {
        Ok(None)
    }
}

/// Append-only sink for per-query metrics records.
#[async_trait]
pub trait MetricsSink: Send + Sync {
    async fn record(&self, record: MetricsRecord);
}

/// Append-only sink for user feedback, correlated by query id.
#[async_trait]
pub trait FeedbackSink: Send + Sync {
    async fn record(&self, record: FeedbackRecord);
}

/// A validated prompt template: only `{context}` and `{query}` placeholders
/// are permitted, checked once at load time (see `PromptRegistry::validate`).
#[derive(Debug, Clone)]
pub struct PromptTemplate {
    pub name: String,
    pub body: String,
}

impl PromptTemplate {
    const ALLOWED_PLACEHOLDERS: &'static [&'static str] = &["{context}", "{query}"];

    pub fn new(name: impl Into<String>, body: impl Into<String>) -> Result<Self> {
        let body = body.into();
        Self::validate(&body)?;
        Ok(Self {
            name: name.into(),
            body,
        })
    }

    /// Rejects any `{placeholder}` other than the two allowed ones.
    fn validate(body: &str) -> Result<()> {
        let mut rest = body;
        while let Some(open) = rest.find('{') {
            let after = &rest[open..];
            let close = after
                .find('}')
                .ok_or_else(|| Error::PromptTemplate(format!("unterminated placeholder in: {}", body)))?;
            let placeholder = &after[..=close];
            if !Self::ALLOWED_PLACEHOLDERS.contains(&placeholder) {
                return Err(Error::PromptTemplate(format!(
                    "unknown placeholder {} (only {{context}} and {{query}} are allowed)",
                    placeholder
                )));
            }
            rest = &after[close + 1..];
        }
        Ok(())
    }

    pub fn render(&self, context: &str, query: &str) -> String {
        self.body.replace("{context}", context).replace("{query}", query)
    }
}
