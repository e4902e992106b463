//! Top-level error type every crate's error bridges into.

use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

/// Error taxonomy for the retrieval-and-grading pipeline.
///
/// Each crate in this workspace owns a narrower error enum scoped to its own
/// concerns and bridges into this one at the boundary via `From`. Variants
/// here track the policy-level taxonomy, not raw transport failures.
#[derive(Error, Debug)]
pub enum Error {
    #[error("retriever error: {0}")]
    Retriever(String),

    #[error("embedding dimension mismatch: query produced dim {query_dim}, collection expects {collection_dim}")]
    DimensionMismatch {
        query_dim: usize,
        collection_dim: usize,
    },

    #[error("llm call failed: {0}")]
    Llm(String),

    #[error("llm call timed out")]
    LlmTimeout,

    #[error("generator failed: {0}")]
    GeneratorFailed(String),

    #[error("request deadline exceeded")]
    DeadlineExceeded,

    #[error("circuit breaker open for dependency: {0}")]
    BreakerOpen(String),

    #[error("configuration error: {0}")]
    Configuration(String),

    #[error("prompt template error: {0}")]
    PromptTemplate(String),

    #[error("cache error: {0}")]
    Cache(String),

    #[error("inflight request cap reached")]
    Overloaded,
}
