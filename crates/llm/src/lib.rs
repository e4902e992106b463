//! LLM backend adapter and prompt template registry.

pub mod backend;
pub mod prompt;
pub mod templates;

pub use backend::{LlmConfig, OllamaChatBackend};
pub use prompt::PromptRegistry;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum LlmError {
    #[error("api error: {0}")]
    Api(String),

    #[error("network error: {0}")]
    Network(String),

    #[error("invalid response: {0}")]
    InvalidResponse(String),

    #[error("timeout")]
    Timeout,
}

impl From<reqwest::Error> for LlmError {
    fn from(err: reqwest::Error) -> Self {
        LlmError::Network(err.to_string())
    }
}

impl From<LlmError> for advisor_rag_core::Error {
    fn from(err: LlmError) -> Self {
        match err {
            LlmError::Timeout => advisor_rag_core::Error::LlmTimeout,
            other => advisor_rag_core::Error::Llm(other.to_string()),
        }
    }
}
