//! The unit of work flowing through the pipeline.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// A fixed, closed set of query intents. `General` is the fallback when
/// classification fails or does not resolve to a more specific tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Intent {
    Archetype,
    Portfolio,
    Risk,
    MonteCarlo,
    Esg,
    General,
}

impl Intent {
    /// The default prompt template name for this intent, used when
    /// `Query::prompt_name` is absent or does not resolve.
    pub fn default_template(&self) -> &'static str {
        match self {
            Intent::Archetype => "archetype_default",
            Intent::Portfolio => "portfolio_default",
            Intent::Risk => "risk_metrics_interpreter_cited",
            Intent::MonteCarlo => "monte_carlo_interpreter_cited",
            Intent::Esg => "esg_analysis_cited",
            Intent::General => "general_default",
        }
    }
}

impl std::fmt::Display for Intent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Intent::Archetype => "archetype",
            Intent::Portfolio => "portfolio",
            Intent::Risk => "risk",
            Intent::MonteCarlo => "monte_carlo",
            Intent::Esg => "esg",
            Intent::General => "general",
        };
        f.write_str(s)
    }
}

/// A user-supplied numeric value that must be injected verbatim into the
/// prompt (e.g. a simulation result computed client-side).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ContextValue {
    Number(f64),
    Text(String),
}

impl std::fmt::Display for ContextValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ContextValue::Number(n) => write!(f, "{}", n),
            ContextValue::Text(s) => write!(f, "{}", s),
        }
    }
}

/// The unit of work submitted to the pipeline.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Query {
    /// Opaque short token; correlation id and cache fingerprint prefix.
    pub id: String,
    pub text: String,
    /// Namespace selecting which collection to search.
    pub domain: String,
    /// Names one of the prompt registry's templates, if set.
    pub prompt_name: Option<String>,
    /// User-computed numeric results that must be injected verbatim.
    #[serde(default)]
    pub app_context: HashMap<String, ContextValue>,
    /// Groups follow-up queries for observability only.
    pub thread_id: Option<String>,
}

impl Query {
    pub fn new(text: impl Into<String>, domain: impl Into<String>) -> Self {
        Self {
            id: uuid::Uuid::new_v4().simple().to_string(),
            text: text.into(),
            domain: domain.into(),
            prompt_name: None,
            app_context: HashMap::new(),
            thread_id: None,
        }
    }

    pub fn with_prompt_name(mut self, name: impl Into<String>) -> Self {
        self.prompt_name = Some(name.into());
        self
    }

    pub fn with_app_context(mut self, app_context: HashMap<String, ContextValue>) -> Self {
        self.app_context = app_context;
        self
    }

    pub fn with_thread_id(mut self, thread_id: impl Into<String>) -> Self {
        self.thread_id = Some(thread_id.into());
        self
    }

    pub fn has_app_context(&self) -> bool {
        !self.app_context.is_empty()
    }
}
