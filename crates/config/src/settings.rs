//! Layered application settings: defaults, then an optional env-named file,
//! then environment variables, in increasing priority.

use crate::constants::{endpoints, rag, resilience, timeouts};
use crate::ConfigError;
use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum RuntimeEnvironment {
    #[default]
    Development,
    Staging,
    Production,
}

impl RuntimeEnvironment {
    pub fn is_production(&self) -> bool {
        matches!(self, Self::Production)
    }

    pub fn is_strict(&self) -> bool {
        matches!(self, Self::Production | Self::Staging)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IntentClassifierMode {
    Llm,
    Keyword,
}

impl Default for IntentClassifierMode {
    fn default() -> Self {
        IntentClassifierMode::Llm
    }
}

/// The recognised pipeline options from the external interface contract.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineConfig {
    #[serde(default = "default_k_retrieve")]
    pub k_retrieve: usize,
    #[serde(default = "default_k_rerank")]
    pub k_rerank: usize,
    #[serde(default = "default_w_semantic")]
    pub w_semantic: f32,
    #[serde(default = "default_w_bm25")]
    pub w_bm25: f32,
    #[serde(default = "default_rrf_k")]
    pub rrf_k: f32,
    #[serde(default = "default_rerank_threshold")]
    pub rerank_confidence_threshold: f32,
    #[serde(default = "default_quality_good_confidence")]
    pub quality_good_confidence: f32,

    #[serde(default = "default_grader_parallelism")]
    pub grader_parallelism: usize,
    #[serde(default = "default_grader_timeout_ms")]
    pub grader_timeout_ms: u64,
    #[serde(default = "default_generator_timeout_ms")]
    pub generator_timeout_ms: u64,
    #[serde(default = "default_request_deadline_ms")]
    pub request_deadline_ms: u64,
    #[serde(default = "default_fallback_deadline_ms")]
    pub fallback_deadline_ms: u64,

    #[serde(default = "default_cache_ttl_s")]
    pub cache_ttl_s: u64,
    #[serde(default = "default_cache_max_size")]
    pub cache_max_size: usize,
    #[serde(default = "default_true")]
    pub cache_enabled: bool,

    #[serde(default = "default_breaker_threshold")]
    pub breaker_threshold: u32,
    #[serde(default = "default_breaker_reset_s")]
    pub breaker_reset_s: u64,

    #[serde(default = "default_inflight_cap")]
    pub inflight_cap: usize,

    #[serde(default = "default_true")]
    pub expander_enabled: bool,

    #[serde(default)]
    pub intent_classifier_mode: IntentClassifierMode,

    #[serde(default = "default_qdrant_endpoint")]
    pub qdrant_endpoint: String,
    #[serde(default = "default_llm_endpoint")]
    pub llm_endpoint: String,
    #[serde(default = "default_embedding_dim")]
    pub embedding_dim: usize,
}

fn default_k_retrieve() -> usize {
    rag::K_RETRIEVE
}
fn default_k_rerank() -> usize {
    rag::K_RERANK
}
fn default_w_semantic() -> f32 {
    rag::W_SEMANTIC as f32
}
fn default_w_bm25() -> f32 {
    rag::W_BM25 as f32
}
fn default_rrf_k() -> f32 {
    rag::RRF_K as f32
}
fn default_rerank_threshold() -> f32 {
    rag::RERANK_CONFIDENCE_THRESHOLD as f32
}
fn default_quality_good_confidence() -> f32 {
    rag::QUALITY_GOOD_CONFIDENCE as f32
}
fn default_grader_parallelism() -> usize {
    resilience::GRADER_PARALLELISM
}
fn default_grader_timeout_ms() -> u64 {
    timeouts::GRADER_TIMEOUT_MS
}
fn default_generator_timeout_ms() -> u64 {
    timeouts::GENERATOR_TIMEOUT_MS
}
fn default_request_deadline_ms() -> u64 {
    timeouts::REQUEST_DEADLINE_MS
}
fn default_fallback_deadline_ms() -> u64 {
    timeouts::FALLBACK_DEADLINE_MS
}
fn default_cache_ttl_s() -> u64 {
    resilience::CACHE_TTL_S
}
fn default_cache_max_size() -> usize {
    resilience::CACHE_MAX_SIZE
}
fn default_breaker_threshold() -> u32 {
    resilience::BREAKER_THRESHOLD
}
fn default_breaker_reset_s() -> u64 {
    resilience::BREAKER_RESET_S
}
fn default_inflight_cap() -> usize {
    resilience::INFLIGHT_CAP
}
fn default_qdrant_endpoint() -> String {
    endpoints::QDRANT_DEFAULT.to_string()
}
fn default_llm_endpoint() -> String {
    endpoints::LLM_DEFAULT.to_string()
}
fn default_embedding_dim() -> usize {
    1024
}
fn default_true() -> bool {
    true
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            k_retrieve: default_k_retrieve(),
            k_rerank: default_k_rerank(),
            w_semantic: default_w_semantic(),
            w_bm25: default_w_bm25(),
            rrf_k: default_rrf_k(),
            rerank_confidence_threshold: default_rerank_threshold(),
            quality_good_confidence: default_quality_good_confidence(),
            grader_parallelism: default_grader_parallelism(),
            grader_timeout_ms: default_grader_timeout_ms(),
            generator_timeout_ms: default_generator_timeout_ms(),
            request_deadline_ms: default_request_deadline_ms(),
            fallback_deadline_ms: default_fallback_deadline_ms(),
            cache_ttl_s: default_cache_ttl_s(),
            cache_max_size: default_cache_max_size(),
            cache_enabled: true,
            breaker_threshold: default_breaker_threshold(),
            breaker_reset_s: default_breaker_reset_s(),
            inflight_cap: default_inflight_cap(),
            expander_enabled: true,
            intent_classifier_mode: IntentClassifierMode::default(),
            qdrant_endpoint: default_qdrant_endpoint(),
            llm_endpoint: default_llm_endpoint(),
            embedding_dim: default_embedding_dim(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default = "default_timeout")]
    pub timeout_seconds: u64,
    #[serde(default = "default_true")]
    pub cors_enabled: bool,
    #[serde(default)]
    pub cors_origins: Vec<String>,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}
fn default_port() -> u16 {
    8080
}
fn default_timeout() -> u64 {
    30
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            timeout_seconds: default_timeout(),
            cors_enabled: true,
            cors_origins: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ObservabilityConfig {
    #[serde(default = "default_log_level")]
    pub log_level: String,
    #[serde(default)]
    pub log_json: bool,
    #[serde(default = "default_true")]
    pub metrics_enabled: bool,
    #[serde(default = "default_metrics_port")]
    pub metrics_port: u16,
}

fn default_log_level() -> String {
    "info".to_string()
}
fn default_metrics_port() -> u16 {
    9090
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            log_json: false,
            metrics_enabled: true,
            metrics_port: default_metrics_port(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Settings {
    #[serde(default)]
    pub environment: RuntimeEnvironment,
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub pipeline: PipelineConfig,
    #[serde(default)]
    pub observability: ObservabilityConfig,
}

impl Settings {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.validate_pipeline()?;
        self.validate_server()?;
        Ok(())
    }

    fn validate_pipeline(&self) -> Result<(), ConfigError> {
        let p = &self.pipeline;

        if (p.w_semantic + p.w_bm25 - 1.0).abs() > 1e-3 {
            return Err(ConfigError::InvalidValue {
                field: "pipeline.w_semantic + pipeline.w_bm25".to_string(),
                message: format!(
                    "fusion weights must sum to 1.0, got {} + {} = {}",
                    p.w_semantic,
                    p.w_bm25,
                    p.w_semantic + p.w_bm25
                ),
            });
        }

        if p.rrf_k <= 0.0 {
            return Err(ConfigError::InvalidValue {
                field: "pipeline.rrf_k".to_string(),
                message: format!("must be positive, got {}", p.rrf_k),
            });
        }

        if p.k_rerank == 0 {
            return Err(ConfigError::InvalidValue {
                field: "pipeline.k_rerank".to_string(),
                message: "must be at least 1".to_string(),
            });
        }

        if p.k_rerank > p.k_retrieve {
            tracing::warn!(
                "pipeline.k_rerank ({}) is larger than pipeline.k_retrieve ({}), \
                 reranker will never have that many survivors to choose from",
                p.k_rerank,
                p.k_retrieve
            );
        }

        if p.grader_parallelism == 0 || p.grader_parallelism > 16 {
            return Err(ConfigError::InvalidValue {
                field: "pipeline.grader_parallelism".to_string(),
                message: "must be between 1 and 16".to_string(),
            });
        }

        if p.fallback_deadline_ms >= p.request_deadline_ms {
            return Err(ConfigError::InvalidValue {
                field: "pipeline.fallback_deadline_ms".to_string(),
                message: "must be smaller than pipeline.request_deadline_ms".to_string(),
            });
        }

        Ok(())
    }

    fn validate_server(&self) -> Result<(), ConfigError> {
        if self.server.port == 0 {
            return Err(ConfigError::InvalidValue {
                field: "server.port".to_string(),
                message: "port cannot be 0".to_string(),
            });
        }

        if self.environment.is_production()
            && self.server.cors_enabled
            && self.server.cors_origins.is_empty()
        {
            tracing::warn!(
                "CORS is enabled in production but no origins are configured; \
                 this may block legitimate requests"
            );
        }

        Ok(())
    }
}

/// Load settings from files and environment.
///
/// Priority (highest to lowest):
/// 1. Environment variables (`ADVISOR_RAG` prefix)
/// 2. `config/{env}.yaml` (if `env` specified)
/// 3. `config/default.yaml`
pub fn load_settings(env: Option<&str>) -> Result<Settings, ConfigError> {
    let mut builder = Config::builder();

    builder = builder.add_source(File::with_name("config/default").required(false));

    if let Some(env_name) = env {
        builder =
            builder.add_source(File::with_name(&format!("config/{}", env_name)).required(false));
    }

    builder = builder.add_source(
        Environment::with_prefix("ADVISOR_RAG")
            .separator("__")
            .try_parsing(true),
    );

    let config = builder.build()?;
    let settings: Settings = config.try_deserialize()?;
    settings.validate()?;
    Ok(settings)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_settings_validate() {
        let settings = Settings::default();
        assert!(settings.validate().is_ok());
        assert_eq!(settings.server.port, 8080);
    }

    #[test]
    fn rejects_mismatched_fusion_weights() {
        let mut settings = Settings::default();
        settings.pipeline.w_semantic = 0.9;
        settings.pipeline.w_bm25 = 0.4;
        assert!(settings.validate().is_err());
    }

    #[test]
    fn rejects_zero_k_rerank() {
        let mut settings = Settings::default();
        settings.pipeline.k_rerank = 0;
        assert!(settings.validate().is_err());
    }

    #[test]
    fn rejects_fallback_deadline_not_smaller() {
        let mut settings = Settings::default();
        settings.pipeline.fallback_deadline_ms = settings.pipeline.request_deadline_ms;
        assert!(settings.validate().is_err());
    }

    #[test]
    fn rejects_out_of_range_grader_parallelism() {
        let mut settings = Settings::default();
        settings.pipeline.grader_parallelism = 0;
        assert!(settings.validate().is_err());
        settings.pipeline.grader_parallelism = 17;
        assert!(settings.validate().is_err());
    }
}
