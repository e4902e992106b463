//! Centralized tunable defaults, mirroring the source's split between
//! infrastructure endpoints and algorithm constants.

/// Service endpoints, env-overridable with sane local defaults.
pub mod endpoints {
    use once_cell::sync::Lazy;

    /// Qdrant vector store endpoint (env: `QDRANT_URL`).
    pub static QDRANT_DEFAULT: Lazy<String> = Lazy::new(|| {
        std::env::var("QDRANT_URL").unwrap_or_else(|_| "http://127.0.0.1:6333".to_string())
    });

    /// LLM provider endpoint (env: `LLM_URL`).
    pub static LLM_DEFAULT: Lazy<String> = Lazy::new(|| {
        std::env::var("LLM_URL").unwrap_or_else(|_| "http://localhost:11434".to_string())
    });
}

/// Retrieval, grading, and reranking defaults.
pub mod rag {
    /// Fusion weight for the semantic (dense) leg.
    pub const W_SEMANTIC: f64 = 0.6;
    /// Fusion weight for the lexical (BM25) leg.
    pub const W_BM25: f64 = 0.4;
    /// Reciprocal-rank-fusion smoothing constant.
    pub const RRF_K: f64 = 60.0;
    /// Candidates returned by the retriever.
    pub const K_RETRIEVE: usize = 10;
    /// Survivors kept after rerank, fed to the generator.
    pub const K_RERANK: usize = 5;
    /// Minimum grader confidence kept by the reranker.
    pub const RERANK_CONFIDENCE_THRESHOLD: f64 = 0.3;
    /// Tie-break window for the priority boost (fraction of fused score).
    pub const PRIORITY_BOOST_TIE_WINDOW: f64 = 0.05;
    /// Minimum top confidence for `quality = good`.
    pub const QUALITY_GOOD_CONFIDENCE: f64 = 0.7;
}

/// Timeouts and concurrency limits (milliseconds unless noted).
pub mod timeouts {
    pub const GRADER_TIMEOUT_MS: u64 = 3_000;
    pub const GENERATOR_TIMEOUT_MS: u64 = 10_000;
    pub const REQUEST_DEADLINE_MS: u64 = 15_000;
    pub const FALLBACK_DEADLINE_MS: u64 = 5_000;
    pub const GRADER_MAX_RETRIES: u32 = 2;
    pub const GRADER_INITIAL_BACKOFF_MS: u64 = 250;
    pub const GRADER_JITTER_FRACTION: f64 = 0.25;
}

/// Cache and circuit breaker defaults.
pub mod resilience {
    pub const CACHE_TTL_S: u64 = 3_600;
    pub const CACHE_MAX_SIZE: usize = 1_000;
    pub const BREAKER_THRESHOLD: u32 = 5;
    pub const BREAKER_RESET_S: u64 = 60;
    pub const INFLIGHT_CAP: usize = 32;
    pub const GRADER_PARALLELISM: usize = 16;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fusion_weights_sum_to_one() {
        assert!((rag::W_SEMANTIC + rag::W_BM25 - 1.0).abs() < 1e-9);
    }

    #[test]
    fn rrf_k_is_positive() {
        assert!(rag::RRF_K > 0.0);
    }

    #[test]
    fn timeouts_are_positive() {
        assert!(timeouts::GRADER_TIMEOUT_MS > 0);
        assert!(timeouts::REQUEST_DEADLINE_MS > timeouts::FALLBACK_DEADLINE_MS);
    }
}
