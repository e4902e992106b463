//! The service root: wires cache, circuit breakers, the main path, and the
//! fallback path behind one `query` entry point with a fixed stage order
//! (cache → intent → retrieve → expand → grade → rerank → quality →
//! generate) and deadline/cancellation handling.

use crate::fallback::FallbackPipeline;
use crate::generator::Generator;
use crate::main_path::MainPath;
use advisor_rag_cache::{BreakerRegistry, CacheEntry, ResponseCache};
use advisor_rag_config::settings::PipelineConfig;
use advisor_rag_core::{
    ChatModel, Endpoint, FeedbackRecord, FeedbackSink, MetricsRecord, MetricsSink, Query,
    QueryResponse, Quality, Retriever, StageTimings,
};
use advisor_rag_llm::PromptRegistry;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{info, warn};

pub struct RagPipeline {
    config: PipelineConfig,
    cache: ResponseCache,
    breakers: BreakerRegistry,
    main_path: MainPath,
    fallback: FallbackPipeline,
    metrics_sink: Arc<dyn MetricsSink>,
    feedback_sink: Arc<dyn FeedbackSink>,
}

impl RagPipeline {
    pub fn new(
        retriever: Arc<dyn Retriever>,
        chat_model: Arc<dyn ChatModel>,
        prompts: PromptRegistry,
        config: PipelineConfig,
        metrics_sink: Arc<dyn MetricsSink>,
        feedback_sink: Arc<dyn FeedbackSink>,
    ) -> Self {
        let breakers = BreakerRegistry::new(config.breaker_threshold, Duration::from_secs(config.breaker_reset_s));
        let generator = Arc::new(Generator::new(chat_model.clone(), prompts));
        let main_path = MainPath::new(
            retriever.clone(),
            chat_model,
            generator.clone(),
            breakers.clone(),
            config.clone(),
        );
        let fallback = FallbackPipeline::new(retriever, generator, config.k_retrieve);

        Self {
            cache: ResponseCache::new(config.cache_max_size),
            breakers,
            main_path,
            fallback,
            metrics_sink,
            feedback_sink,
            config,
        }
    }

    pub async fn query(&self, query: Query) -> QueryResponse {
        let started = Instant::now();
        let cache_eligible = self.config.cache_enabled && !query.has_app_context();

        let fingerprint = ResponseCache::fingerprint(&query.domain, query.prompt_name.as_deref(), &query.text);
        if cache_eligible {
            if let Some(entry) = self.cache.get(&fingerprint) {
                return self.respond_from_cache(&query, entry, started);
            }
        }

        let pipeline_breaker = self.breakers.get("pipeline");
        let (endpoint, answer, citations, quality, intent, doc_count, top_score, error, stage_timings) =
            if pipeline_breaker.allow() {
                match self.run_with_deadline(&query, Duration::from_millis(self.config.request_deadline_ms)).await {
                    Ok(outcome) => {
                        pipeline_breaker.record_success();
                        (
                            Endpoint::Main,
                            outcome.answer,
                            outcome.citations,
                            outcome.quality,
                            outcome.intent,
                            outcome.doc_count,
                            outcome.top_score,
                            None,
                            outcome.timings,
                        )
                    }
                    Err(reason) => {
                        pipeline_breaker.record_failure();
                        warn!(error = %reason, query_id = %query.id, "main path failed, taking fallback");
                        self.run_fallback(&query, Some(reason)).await
                    }
                }
            } else {
                info!(query_id = %query.id, "pipeline breaker open, taking fallback");
                self.run_fallback(&query, None).await
            };

        let total_ms = started.elapsed().as_millis() as u64;
        let timings = StageTimings {
            total_ms: Some(total_ms),
            ..stage_timings
        };

        if cache_eligible && error.is_none() {
            self.cache.put(
                fingerprint,
                CacheEntry {
                    answer: answer.clone(),
                    citations: citations.clone(),
                    quality,
                    intent,
                    created_at: Instant::now(),
                    ttl: Duration::from_secs(self.config.cache_ttl_s),
                },
            );
        }

        self.metrics_sink
            .record(MetricsRecord {
                id: query.id.clone(),
                timestamp: chrono::Utc::now(),
                domain: query.domain.clone(),
                intent,
                quality,
                timings: timings.clone(),
                doc_count,
                top_score,
                endpoint,
                error,
            })
            .await;

        QueryResponse {
            id: query.id,
            answer,
            citations,
            quality,
            intent,
            timings,
        }
    }

    async fn run_with_deadline(
        &self,
        query: &Query,
        deadline: Duration,
    ) -> Result<crate::main_path::MainPathOutcome, String> {
        let generator_timeout = Duration::from_millis(self.config.generator_timeout_ms);
        match tokio::time::timeout(
            deadline,
            self.main_path.run(query, self.config.expander_enabled, generator_timeout),
        )
        .await
        {
            Ok(Ok(outcome)) => Ok(outcome),
            Ok(Err(err)) => Err(err.to_string()),
            Err(_) => Err("request deadline exceeded".to_string()),
        }
    }

    async fn run_fallback(
        &self,
        query: &Query,
        upstream_error: Option<String>,
    ) -> (
        Endpoint,
        String,
        Vec<advisor_rag_core::Citation>,
        Quality,
        advisor_rag_core::Intent,
        usize,
        f32,
        Option<String>,
        StageTimings,
    ) {
        let deadline = Duration::from_millis(self.config.fallback_deadline_ms);
        let result = tokio::time::timeout(
            deadline,
            self.fallback.run(&query.domain, &query.text, &query.app_context, deadline),
        )
        .await;

        match result {
            Ok(Ok((answer, citations, quality))) => (
                Endpoint::Fallback,
                answer,
                citations,
                quality,
                advisor_rag_core::Intent::General,
                0,
                0.0,
                upstream_error,
                StageTimings::default(),
            ),
            Ok(Err(err)) => (
                Endpoint::Fallback,
                "The assistant is temporarily unavailable.".to_string(),
                Vec::new(),
                Quality::Poor,
                advisor_rag_core::Intent::General,
                0,
                0.0,
                Some(upstream_error.unwrap_or_else(|| err.to_string())),
                StageTimings::default(),
            ),
            Err(_) => (
                Endpoint::Fallback,
                "The request timed out.".to_string(),
                Vec::new(),
                Quality::Poor,
                advisor_rag_core::Intent::General,
                0,
                0.0,
                Some("fallback deadline exceeded".to_string()),
                StageTimings::default(),
            ),
        }
    }

    fn respond_from_cache(&self, query: &Query, entry: CacheEntry, started: Instant) -> QueryResponse {
        QueryResponse {
            id: query.id.clone(),
            answer: entry.answer,
            citations: entry.citations,
            quality: entry.quality,
            intent: entry.intent,
            timings: StageTimings {
                total_ms: Some(started.elapsed().as_millis() as u64),
                ..Default::default()
            },
        }
    }

    pub async fn record_feedback(&self, record: FeedbackRecord) {
        self.feedback_sink.record(record).await;
    }

    pub fn cache_stats(&self) -> advisor_rag_cache::CacheStats {
        self.cache.stats()
    }
}
