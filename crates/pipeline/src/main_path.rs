//! The main agentic path: retrieve, optionally expand, grade, rerank,
//! assess quality, generate. Fixed stage topology; no cycles.

use crate::generator::Generator;
use advisor_rag_cache::BreakerRegistry;
use advisor_rag_config::settings::{IntentClassifierMode, PipelineConfig};
use advisor_rag_core::{ChatModel, Citation, Intent, Quality, Query, Result, Retriever, StageTimings};
use advisor_rag_rag::grader::{Grader, GraderConfig};
use advisor_rag_rag::reranker::Reranker;
use advisor_rag_rag::{expander, fusion::HybridRetriever, intent, quality};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::warn;

pub struct MainPath {
    hybrid_retriever: HybridRetriever,
    grader: Grader,
    reranker: Reranker,
    generator: Arc<Generator>,
    chat_model: Arc<dyn ChatModel>,
    breakers: BreakerRegistry,
    config: PipelineConfig,
}

pub struct MainPathOutcome {
    pub answer: String,
    pub citations: Vec<Citation>,
    pub quality: Quality,
    pub intent: Intent,
    pub doc_count: usize,
    pub top_score: f32,
    pub timings: StageTimings,
}

impl MainPath {
    pub fn new(
        retriever: Arc<dyn Retriever>,
        chat_model: Arc<dyn ChatModel>,
        generator: Arc<Generator>,
        breakers: BreakerRegistry,
        config: PipelineConfig,
    ) -> Self {
        let grader_config = GraderConfig {
            parallelism: config.grader_parallelism,
            timeout: Duration::from_millis(config.grader_timeout_ms),
            max_retries: advisor_rag_config::constants::timeouts::GRADER_MAX_RETRIES,
            initial_backoff: Duration::from_millis(
                advisor_rag_config::constants::timeouts::GRADER_INITIAL_BACKOFF_MS,
            ),
            jitter_fraction: advisor_rag_config::constants::timeouts::GRADER_JITTER_FRACTION,
        };

        Self {
            hybrid_retriever: HybridRetriever::new(retriever, config.clone()),
            grader: Grader::new(chat_model.clone(), grader_config),
            reranker: Reranker::new(None, config.rerank_confidence_threshold, config.k_rerank),
            generator,
            chat_model,
            breakers,
            config,
        }
    }

    pub async fn run(
        &self,
        query: &Query,
        expander_enabled: bool,
        generator_timeout: Duration,
    ) -> Result<MainPathOutcome> {
        let classified_intent = match self.config.intent_classifier_mode {
            IntentClassifierMode::Keyword => intent::classify_by_keyword(&query.text),
            IntentClassifierMode::Llm => {
                intent::classify_by_llm(&self.chat_model, &query.text, Duration::from_millis(self.config.grader_timeout_ms)).await
            }
        };

        let mut retrieval_text = query.text.clone();
        if expander_enabled && expander::should_expand(&query.text, 6) {
            retrieval_text = expander::expand_query(
                &self.chat_model,
                &query.text,
                Duration::from_millis(self.config.grader_timeout_ms),
            )
            .await;
        }

        let retrieve_started = Instant::now();
        let mut candidates = self.hybrid_retriever.retrieve(&query.domain, &retrieval_text).await?;
        let retrieve_ms = retrieve_started.elapsed().as_millis() as u64;

        let top_score = candidates.iter().map(|p| p.fused_score).fold(0.0_f32, f32::max);
        let doc_count = candidates.len();

        let grade_started = Instant::now();
        let all_graders_failed = if candidates.is_empty() {
            false
        } else {
            self.grader.grade_all(&query.text, &mut candidates).await
        };
        let grade_ms = grade_started.elapsed().as_millis() as u64;

        let rerank_started = Instant::now();
        let (survivors, quality_signal) = if all_graders_failed {
            warn!(query_id = %query.id, "all grader calls failed, proceeding ungraded");
            candidates.sort_by(|a, b| b.fused_score.partial_cmp(&a.fused_score).unwrap_or(std::cmp::Ordering::Equal));
            candidates.truncate(self.config.k_rerank);
            (candidates, Quality::Poor)
        } else {
            let survivors = self.reranker.rerank(&query.text, candidates).await;
            let quality_signal = quality::assess(&survivors, self.config.quality_good_confidence);
            (survivors, quality_signal)
        };
        let rerank_ms = rerank_started.elapsed().as_millis() as u64;

        let llm_breaker = self.breakers.get("llm");
        if !llm_breaker.allow() {
            return Err(advisor_rag_core::Error::BreakerOpen("llm".to_string()));
        }

        let generate_started = Instant::now();
        let (answer, citations) = match self
            .generator
            .generate(
                &query.text,
                query.prompt_name.as_deref(),
                classified_intent,
                &query.app_context,
                &survivors,
                quality_signal,
                generator_timeout,
            )
            .await
        {
            Ok((answer, citations)) => {
                llm_breaker.record_success();
                (answer, citations)
            }
            Err(err) => {
                llm_breaker.record_failure();
                warn!(error = %err, query_id = %query.id, "generator call failed, returning canned message");
                (crate::generator::UNAVAILABLE_MESSAGE.to_string(), Vec::new())
            }
        };
        let generate_ms = generate_started.elapsed().as_millis() as u64;

        Ok(MainPathOutcome {
            answer,
            citations,
            quality: quality_signal,
            intent: classified_intent,
            doc_count,
            top_score,
            timings: StageTimings {
                retrieve_ms: Some(retrieve_ms),
                grade_ms: Some(grade_ms),
                rerank_ms: Some(rerank_ms),
                generate_ms: Some(generate_ms),
                total_ms: None,
            },
        })
    }
}
