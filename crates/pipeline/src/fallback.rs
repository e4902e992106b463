//! Fallback path (v1): a minimal linear pipeline used whenever the main
//! pipeline's circuit breaker is open. Same response schema, cache rules,
//! and metrics schema as the main path; no grading or rerank.

use crate::generator::Generator;
use advisor_rag_core::{Citation, ContextValue, Intent, Passage, Quality, Result, Retriever};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

pub struct FallbackPipeline {
    retriever: Arc<dyn Retriever>,
    generator: Arc<Generator>,
    k_retrieve: usize,
}

impl FallbackPipeline {
    pub fn new(retriever: Arc<dyn Retriever>, generator: Arc<Generator>, k_retrieve: usize) -> Self {
        Self {
            retriever,
            generator,
            k_retrieve,
        }
    }

    pub async fn run(
        &self,
        domain: &str,
        query_text: &str,
        app_context: &HashMap<String, ContextValue>,
        timeout: Duration,
    ) -> Result<(String, Vec<Citation>, Quality)> {
        let vector = self.retriever.embed(query_text).await?;
        let hits = self
            .retriever
            .search_semantic(domain, &vector, self.k_retrieve)
            .await
            .unwrap_or_default();

        let passages: Vec<Passage> = hits
            .into_iter()
            .map(|hit| {
                let mut p = Passage::new(hit.id, hit.text, hit.source_path);
                p.chunk_index = hit.chunk_index;
                p.semantic_score = hit.score;
                p.fused_score = hit.score;
                p.grade = advisor_rag_core::Grade::Relevant;
                p.grade_confidence = hit.score;
                p
            })
            .collect();

        let quality = if passages.is_empty() { Quality::Poor } else { Quality::Ambiguous };

        let (answer, citations) = self
            .generator
            .generate(
                query_text,
                Some("fallback_default"),
                Intent::General,
                app_context,
                &passages,
                quality,
                timeout,
            )
            .await?;

        Ok((answer, citations, quality))
    }
}
