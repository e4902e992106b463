//! Hybrid retrieval: runs the semantic and lexical legs concurrently and
//! fuses them with weighted reciprocal rank fusion plus a priority tie-break.

use advisor_rag_core::{Passage, PassageMetadata, Priority, Result, Retriever, RetrievedHit};
use advisor_rag_config::settings::PipelineConfig;
use std::collections::HashMap;
use std::sync::Arc;

pub struct HybridRetriever {
    retriever: Arc<dyn Retriever>,
    config: PipelineConfig,
}

struct FusionAccumulator {
    hit: RetrievedHit,
    semantic_score: f32,
    lexical_score: f32,
    semantic_term: f64,
    lexical_term: f64,
}

impl HybridRetriever {
    pub fn new(retriever: Arc<dyn Retriever>, config: PipelineConfig) -> Self {
        Self { retriever, config }
    }

    /// Runs both retrieval legs over `retrieval_text` (the expanded query
    /// string when expansion ran, otherwise the original) and returns the
    /// top `k_retrieve` candidates, fused and priority-boosted.
    pub async fn retrieve(&self, collection: &str, retrieval_text: &str) -> Result<Vec<Passage>> {
        let vector = self.retriever.embed(retrieval_text).await?;

        let k = self.config.k_retrieve;
        let (semantic, lexical) = tokio::join!(
            self.retriever.search_semantic(collection, &vector, k),
            self.retriever.search_lexical(collection, retrieval_text, k)
        );

        Ok(self.fuse(semantic?, lexical?))
    }

    fn fuse(&self, semantic: Vec<RetrievedHit>, lexical: Vec<RetrievedHit>) -> Vec<Passage> {
        let rrf_k = self.config.rrf_k as f64;
        let w_sem = self.config.w_semantic as f64;
        let w_bm = self.config.w_bm25 as f64;

        let mut acc: HashMap<String, FusionAccumulator> = HashMap::new();

        for (rank, hit) in semantic.into_iter().enumerate() {
            let term = w_sem * (1.0 / (rrf_k + (rank + 1) as f64));
            let score = hit.score;
            acc.entry(hit.id.clone())
                .and_modify(|a| {
                    a.semantic_score = score;
                    a.semantic_term = term;
                })
                .or_insert(FusionAccumulator {
                    hit,
                    semantic_score: score,
                    lexical_score: 0.0,
                    semantic_term: term,
                    lexical_term: 0.0,
                });
        }

        for (rank, hit) in lexical.into_iter().enumerate() {
            let term = w_bm * (1.0 / (rrf_k + (rank + 1) as f64));
            let raw_score = hit.score;
            acc.entry(hit.id.clone())
                .and_modify(|a| {
                    a.lexical_score = raw_score;
                    a.lexical_term = term;
                })
                .or_insert(FusionAccumulator {
                    hit,
                    semantic_score: 0.0,
                    lexical_score: raw_score,
                    semantic_term: 0.0,
                    lexical_term: term,
                });
        }

        let mut candidates: Vec<FusionAccumulator> = acc.into_values().collect();
        candidates.sort_by(|a, b| {
            let score_a = a.semantic_term + a.lexical_term;
            let score_b = b.semantic_term + b.lexical_term;
            score_b.partial_cmp(&score_a).unwrap_or(std::cmp::Ordering::Equal)
        });

        let mut passages: Vec<Passage> = candidates
            .into_iter()
            .map(|a| {
                let fused_score = (a.semantic_term + a.lexical_term) as f32;
                let metadata = parse_metadata(&a.hit.metadata);
                Passage {
                    id: a.hit.id,
                    text: a.hit.text,
                    source_path: a.hit.source_path,
                    chunk_index: a.hit.chunk_index,
                    metadata,
                    semantic_score: a.semantic_score,
                    lexical_score: a.lexical_score,
                    fused_score,
                    grade: advisor_rag_core::Grade::Ungraded,
                    grade_confidence: 0.0,
                }
            })
            .collect();

        apply_priority_boost(
            &mut passages,
            advisor_rag_config::constants::rag::PRIORITY_BOOST_TIE_WINDOW as f32,
        );
        passages.truncate(self.config.k_retrieve);
        passages
    }
}

fn parse_metadata(raw: &HashMap<String, String>) -> PassageMetadata {
    let priority = raw
        .get("priority")
        .and_then(|s| match s.as_str() {
            "critical" => Some(Priority::Critical),
            "high" => Some(Priority::High),
            "normal" => Some(Priority::Normal),
            "low" => Some(Priority::Low),
            _ => None,
        })
        .unwrap_or_default();

    PassageMetadata {
        document_type: raw.get("document_type").cloned(),
        priority,
        extra: raw.clone(),
    }
}

/// Within a `tie_window` fraction of the top score, reorders candidates by
/// priority boost multiplier rather than raw fused score, so a critical
/// passage wins a close tie against a normal-priority one.
fn apply_priority_boost(passages: &mut [Passage], tie_window: f32) {
    if passages.is_empty() {
        return;
    }
    let top = passages[0].fused_score;
    if top <= 0.0 {
        return;
    }

    let mut i = 0;
    while i < passages.len() {
        let mut j = i + 1;
        while j < passages.len() && (top - passages[j].fused_score) / top <= tie_window {
            j += 1;
        }
        passages[i..j].sort_by(|a, b| {
            let boosted_a = a.fused_score * a.metadata.priority.boost_multiplier();
            let boosted_b = b.fused_score * b.metadata.priority.boost_multiplier();
            boosted_b
                .partial_cmp(&boosted_a)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        i = j;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use advisor_rag_core::CollectionStats;
    use async_trait::async_trait;

    struct FakeRetriever {
        semantic: Vec<RetrievedHit>,
        lexical: Vec<RetrievedHit>,
    }

    #[async_trait]
    impl Retriever for FakeRetriever {
        async fn embed(&self, _text: &str) -> Result<Vec<f32>> {
            Ok(vec![0.1, 0.2, 0.3])
        }

        async fn search_semantic(
            &self,
            _collection: &str,
            _vector: &[f32],
            _k: usize,
        ) -> Result<Vec<RetrievedHit>> {
            Ok(self.semantic.clone())
        }

        async fn search_lexical(
            &self,
            _collection: &str,
            _text: &str,
            _k: usize,
        ) -> Result<Vec<RetrievedHit>> {
            Ok(self.lexical.clone())
        }

        async fn stats(&self, _collection: &str) -> Result<CollectionStats> {
            Ok(CollectionStats {
                doc_count: 2,
                embedding_dim: 3,
            })
        }
    }

    fn hit(id: &str, score: f32) -> RetrievedHit {
        RetrievedHit {
            id: id.to_string(),
            text: format!("text-{}", id),
            source_path: "doc.md".to_string(),
            chunk_index: 0,
            metadata: HashMap::new(),
            score,
        }
    }

    #[tokio::test]
    async fn fuses_and_ranks_by_combined_score() {
        let retriever: Arc<dyn Retriever> = Arc::new(FakeRetriever {
            semantic: vec![hit("a", 0.9), hit("b", 0.5)],
            lexical: vec![hit("b", 10.0), hit("a", 2.0)],
        });
        let hybrid = HybridRetriever::new(retriever, PipelineConfig::default());
        let passages = hybrid.retrieve("investments", "query").await.unwrap();
        assert_eq!(passages.len(), 2);
        assert!(passages[0].fused_score >= passages[1].fused_score);
    }

    #[tokio::test]
    async fn empty_lexical_leg_still_returns_semantic_results() {
        let retriever: Arc<dyn Retriever> = Arc::new(FakeRetriever {
            semantic: vec![hit("a", 0.9)],
            lexical: vec![],
        });
        let hybrid = HybridRetriever::new(retriever, PipelineConfig::default());
        let passages = hybrid.retrieve("investments", "query").await.unwrap();
        assert_eq!(passages.len(), 1);
        assert_eq!(passages[0].id, "a");
    }

    #[tokio::test]
    async fn both_legs_empty_yields_empty_result() {
        let retriever: Arc<dyn Retriever> = Arc::new(FakeRetriever {
            semantic: vec![],
            lexical: vec![],
        });
        let hybrid = HybridRetriever::new(retriever, PipelineConfig::default());
        let passages = hybrid.retrieve("investments", "query").await.unwrap();
        assert!(passages.is_empty());
    }

    #[test]
    fn priority_boost_reorders_within_tie_window() {
        let mut passages = vec![
            {
                let mut p = Passage::new("1", "t", "d.md");
                p.fused_score = 1.0;
                p.metadata.priority = Priority::Normal;
                p
            },
            {
                let mut p = Passage::new("2", "t", "d.md");
                p.fused_score = 0.98;
                p.metadata.priority = Priority::Critical;
                p
            },
        ];
        apply_priority_boost(&mut passages, 0.05);
        assert_eq!(passages[0].id, "2");
    }

    #[test]
    fn priority_boost_does_not_reorder_outside_tie_window() {
        let mut passages = vec![
            {
                let mut p = Passage::new("1", "t", "d.md");
                p.fused_score = 1.0;
                p.metadata.priority = Priority::Normal;
                p
            },
            {
                let mut p = Passage::new("2", "t", "d.md");
                p.fused_score = 0.5;
                p.metadata.priority = Priority::Critical;
                p
            },
        ];
        apply_priority_boost(&mut passages, 0.05);
        assert_eq!(passages[0].id, "1");
    }
}
