//! Orders graded passages by confidence (optionally via an external rerank
//! model), drops irrelevant/low-confidence passages, and keeps the top
//! `k_rerank` survivors.

use advisor_rag_core::{ChatModel, Grade, Passage};
use std::sync::Arc;

pub struct Reranker {
    chat_model: Option<Arc<dyn ChatModel>>,
    confidence_threshold: f32,
    k_rerank: usize,
}

impl Reranker {
    pub fn new(chat_model: Option<Arc<dyn ChatModel>>, confidence_threshold: f32, k_rerank: usize) -> Self {
        Self {
            chat_model,
            confidence_threshold,
            k_rerank,
        }
    }

    pub async fn rerank(&self, query_text: &str, mut candidates: Vec<Passage>) -> Vec<Passage> {
        if let Some(chat_model) = &self.chat_model {
            let texts: Vec<&str> = candidates.iter().map(|p| p.text.as_str()).collect();
            if let Ok(Some(scores)) = chat_model.rerank(query_text, &texts).await {
                for (passage, score) in candidates.iter_mut().zip(scores) {
                    passage.grade_confidence = score;
                }
            }
        }

        candidates.retain(|p| p.grade != Grade::Irrelevant && p.grade_confidence >= self.confidence_threshold);

        candidates.sort_by(|a, b| {
            b.grade_confidence
                .partial_cmp(&a.grade_confidence)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| b.fused_score.partial_cmp(&a.fused_score).unwrap_or(std::cmp::Ordering::Equal))
        });

        candidates.truncate(self.k_rerank);
        candidates
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn passage(id: &str, grade: Grade, confidence: f32, fused: f32) -> Passage {
        let mut p = Passage::new(id, "text", "doc.md");
        p.grade = grade;
        p.grade_confidence = confidence;
        p.fused_score = fused;
        p
    }

    #[tokio::test]
    async fn drops_irrelevant_and_low_confidence_passages() {
        let reranker = Reranker::new(None, 0.3, 5);
        let candidates = vec![
            passage("1", Grade::Relevant, 0.9, 0.5),
            passage("2", Grade::Irrelevant, 0.9, 0.5),
            passage("3", Grade::Partial, 0.1, 0.5),
        ];
        let survivors = reranker.rerank("query", candidates).await;
        assert_eq!(survivors.len(), 1);
        assert_eq!(survivors[0].id, "1");
    }

    #[tokio::test]
    async fn orders_by_confidence_then_fused_score_ties() {
        let reranker = Reranker::new(None, 0.3, 5);
        let candidates = vec![
            passage("1", Grade::Relevant, 0.8, 0.3),
            passage("2", Grade::Relevant, 0.8, 0.9),
        ];
        let survivors = reranker.rerank("query", candidates).await;
        assert_eq!(survivors[0].id, "2");
    }

    #[tokio::test]
    async fn truncates_to_k_rerank() {
        let reranker = Reranker::new(None, 0.0, 2);
        let candidates = vec![
            passage("1", Grade::Relevant, 0.9, 0.1),
            passage("2", Grade::Relevant, 0.8, 0.1),
            passage("3", Grade::Relevant, 0.7, 0.1),
        ];
        let survivors = reranker.rerank("query", candidates).await;
        assert_eq!(survivors.len(), 2);
    }
}
