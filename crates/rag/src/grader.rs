//! Bounded-concurrency per-passage relevance grading.
//!
//! A fixed-size semaphore gates task spawns so the pool never issues more
//! than `parallelism` concurrent grading calls; each task races its own
//! timeout and retries transient failures with jittered backoff. A passage
//! that exhausts its retries is soft-dropped: `grade = irrelevant,
//! confidence = 0`, never aborting the rest of the batch.

use advisor_rag_core::{ChatModel, Grade, Passage};
use rand::Rng;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Semaphore;
use tracing::{debug, warn};

const GRADE_PROMPT: &str = "Judge whether this passage answers the question. Respond with exactly \
two lines:\ngrade: relevant, partial, or irrelevant\nconfidence: a number from 0.0 to 1.0\n\n\
Question: {query}\n\nPassage: {passage}";

#[derive(Debug, Clone)]
pub struct GraderConfig {
    pub parallelism: usize,
    pub timeout: Duration,
    pub max_retries: u32,
    pub initial_backoff: Duration,
    pub jitter_fraction: f64,
}

pub struct Grader {
    chat_model: Arc<dyn ChatModel>,
    config: GraderConfig,
}

impl Grader {
    pub fn new(chat_model: Arc<dyn ChatModel>, config: GraderConfig) -> Self {
        Self { chat_model, config }
    }

    /// Grades every candidate concurrently (bounded by `parallelism`),
    /// mutating `grade`/`grade_confidence` in place. Returns `true` if
    /// every single call failed (the all-graders-failed case).
    pub async fn grade_all(&self, query_text: &str, candidates: &mut [Passage]) -> bool {
        if candidates.is_empty() {
            return false;
        }

        let semaphore = Arc::new(Semaphore::new(self.config.parallelism.max(1)));
        let mut tasks = Vec::with_capacity(candidates.len());

        for (idx, passage) in candidates.iter().enumerate() {
            let semaphore = semaphore.clone();
            let chat_model = self.chat_model.clone();
            let config = self.config.clone();
            let query_text = query_text.to_string();
            let passage_text = passage.text.clone();

            tasks.push(tokio::spawn(async move {
                let _permit = semaphore.acquire_owned().await.expect("semaphore not closed");
                let outcome = grade_with_retry(&chat_model, &config, &query_text, &passage_text).await;
                (idx, outcome)
            }));
        }

        let mut failures = 0usize;
        let total = tasks.len();

        for task in tasks {
            match task.await {
                Ok((idx, Some((grade, confidence)))) => {
                    candidates[idx].grade = grade;
                    candidates[idx].grade_confidence = confidence;
                }
                Ok((idx, None)) => {
                    candidates[idx].grade = Grade::Irrelevant;
                    candidates[idx].grade_confidence = 0.0;
                    failures += 1;
                }
                Err(join_err) => {
                    warn!(error = %join_err, "grader task panicked");
                    failures += 1;
                }
            }
        }

        failures == total
    }
}

async fn grade_with_retry(
    chat_model: &Arc<dyn ChatModel>,
    config: &GraderConfig,
    query_text: &str,
    passage_text: &str,
) -> Option<(Grade, f32)> {
    let mut backoff = config.initial_backoff;

    for attempt in 0..=config.max_retries {
        let prompt = GRADE_PROMPT
            .replace("{query}", query_text)
            .replace("{passage}", passage_text);

        match chat_model.chat(&prompt, config.timeout).await {
            Ok(response) => return Some(parse_grade(&response)),
            Err(err) => {
                debug!(attempt, error = %err, "grader call failed, may retry");
                if attempt == config.max_retries {
                    warn!(error = %err, "grader call exhausted retries, soft-dropping passage");
                    return None;
                }
                let jitter = 1.0 + rand::thread_rng().gen_range(-config.jitter_fraction..=config.jitter_fraction);
                let delay = Duration::from_secs_f64(backoff.as_secs_f64() * jitter);
                tokio::time::sleep(delay).await;
                backoff *= 2;
            }
        }
    }
    None
}

fn parse_grade(response: &str) -> (Grade, f32) {
    let mut grade = Grade::Irrelevant;
    let mut confidence = 0.0_f32;

    for line in response.lines() {
        let lower = line.to_lowercase();
        if let Some(value) = lower.strip_prefix("grade:") {
            let value = value.trim();
            grade = if value.contains("relevant") && !value.contains("irrelevant") {
                Grade::Relevant
            } else if value.contains("partial") {
                Grade::Partial
            } else {
                Grade::Irrelevant
            };
        } else if let Some(value) = lower.strip_prefix("confidence:") {
            if let Ok(parsed) = value.trim().parse::<f32>() {
                confidence = parsed.clamp(0.0, 1.0);
            }
        }
    }

    (grade, confidence)
}

#[cfg(test)]
mod tests {
    use super::*;
    use advisor_rag_core::Result;
    use async_trait::async_trait;

    struct FakeChatModel {
        response: String,
    }

    #[async_trait]
    impl ChatModel for FakeChatModel {
        async fn chat(&self, _prompt: &str, _timeout: Duration) -> Result<String> {
            Ok(self.response.clone())
        }
    }

    struct FailingChatModel;

    #[async_trait]
    impl ChatModel for FailingChatModel {
        async fn chat(&self, _prompt: &str, _timeout: Duration) -> Result<String> {
            Err(advisor_rag_core::Error::Llm("down".to_string()))
        }
    }

    fn test_config() -> GraderConfig {
        GraderConfig {
            parallelism: 4,
            timeout: Duration::from_millis(100),
            max_retries: 1,
            initial_backoff: Duration::from_millis(1),
            jitter_fraction: 0.0,
        }
    }

    #[test]
    fn parses_relevant_grade() {
        let (grade, confidence) = parse_grade("grade: relevant\nconfidence: 0.85");
        assert_eq!(grade, Grade::Relevant);
        assert!((confidence - 0.85).abs() < 1e-6);
    }

    #[test]
    fn parses_irrelevant_grade_with_low_confidence() {
        let (grade, confidence) = parse_grade("grade: irrelevant\nconfidence: 0.1");
        assert_eq!(grade, Grade::Irrelevant);
        assert!(confidence < 0.2);
    }

    #[tokio::test]
    async fn grades_all_candidates_concurrently() {
        let chat_model: Arc<dyn ChatModel> = Arc::new(FakeChatModel {
            response: "grade: relevant\nconfidence: 0.9".to_string(),
        });
        let grader = Grader::new(chat_model, test_config());
        let mut candidates = vec![Passage::new("1", "t", "d.md"), Passage::new("2", "t", "d.md")];
        let all_failed = grader.grade_all("query", &mut candidates).await;
        assert!(!all_failed);
        assert!(candidates.iter().all(|p| p.grade == Grade::Relevant));
    }

    #[tokio::test]
    async fn soft_drops_a_passage_whose_grader_call_exhausts_retries() {
        let chat_model: Arc<dyn ChatModel> = Arc::new(FailingChatModel);
        let grader = Grader::new(chat_model, test_config());
        let mut candidates = vec![Passage::new("1", "t", "d.md")];
        let all_failed = grader.grade_all("query", &mut candidates).await;
        assert!(all_failed);
        assert_eq!(candidates[0].grade, Grade::Irrelevant);
        assert_eq!(candidates[0].grade_confidence, 0.0);
    }

    #[tokio::test]
    async fn empty_candidate_list_is_not_all_graders_failed() {
        let chat_model: Arc<dyn ChatModel> = Arc::new(FailingChatModel);
        let grader = Grader::new(chat_model, test_config());
        let mut candidates: Vec<Passage> = vec![];
        let all_failed = grader.grade_all("query", &mut candidates).await;
        assert!(!all_failed);
    }
}
