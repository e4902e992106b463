//! Synthesises the final answer: prompt selection, context injection,
//! generation, and deterministic citation renumbering.

use advisor_rag_core::{Citation, ContextValue, Intent, Passage, Quality, Result};
use advisor_rag_core::ChatModel;
use advisor_rag_llm::PromptRegistry;
use regex::Regex;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

const POOR_QUALITY_DISCLAIMER: &str = "I don't have enough information to answer precisely; ";
pub const UNAVAILABLE_MESSAGE: &str = "The assistant is temporarily unavailable.";

pub struct Generator {
    chat_model: Arc<dyn ChatModel>,
    prompts: PromptRegistry,
}

impl Generator {
    pub fn new(chat_model: Arc<dyn ChatModel>, prompts: PromptRegistry) -> Self {
        Self { chat_model, prompts }
    }

    /// Generates an answer and its renumbered citation list from the
    /// survivor passages. Never fails on empty survivors: an empty context
    /// still produces a grounded "I don't know" style reply. Fails with
    /// `Error::GeneratorFailed` when the underlying chat call fails; the
    /// caller is responsible for the canned-message/breaker-failure policy.
    pub async fn generate(
        &self,
        query_text: &str,
        prompt_name: Option<&str>,
        intent: Intent,
        app_context: &HashMap<String, ContextValue>,
        survivors: &[Passage],
        quality: Quality,
        timeout: Duration,
    ) -> Result<(String, Vec<Citation>)> {
        let template = self.prompts.resolve(prompt_name, intent)?;
        let context = build_context(survivors);
        let rewritten_query = inject_context(query_text, app_context);

        let prompt = format!(
            "{}{}",
            template.render(&context, &rewritten_query),
            advisor_rag_llm::templates::brevity_contract()
        );

        let raw_answer = self
            .chat_model
            .chat(&prompt, timeout)
            .await
            .map_err(|err| advisor_rag_core::Error::GeneratorFailed(err.to_string()))?;

        let (mut answer, citations) = renumber_citations(&raw_answer, survivors);

        if quality == Quality::Poor {
            answer = format!("{}{}", POOR_QUALITY_DISCLAIMER, answer);
        }

        Ok((answer, citations))
    }
}

fn build_context(survivors: &[Passage]) -> String {
    survivors
        .iter()
        .enumerate()
        .map(|(i, p)| format!("[{}] ({}) {}", i + 1, p.source_path, p.text))
        .collect::<Vec<_>>()
        .join("\n\n")
}

/// Inlines `app_context` values into the query text deterministically. The
/// original `query.text` is never mutated; this produces a new string used
/// only as the `{query}` template input.
fn inject_context(query_text: &str, app_context: &HashMap<String, ContextValue>) -> String {
    if app_context.is_empty() {
        return query_text.to_string();
    }

    let mut keys: Vec<&String> = app_context.keys().collect();
    keys.sort();

    let parts: Vec<String> = keys
        .into_iter()
        .map(|key| {
            let value = &app_context[key];
            format!("my {} is {}", key.replace('_', " "), value)
        })
        .collect();

    format!("{} ({}.)", query_text, parts.join("; "))
}

/// Rewrites `[n]` markers in `answer` into a gapless `1..m` sequence in
/// order of first appearance, dropping markers that don't index a real
/// survivor. Returns the rewritten answer and the matching citation list.
fn renumber_citations(answer: &str, survivors: &[Passage]) -> (String, Vec<Citation>) {
    let marker = Regex::new(r"\[(\d+)\]").expect("static regex is valid");

    let mut assigned: HashMap<usize, usize> = HashMap::new();
    let mut citations = Vec::new();
    let mut next = 1usize;

    let rewritten = marker.replace_all(answer, |caps: &regex::Captures| {
        let original: usize = caps[1].parse().unwrap_or(0);
        if original == 0 || original > survivors.len() {
            return String::new();
        }
        let new_index = *assigned.entry(original).or_insert_with(|| {
            citations.push(Citation::from(&survivors[original - 1]));
            let assigned_index = next;
            next += 1;
            assigned_index
        });
        format!("[{}]", new_index)
    });

    (rewritten.into_owned(), citations)
}

#[cfg(test)]
mod tests {
    use super::*;
    use advisor_rag_core::{Error, Grade};

    struct FakeChatModel {
        response: Result<String>,
    }

    #[async_trait::async_trait]
    impl ChatModel for FakeChatModel {
        async fn chat(&self, _prompt: &str, _timeout: Duration) -> Result<String> {
            match &self.response {
                Ok(s) => Ok(s.clone()),
                Err(_) => Err(Error::Llm("down".to_string())),
            }
        }
    }

    fn survivor(id: &str, path: &str) -> Passage {
        let mut p = Passage::new(id, "text", path);
        p.grade = Grade::Relevant;
        p.grade_confidence = 0.8;
        p
    }

    #[test]
    fn injects_app_context_deterministically() {
        let mut ctx = HashMap::new();
        ctx.insert("percentile_95".to_string(), ContextValue::Number(2_500_000.0));
        let rewritten = inject_context("What does my 95th percentile mean?", &ctx);
        assert!(rewritten.contains("percentile 95"));
        assert!(rewritten.contains("2500000"));
    }

    #[test]
    fn leaves_query_unchanged_without_app_context() {
        let ctx = HashMap::new();
        assert_eq!(inject_context("hello", &ctx), "hello");
    }

    #[test]
    fn renumbers_citations_to_gapless_prefix() {
        let survivors = vec![survivor("1", "a.md"), survivor("2", "b.md")];
        let (answer, citations) = renumber_citations("See [2] and also [2] again, then [1].", &survivors);
        assert_eq!(answer, "See [1] and also [1] again, then [2].");
        assert_eq!(citations.len(), 2);
        assert_eq!(citations[0].source_path, "b.md");
        assert_eq!(citations[1].source_path, "a.md");
    }

    #[test]
    fn drops_citation_markers_with_no_matching_survivor() {
        let survivors = vec![survivor("1", "a.md")];
        let (answer, citations) = renumber_citations("See [1] and [5].", &survivors);
        assert_eq!(answer, "See [1] and .");
        assert_eq!(citations.len(), 1);
    }

    #[tokio::test]
    async fn returns_generator_failed_when_chat_call_fails() {
        let chat_model: Arc<dyn ChatModel> = Arc::new(FakeChatModel {
            response: Err(Error::Llm("down".to_string())),
        });
        let prompts = PromptRegistry::load_default().unwrap();
        let generator = Generator::new(chat_model, prompts);
        let err = generator
            .generate(
                "hello",
                None,
                Intent::General,
                &HashMap::new(),
                &[],
                Quality::Poor,
                Duration::from_secs(1),
            )
            .await
            .unwrap_err();
        assert!(matches!(err, Error::GeneratorFailed(_)));
    }

    #[tokio::test]
    async fn prepends_disclaimer_when_quality_is_poor() {
        let chat_model: Arc<dyn ChatModel> = Arc::new(FakeChatModel {
            response: Ok("No relevant info found.".to_string()),
        });
        let prompts = PromptRegistry::load_default().unwrap();
        let generator = Generator::new(chat_model, prompts);
        let (answer, _) = generator
            .generate(
                "weather?",
                None,
                Intent::General,
                &HashMap::new(),
                &[],
                Quality::Poor,
                Duration::from_secs(1),
            )
            .await
            .unwrap();
        assert!(answer.starts_with(POOR_QUALITY_DISCLAIMER));
    }
}
