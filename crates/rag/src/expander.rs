//! Optional LLM-based query expansion. Runs at most once per query; the
//! expanded string feeds both retrieval legs identically. The displayed
//! query text is never mutated — only the string handed to the retriever.

use advisor_rag_core::ChatModel;
use std::sync::Arc;
use std::time::Duration;
use tracing::warn;

const EXPANSION_PROMPT: &str = "List 3 to 8 short search terms related to this wealth-management \
question, one per line, no numbering, no explanation.\n\nQuestion: {query}";

/// A query is a candidate for expansion when it is short or unusually
/// sparse in distinguishing keywords.
pub fn should_expand(query_text: &str, word_count_threshold: usize) -> bool {
    query_text.split_whitespace().count() <= word_count_threshold
}

pub async fn expand_query(
    chat_model: &Arc<dyn ChatModel>,
    query_text: &str,
    timeout: Duration,
) -> String {
    let prompt = EXPANSION_PROMPT.replace("{query}", query_text);
    match chat_model.chat(&prompt, timeout).await {
        Ok(response) => {
            let terms: Vec<&str> = response
                .lines()
                .map(str::trim)
                .filter(|l| !l.is_empty())
                .take(8)
                .collect();
            if terms.is_empty() {
                query_text.to_string()
            } else {
                format!("{} {}", query_text, terms.join(" "))
            }
        }
        Err(err) => {
            warn!(error = %err, "query expansion failed, falling back to original query");
            query_text.to_string()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_query_is_expansion_candidate() {
        assert!(should_expand("risk metrics", 4));
    }

    #[test]
    fn long_query_is_not_expansion_candidate() {
        assert!(!should_expand(
            "what does my ninety fifth percentile outcome mean for retirement planning",
            4
        ));
    }
}
