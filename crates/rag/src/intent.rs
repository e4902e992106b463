//! Intent classification: an LLM-first classifier with a deterministic
//! keyword-table fallback, selectable as a first-class mode.

use advisor_rag_core::{ChatModel, Intent};
use std::sync::Arc;
use std::time::Duration;
use tracing::warn;

const CLASSIFY_PROMPT: &str = "Classify this wealth-management question into exactly one label: \
archetype, portfolio, risk, monte_carlo, esg, general. Respond with only the label.\n\n\
Question: {query}";

/// Curated per-intent keyword lists, checked in a fixed priority order so a
/// query matching multiple lists still resolves deterministically.
const KEYWORD_TABLE: &[(Intent, &[&str])] = &[
    (
        Intent::MonteCarlo,
        &["monte carlo", "simulation", "percentile", "probability of success"],
    ),
    (
        Intent::Esg,
        &["esg", "emissions", "carbon intensity", "financed emissions", "sustainable"],
    ),
    (
        Intent::Risk,
        &["volatility", "drawdown", "sharpe", "standard deviation", "value at risk", "var"],
    ),
    (
        Intent::Archetype,
        &["archetype", "investor profile", "risk tolerance profile"],
    ),
    (
        Intent::Portfolio,
        &["portfolio", "holdings", "allocation", "rebalance", "asset mix"],
    ),
];

pub fn classify_by_keyword(query_text: &str) -> Intent {
    let lower = query_text.to_lowercase();
    for (intent, keywords) in KEYWORD_TABLE {
        if keywords.iter().any(|k| lower.contains(k)) {
            return *intent;
        }
    }
    Intent::General
}

pub async fn classify_by_llm(chat_model: &Arc<dyn ChatModel>, query_text: &str, timeout: Duration) -> Intent {
    let prompt = CLASSIFY_PROMPT.replace("{query}", query_text);
    match chat_model.chat(&prompt, timeout).await {
        Ok(response) => parse_label(&response).unwrap_or_else(|| classify_by_keyword(query_text)),
        Err(err) => {
            warn!(error = %err, "intent classification call failed, falling back to keyword table");
            classify_by_keyword(query_text)
        }
    }
}

fn parse_label(response: &str) -> Option<Intent> {
    let label = response.trim().to_lowercase();
    match label.as_str() {
        "archetype" => Some(Intent::Archetype),
        "portfolio" => Some(Intent::Portfolio),
        "risk" => Some(Intent::Risk),
        "monte_carlo" | "monte carlo" => Some(Intent::MonteCarlo),
        "esg" => Some(Intent::Esg),
        "general" => Some(Intent::General),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keyword_table_matches_monte_carlo() {
        assert_eq!(
            classify_by_keyword("What is the probability of success for my plan?"),
            Intent::MonteCarlo
        );
    }

    #[test]
    fn keyword_table_matches_esg() {
        assert_eq!(classify_by_keyword("How are financed emissions calculated?"), Intent::Esg);
    }

    #[test]
    fn keyword_table_falls_back_to_general() {
        assert_eq!(classify_by_keyword("What's the weather today?"), Intent::General);
    }

    #[test]
    fn parse_label_handles_known_labels() {
        assert_eq!(parse_label("esg"), Some(Intent::Esg));
        assert_eq!(parse_label(" General \n"), Some(Intent::General));
    }

    #[test]
    fn parse_label_rejects_malformed_output() {
        assert_eq!(parse_label("I'm not sure, maybe portfolio?"), None);
    }
}
