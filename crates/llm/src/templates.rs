//! Literal bodies for the required prompt template set. Every body uses
//! only `{context}` and `{query}` placeholders; `PromptRegistry::load_default`
//! enforces that at construction.

const BREVITY_CONTRACT: &str = "Answer in at most 80 words. No preamble, no closing summary. \
Cite sources inline as [n], where n indexes the numbered sources in the context, starting at 1 \
with no gaps.";

pub const ARCHETYPE_DEFAULT: &str = "You are a wealth-management assistant answering questions \
about investor archetypes and portfolio models.\n\nSources:\n{context}\n\nQuestion: {query}\n\n";

pub const PORTFOLIO_DEFAULT: &str = "You are a wealth-management assistant answering questions \
about portfolio composition and holdings.\n\nSources:\n{context}\n\nQuestion: {query}\n\n";

pub const RISK_METRICS_INTERPRETER_CITED: &str = "You are a wealth-management assistant \
explaining risk metrics (volatility, drawdown, Sharpe ratio, VaR) in plain language, grounded \
only in the sources below.\n\nSources:\n{context}\n\nQuestion: {query}\n\n";

pub const MONTE_CARLO_INTERPRETER_CITED: &str = "You are a wealth-management assistant \
interpreting Monte Carlo simulation results. Always lead with the median (50th percentile) \
outcome, then the probability of success, then the full range. Never open with a pessimistic \
percentile.\n\nSources:\n{context}\n\nQuestion: {query}\n\n";

pub const ESG_ANALYSIS_CITED: &str = "You are a wealth-management assistant explaining ESG \
metrics and methodology, grounded only in the sources below. If the question asks how something \
is calculated, derived, or its formula/methodology, structure the answer as four labelled \
sections in this order: COMPONENTS (a short definitions list), FORMULA (a fenced code block), \
EXAMPLE (one worked numeric example), INTERPRETATION (one sentence).\n\nSources:\n{context}\n\n\
Question: {query}\n\n";

pub const GENERAL_DEFAULT: &str = "You are a wealth-management assistant. Answer only from the \
sources below.\n\nSources:\n{context}\n\nQuestion: {query}\n\n";

/// Used by the fallback path: no grading/rerank context, so the instruction
/// is simpler, but the response schema contract is identical.
pub const FALLBACK_DEFAULT: &str = "You are a wealth-management assistant. Answer from the \
sources below if they are relevant; otherwise say you don't have enough information.\n\n\
Sources:\n{context}\n\nQuestion: {query}\n\n";

/// The required template set, each paired with the shared brevity
/// instruction appended at render time by the generator.
pub const REQUIRED_TEMPLATES: &[(&str, &str)] = &[
    ("archetype_default", ARCHETYPE_DEFAULT),
    ("portfolio_default", PORTFOLIO_DEFAULT),
    ("risk_metrics_interpreter_cited", RISK_METRICS_INTERPRETER_CITED),
    ("monte_carlo_interpreter_cited", MONTE_CARLO_INTERPRETER_CITED),
    ("esg_analysis_cited", ESG_ANALYSIS_CITED),
    ("general_default", GENERAL_DEFAULT),
    ("fallback_default", FALLBACK_DEFAULT),
];

pub fn brevity_contract() -> &'static str {
    BREVITY_CONTRACT
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_required_template_has_a_unique_name() {
        let names: std::collections::HashSet<_> = REQUIRED_TEMPLATES.iter().map(|(n, _)| *n).collect();
        assert_eq!(names.len(), REQUIRED_TEMPLATES.len());
    }

    #[test]
    fn every_template_uses_only_context_and_query() {
        for (_, body) in REQUIRED_TEMPLATES {
            assert!(body.contains("{context}"));
            assert!(body.contains("{query}"));
        }
    }
}
