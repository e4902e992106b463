//! Typed prompt template registry, validated at load time.
//!
//! Templates in the source this workspace descends from were name-indexed
//! strings with embedded placeholders that drifted across versions
//! (`{context_str}` vs `{context}`). This registry validates once, at
//! construction, that every template references only `{context}` and
//! `{query}` — any other placeholder is a load-time error, not a
//! first-request surprise.

use crate::templates;
use advisor_rag_core::{Error, Intent, PromptTemplate, Result};
use std::collections::HashMap;

#[derive(Clone)]
pub struct PromptRegistry {
    templates: HashMap<String, PromptTemplate>,
}

impl PromptRegistry {
    /// Builds the registry from the required template set, failing fast if
    /// any template uses a placeholder outside `{context}`/`{query}`.
    pub fn load_default() -> Result<Self> {
        let mut templates = HashMap::new();
        for (name, body) in templates::REQUIRED_TEMPLATES {
            let template = PromptTemplate::new(*name, *body)?;
            templates.insert(name.to_string(), template);
        }
        Ok(Self { templates })
    }

    /// Resolves `query.prompt_name` if set and known, otherwise the default
    /// template for `intent`.
    pub fn resolve(&self, prompt_name: Option<&str>, intent: Intent) -> Result<&PromptTemplate> {
        if let Some(name) = prompt_name {
            if let Some(template) = self.templates.get(name) {
                return Ok(template);
            }
        }
        let default_name = intent.default_template();
        self.templates
            .get(default_name)
            .ok_or_else(|| Error::PromptTemplate(format!("missing default template: {}", default_name)))
    }

    pub fn get(&self, name: &str) -> Option<&PromptTemplate> {
        self.templates.get(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.templates.keys().map(|s| s.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_registry_loads_without_error() {
        let registry = PromptRegistry::load_default().unwrap();
        assert!(registry.get("monte_carlo_interpreter_cited").is_some());
        assert!(registry.get("esg_analysis_cited").is_some());
        assert!(registry.get("risk_metrics_interpreter_cited").is_some());
    }

    #[test]
    fn resolves_explicit_prompt_name_over_intent_default() {
        let registry = PromptRegistry::load_default().unwrap();
        let t = registry
            .resolve(Some("esg_analysis_cited"), Intent::General)
            .unwrap();
        assert_eq!(t.name, "esg_analysis_cited");
    }

    #[test]
    fn falls_back_to_intent_default_when_prompt_name_unknown() {
        let registry = PromptRegistry::load_default().unwrap();
        let t = registry.resolve(Some("does_not_exist"), Intent::Esg).unwrap();
        assert_eq!(t.name, "esg_analysis_cited");
    }

    #[test]
    fn falls_back_to_intent_default_when_absent() {
        let registry = PromptRegistry::load_default().unwrap();
        let t = registry.resolve(None, Intent::MonteCarlo).unwrap();
        assert_eq!(t.name, "monte_carlo_interpreter_cited");
    }
}
