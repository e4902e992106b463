//! A retrieved chunk as it flows through retrieval, grading, and rerank.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Priority {
    Critical,
    High,
    Normal,
    Low,
}

impl Priority {
    /// The fusion-level score multiplier for this priority tier.
    pub fn boost_multiplier(&self) -> f32 {
        match self {
            Priority::Critical => 1.0,
            Priority::High => 0.85,
            Priority::Normal => 0.5,
            Priority::Low => 0.3,
        }
    }
}

impl Default for Priority {
    fn default() -> Self {
        Priority::Normal
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Grade {
    Relevant,
    Partial,
    Irrelevant,
    Ungraded,
}

impl Default for Grade {
    fn default() -> Self {
        Grade::Ungraded
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PassageMetadata {
    pub document_type: Option<String>,
    #[serde(default)]
    pub priority: Priority,
    #[serde(default)]
    pub extra: HashMap<String, String>,
}

/// A retrieved chunk, carrying scores from every stage that has touched it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Passage {
    pub id: String,
    pub text: String,
    pub source_path: String,
    pub chunk_index: usize,
    pub metadata: PassageMetadata,

    pub semantic_score: f32,
    pub lexical_score: f32,
    pub fused_score: f32,

    pub grade: Grade,
    pub grade_confidence: f32,
}

impl Passage {
    pub fn new(id: impl Into<String>, text: impl Into<String>, source_path: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            text: text.into(),
            source_path: source_path.into(),
            chunk_index: 0,
            metadata: PassageMetadata::default(),
            semantic_score: 0.0,
            lexical_score: 0.0,
            fused_score: 0.0,
            grade: Grade::Ungraded,
            grade_confidence: 0.0,
        }
    }

    pub fn is_survivor(&self) -> bool {
        matches!(self.grade, Grade::Relevant | Grade::Partial)
    }
}

/// A single cited source returned alongside the generated answer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Citation {
    pub source_path: String,
    pub chunk_index: usize,
    pub score: f32,
}

impl From<&Passage> for Citation {
    fn from(p: &Passage) -> Self {
        Citation {
            source_path: p.source_path.clone(),
            chunk_index: p.chunk_index,
            score: p.grade_confidence,
        }
    }
}
