//! State threaded through every pipeline stage for one request.

use crate::Intent;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Quality {
    Good,
    Ambiguous,
    Poor,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Endpoint {
    Main,
    Fallback,
}

/// Per-stage timings, in milliseconds, recorded as stages complete.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StageTimings {
    pub retrieve_ms: Option<u64>,
    pub grade_ms: Option<u64>,
    pub rerank_ms: Option<u64>,
    pub generate_ms: Option<u64>,
    pub total_ms: Option<u64>,
}

/// A response record as returned across the external interface.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueryResponse {
    pub id: String,
    pub answer: String,
    pub citations: Vec<crate::Citation>,
    pub quality: Quality,
    pub intent: Intent,
    pub timings: StageTimings,
}

/// A structured record appended to the metrics sink per request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetricsRecord {
    pub id: String,
    pub timestamp: chrono::DateTime<chrono::Utc>,
    pub domain: String,
    pub intent: Intent,
    pub quality: Quality,
    pub timings: StageTimings,
    pub doc_count: usize,
    pub top_score: f32,
    pub endpoint: Endpoint,
    pub error: Option<String>,
}

/// A single rating appended to the feedback sink, correlated by query id.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeedbackRecord {
    pub query_id: String,
    pub rating: FeedbackRating,
    pub detail: Option<String>,
    pub timestamp: chrono::DateTime<chrono::Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FeedbackRating {
    Positive,
    Negative,
}

