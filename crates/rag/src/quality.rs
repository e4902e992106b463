//! The retrieval quality signal: a pure function of survivor count and top
//! grader confidence.

use advisor_rag_core::{Passage, Quality};

pub fn assess(survivors: &[Passage], good_confidence_threshold: f32) -> Quality {
    let top_confidence = survivors
        .iter()
        .map(|p| p.grade_confidence)
        .fold(0.0_f32, f32::max);

    if survivors.is_empty() {
        Quality::Poor
    } else if top_confidence >= good_confidence_threshold {
        Quality::Good
    } else {
        Quality::Ambiguous
    }
}
