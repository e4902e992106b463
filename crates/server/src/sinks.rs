//! Default metrics/feedback sinks: every record is emitted as a structured
//! `tracing` event and mirrored into the process-wide `metrics` registry so
//! `GET /metrics` has something to render. No external persistence —
//! ingestion into a time-series store is left to whatever scrapes
//! `/metrics`.

use advisor_rag_core::{FeedbackRecord, MetricsRecord, MetricsSink};
use async_trait::async_trait;

pub struct TracingMetricsSink;

#[async_trait]
impl MetricsSink for TracingMetricsSink {
    async fn record(&self, record: MetricsRecord) {
        tracing::info!(
            query_id = %record.id,
            domain = %record.domain,
            intent = %record.intent,
            quality = ?record.quality,
            endpoint = ?record.endpoint,
            doc_count = record.doc_count,
            top_score = record.top_score,
            total_ms = ?record.timings.total_ms,
            error = ?record.error,
            "query completed"
        );

        let endpoint_label = match record.endpoint {
            advisor_rag_core::Endpoint::Main => "main",
            advisor_rag_core::Endpoint::Fallback => "fallback",
        };

        metrics::counter!(
            "advisor_rag_queries_total",
            "endpoint" => endpoint_label,
            "domain" => record.domain.clone(),
            "error" => if record.error.is_some() { "true" } else { "false" },
        )
        .increment(1);

        if let Some(total_ms) = record.timings.total_ms {
            metrics::histogram!("advisor_rag_query_duration_ms", "endpoint" => endpoint_label)
                .record(total_ms as f64);
        }

        metrics::gauge!("advisor_rag_doc_count", "domain" => record.domain).set(record.doc_count as f64);
    }
}

pub struct TracingFeedbackSink;

#[async_trait]
impl advisor_rag_core::FeedbackSink for TracingFeedbackSink {
    async fn record(&self, record: FeedbackRecord) {
        tracing::info!(
            query_id = %record.query_id,
            rating = ?record.rating,
            detail = ?record.detail,
            "feedback received"
        );

        let rating_label = match record.rating {
            advisor_rag_core::FeedbackRating::Positive => "positive",
            advisor_rag_core::FeedbackRating::Negative => "negative",
        };
        metrics::counter!("advisor_rag_feedback_total", "rating" => rating_label).increment(1);
    }
}
