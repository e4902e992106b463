//! The axum HTTP surface: `/query`, `/query/stream`, `/feedback`,
//! `/health`, `/ready`, `/metrics`.

use crate::state::AppState;
use crate::ServerError;
use advisor_rag_core::{ContextValue, FeedbackRating, FeedbackRecord, Query};
use axum::extract::State;
use axum::http::{HeaderValue, Method, StatusCode};
use axum::response::sse::{Event, KeepAlive, Sse};
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};
use futures::stream::{self, Stream};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::convert::Infallible;
use std::time::Duration;
use tower_http::compression::CompressionLayer;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

#[derive(Debug, Deserialize)]
pub struct QueryRequest {
    pub text: String,
    pub domain: String,
    pub prompt_name: Option<String>,
    #[serde(default)]
    pub app_context: HashMap<String, ContextValue>,
    pub thread_id: Option<String>,
}

impl From<QueryRequest> for Query {
    fn from(req: QueryRequest) -> Self {
        let mut query = Query::new(req.text, req.domain);
        if let Some(name) = req.prompt_name {
            query = query.with_prompt_name(name);
        }
        if !req.app_context.is_empty() {
            query = query.with_app_context(req.app_context);
        }
        if let Some(thread_id) = req.thread_id {
            query = query.with_thread_id(thread_id);
        }
        query
    }
}

#[derive(Debug, Deserialize)]
pub struct FeedbackRequest {
    pub query_id: String,
    pub rating: FeedbackRating,
    pub detail: Option<String>,
}

#[derive(Debug, Serialize)]
struct ReadyResponse {
    ready: bool,
}

pub fn create_router(state: AppState) -> Router {
    let cors = build_cors_layer(&state.server_config.cors_origins, state.server_config.cors_enabled);

    Router::new()
        .route("/query", post(query_handler))
        .route("/query/stream", post(query_stream_handler))
        .route("/feedback", post(feedback_handler))
        .route("/health", get(health_handler))
        .route("/ready", get(ready_handler))
        .route("/metrics", get(metrics_handler))
        .layer(TraceLayer::new_for_http())
        .layer(CompressionLayer::new())
        .layer(cors)
        .with_state(state)
}

/// Permissive-by-default CORS, narrowed to configured origins when any are
/// set. A disabled layer still gets attached, permissively, with a warning —
/// the router always carries a CORS layer.
fn build_cors_layer(origins: &[String], enabled: bool) -> CorsLayer {
    if !enabled {
        tracing::warn!("CORS is disabled; allowing all origins");
        return CorsLayer::permissive();
    }

    if origins.is_empty() {
        return CorsLayer::permissive();
    }

    let parsed: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|o| o.parse().ok())
        .collect();

    CorsLayer::new()
        .allow_origin(parsed)
        .allow_methods([Method::GET, Method::POST])
}

async fn query_handler(
    State(state): State<AppState>,
    Json(request): Json<QueryRequest>,
) -> Result<Json<advisor_rag_core::QueryResponse>, ServerError> {
    let _permit = state
        .inflight
        .clone()
        .try_acquire_owned()
        .map_err(|_| ServerError::Overloaded)?;

    let response = state.pipeline.query(request.into()).await;
    Ok(Json(response))
}

/// Splits the completed answer into word-sized Server-Sent Events, followed
/// by one terminal event carrying citations, quality, and intent. The
/// pipeline produces a complete answer per call, so this simulates
/// incremental delivery rather than streaming token-by-token from the model.
async fn query_stream_handler(
    State(state): State<AppState>,
    Json(request): Json<QueryRequest>,
) -> Result<Sse<impl Stream<Item = Result<Event, Infallible>>>, ServerError> {
    let _permit = state
        .inflight
        .clone()
        .try_acquire_owned()
        .map_err(|_| ServerError::Overloaded)?;

    let response = state.pipeline.query(request.into()).await;

    let mut events: Vec<Result<Event, Infallible>> = response
        .answer
        .split_inclusive(' ')
        .map(|chunk| Ok(Event::default().event("token").data(chunk.to_string())))
        .collect();

    let final_payload = serde_json::json!({
        "id": response.id,
        "citations": response.citations,
        "quality": response.quality,
        "intent": response.intent,
    });
    events.push(Ok(Event::default().event("done").data(final_payload.to_string())));

    Ok(Sse::new(stream::iter(events)).keep_alive(KeepAlive::default()))
}

async fn feedback_handler(
    State(state): State<AppState>,
    Json(request): Json<FeedbackRequest>,
) -> impl IntoResponse {
    state
        .pipeline
        .record_feedback(FeedbackRecord {
            query_id: request.query_id,
            rating: request.rating,
            detail: request.detail,
            timestamp: chrono::Utc::now(),
        })
        .await;
    StatusCode::ACCEPTED
}

async fn health_handler() -> StatusCode {
    StatusCode::OK
}

async fn ready_handler(State(state): State<AppState>) -> impl IntoResponse {
    let ready = state.probe_readiness(Duration::from_secs(2)).await;
    let status = if ready { StatusCode::OK } else { StatusCode::SERVICE_UNAVAILABLE };
    (status, Json(ReadyResponse { ready }))
}

async fn metrics_handler(State(state): State<AppState>) -> impl IntoResponse {
    state.prometheus.render()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cors_disabled_is_permissive() {
        let _layer = build_cors_layer(&[], false);
    }

    #[test]
    fn cors_with_origins_parses_them() {
        let _layer = build_cors_layer(&["https://example.com".to_string()], true);
    }
}
