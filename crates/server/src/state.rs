//! Shared application state handed to every axum handler: the pipeline
//! itself, the global inflight-request cap, and the handles `/ready` polls.

use advisor_rag_config::settings::ServerConfig;
use advisor_rag_core::{ChatModel, Retriever};
use advisor_rag_pipeline::RagPipeline;
use metrics_exporter_prometheus::PrometheusHandle;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Semaphore;

#[derive(Clone)]
pub struct AppState {
    pub pipeline: Arc<RagPipeline>,
    pub inflight: Arc<Semaphore>,
    pub server_config: ServerConfig,
    pub prometheus: PrometheusHandle,
    retriever: Arc<dyn Retriever>,
    chat_model: Arc<dyn ChatModel>,
    collection: String,
}

impl AppState {
    pub fn new(
        pipeline: Arc<RagPipeline>,
        retriever: Arc<dyn Retriever>,
        chat_model: Arc<dyn ChatModel>,
        collection: String,
        inflight_cap: usize,
        server_config: ServerConfig,
        prometheus: PrometheusHandle,
    ) -> Self {
        Self {
            pipeline,
            inflight: Arc::new(Semaphore::new(inflight_cap)),
            server_config,
            prometheus,
            retriever,
            chat_model,
            collection,
        }
    }

    /// Re-runs the same dependency checks the startup warmup performed,
    /// each under `timeout`. Used by `GET /ready`.
    pub async fn probe_readiness(&self, timeout: Duration) -> bool {
        let stats = tokio::time::timeout(timeout, self.retriever.stats(&self.collection)).await;
        if !matches!(stats, Ok(Ok(_))) {
            return false;
        }

        let embed = tokio::time::timeout(timeout, self.retriever.embed("readiness probe")).await;
        if !matches!(embed, Ok(Ok(_))) {
            return false;
        }

        let chat = tokio::time::timeout(timeout, self.chat_model.chat("ping", timeout)).await;
        matches!(chat, Ok(Ok(_)))
    }
}
