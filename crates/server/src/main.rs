//! Process entry point: load settings, init tracing and metrics, warm up
//! the retriever and LLM, then serve.

use advisor_rag_config::settings::load_settings;
use advisor_rag_core::{ChatModel, Retriever};
use advisor_rag_llm::{LlmConfig, OllamaChatBackend, PromptRegistry};
use advisor_rag_pipeline::RagPipeline;
use advisor_rag_rag::{CorpusRetriever, Embedder, EmbeddingConfig, SparseIndex, VectorStore};
use advisor_rag_server::sinks::{TracingFeedbackSink, TracingMetricsSink};
use advisor_rag_server::{create_router, AppState};
use metrics_exporter_prometheus::PrometheusBuilder;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

const CORPUS_COLLECTION: &str = "wealth_management_corpus";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let settings = load_settings(std::env::var("ADVISOR_RAG_ENV").ok().as_deref())?;
    init_tracing(&settings.observability);

    let prometheus_handle = PrometheusBuilder::new()
        .install_recorder()
        .map_err(|e| anyhow::anyhow!("failed to install prometheus recorder: {e}"))?;

    tracing::info!(environment = ?settings.environment, "starting advisor-rag server");

    let embedder = Embedder::new(EmbeddingConfig {
        endpoint: settings.pipeline.llm_endpoint.clone(),
        dim: settings.pipeline.embedding_dim,
        ..EmbeddingConfig::default()
    });
    let vector_store = VectorStore::connect(&settings.pipeline.qdrant_endpoint)
        .map_err(|e| anyhow::anyhow!("failed to connect to vector store: {e}"))?;
    let sparse_index = SparseIndex::open_or_build(
        Path::new("data/bm25_index"),
        Path::new("data/corpus_snapshot.jsonl"),
    )
    .map_err(|e| anyhow::anyhow!("failed to open or build lexical index: {e}"))?;

    let retriever: Arc<dyn Retriever> =
        Arc::new(CorpusRetriever::new(embedder, vector_store, sparse_index));

    let chat_model: Arc<dyn ChatModel> = Arc::new(OllamaChatBackend::new(LlmConfig {
        endpoint: settings.pipeline.llm_endpoint.clone(),
        ..LlmConfig::default()
    }));

    let prompts = PromptRegistry::load_default()?;

    warm_up(&retriever, &chat_model).await;

    let pipeline = Arc::new(RagPipeline::new(
        retriever.clone(),
        chat_model.clone(),
        prompts,
        settings.pipeline.clone(),
        Arc::new(TracingMetricsSink),
        Arc::new(TracingFeedbackSink),
    ));

    let state = AppState::new(
        pipeline,
        retriever,
        chat_model,
        CORPUS_COLLECTION.to_string(),
        settings.pipeline.inflight_cap,
        settings.server.clone(),
        prometheus_handle,
    );

    let router = create_router(state);
    let addr = format!("{}:{}", settings.server.host, settings.server.port);
    tracing::info!(%addr, "listening");

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, router).await?;

    Ok(())
}

fn init_tracing(observability: &advisor_rag_config::settings::ObservabilityConfig) {
    let filter = EnvFilter::try_new(&observability.log_level).unwrap_or_else(|_| EnvFilter::new("info"));
    let subscriber = tracing_subscriber::fmt().with_env_filter(filter);
    if observability.log_json {
        subscriber.json().init();
    } else {
        subscriber.init();
    }
}

/// Pre-initialises the retriever and LLM so the first real request does not
/// pay the cost of opening a collection handle or loading a model.
async fn warm_up(retriever: &Arc<dyn Retriever>, chat_model: &Arc<dyn ChatModel>) {
    match retriever.stats(CORPUS_COLLECTION).await {
        Ok(stats) => tracing::info!(doc_count = stats.doc_count, "collection handle opened"),
        Err(err) => tracing::warn!(error = %err, "collection stats unavailable during warmup"),
    }

    match retriever.embed("warmup").await {
        Ok(_) => tracing::info!("embedding endpoint warmed up"),
        Err(err) => tracing::warn!(error = %err, "embedding warmup failed"),
    }

    match chat_model.chat("ping", Duration::from_secs(10)).await {
        Ok(_) => tracing::info!("llm endpoint warmed up"),
        Err(err) => tracing::warn!(error = %err, "llm warmup failed"),
    }
}
