//! Core types and capability traits for the wealth-management RAG pipeline.
//!
//! This crate defines the data model (`Query`, `Passage`, `QueryResponse`)
//! and the capability traits (`Retriever`, `ChatModel`, sinks) that the
//! `rag`, `llm`, and `pipeline` crates implement and consume. It has no
//! dependency on any concrete vector store, search engine, or HTTP
//! framework — those live at the edges.

pub mod error;
pub mod passage;
pub mod pipeline_state;
pub mod query;
pub mod traits;

pub use error::{Error, Result};
pub use passage::{Citation, Grade, Passage, PassageMetadata, Priority};
pub use pipeline_state::{
    Endpoint, FeedbackRating, FeedbackRecord, MetricsRecord, QueryResponse, Quality, StageTimings,
};
pub use query::{ContextValue, Intent, Query};
pub use traits::{
    ChatModel, CollectionStats, FeedbackSink, MetricsSink, PromptTemplate, Retriever, RetrievedHit,
};
