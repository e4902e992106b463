//! Hybrid retrieval, grading fan-out, reranking, and supporting stages
//! (query expansion, intent classification, quality signal) over the
//! wealth-management corpus.

pub mod corpus_retriever;
pub mod embeddings;
pub mod expander;
pub mod fusion;
pub mod grader;
pub mod intent;
pub mod quality;
pub mod reranker;
pub mod sparse_search;
pub mod vector_store;

pub use corpus_retriever::CorpusRetriever;
pub use embeddings::{EmbeddingConfig, Embedder};
pub use fusion::HybridRetriever;
pub use grader::{Grader, GraderConfig};
pub use reranker::Reranker;
pub use sparse_search::SparseIndex;
pub use vector_store::VectorStore;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum RagError {
    #[error("embedding error: {0}")]
    Embedding(String),

    #[error("vector store error: {0}")]
    VectorStore(String),

    #[error("lexical index error: {0}")]
    LexicalIndex(String),
}

impl From<RagError> for advisor_rag_core::Error {
    fn from(err: RagError) -> Self {
        advisor_rag_core::Error::Retriever(err.to_string())
    }
}
