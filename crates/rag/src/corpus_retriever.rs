//! Composes the embedder, vector store, and lexical index into the single
//! `Retriever` capability the pipeline depends on.

use crate::embeddings::Embedder;
use crate::sparse_search::SparseIndex;
use crate::vector_store::VectorStore;
use crate::RagError;
use advisor_rag_core::{CollectionStats, Error, Result, Retriever, RetrievedHit};
use async_trait::async_trait;

pub struct CorpusRetriever {
    embedder: Embedder,
    vector_store: VectorStore,
    sparse_index: SparseIndex,
}

impl CorpusRetriever {
    pub fn new(embedder: Embedder, vector_store: VectorStore, sparse_index: SparseIndex) -> Self {
        Self {
            embedder,
            vector_store,
            sparse_index,
        }
    }
}

#[async_trait]
impl Retriever for CorpusRetriever {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        self.embedder
            .embed_query(text)
            .await
            .map_err(|e: RagError| e.into())
    }

    async fn search_semantic(
        &self,
        collection: &str,
        vector: &[f32],
        k: usize,
    ) -> Result<Vec<RetrievedHit>> {
        let stats = self.vector_store.stats(collection).await?;
        if stats.embedding_dim != 0 && stats.embedding_dim != vector.len() {
            return Err(Error::DimensionMismatch {
                query_dim: vector.len(),
                collection_dim: stats.embedding_dim,
            });
        }
        self.vector_store
            .search(collection, vector, k)
            .await
            .map_err(|e| e.into())
    }

    async fn search_lexical(
        &self,
        _collection: &str,
        text: &str,
        k: usize,
    ) -> Result<Vec<RetrievedHit>> {
        self.sparse_index.search(text, k).map_err(|e| e.into())
    }

    async fn stats(&self, collection: &str) -> Result<CollectionStats> {
        self.vector_store.stats(collection).await.map_err(|e| e.into())
    }
}
