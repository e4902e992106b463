//! Qdrant-backed semantic search.

use crate::RagError;
use advisor_rag_core::{CollectionStats, RetrievedHit};
use qdrant_client::qdrant::{SearchPoints, point_id::PointIdOptions};
use qdrant_client::Qdrant;
use std::collections::HashMap;

pub struct VectorStore {
    client: Qdrant,
}

impl VectorStore {
    pub fn connect(endpoint: &str) -> Result<Self, RagError> {
        let client = Qdrant::from_url(endpoint)
            .build()
            .map_err(|e| RagError::VectorStore(e.to_string()))?;
        Ok(Self { client })
    }

    pub async fn search(
        &self,
        collection: &str,
        vector: &[f32],
        k: usize,
    ) -> Result<Vec<RetrievedHit>, RagError> {
        let request = SearchPoints {
            collection_name: collection.to_string(),
            vector: vector.to_vec(),
            limit: k as u64,
            with_payload: Some(true.into()),
            ..Default::default()
        };

        let response = self
            .client
            .search_points(request)
            .await
            .map_err(|e| RagError::VectorStore(e.to_string()))?;

        let hits = response
            .result
            .into_iter()
            .map(|point| {
                let id = match point.id.and_then(|p| p.point_id_options) {
                    Some(PointIdOptions::Uuid(u)) => u,
                    Some(PointIdOptions::Num(n)) => n.to_string(),
                    None => String::new(),
                };
                let payload: HashMap<String, String> = point
                    .payload
                    .iter()
                    .filter_map(|(k, v)| v.as_str().map(|s| (k.clone(), s.to_string())))
                    .collect();
                let text = payload.get("text").cloned().unwrap_or_default();
                let source_path = payload.get("source_path").cloned().unwrap_or_default();
                let chunk_index = payload
                    .get("chunk_index")
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(0);
                RetrievedHit {
                    id,
                    text,
                    source_path,
                    chunk_index,
                    metadata: payload,
                    score: point.score,
                }
            })
            .collect();

        Ok(hits)
    }

    pub async fn stats(&self, collection: &str) -> Result<CollectionStats, RagError> {
        let info = self
            .client
            .collection_info(collection)
            .await
            .map_err(|e| RagError::VectorStore(e.to_string()))?;

        let result = info
            .result
            .ok_or_else(|| RagError::VectorStore("collection info missing result".to_string()))?;

        let doc_count = result.points_count.unwrap_or(0) as usize;
        let embedding_dim = result
            .config
            .and_then(|c| c.params)
            .and_then(|p| p.vectors_config)
            .and_then(|v| v.config)
            .and_then(|c| match c {
                qdrant_client::qdrant::vectors_params::Config::Params(params) => Some(params.size as usize),
                _ => None,
            })
            .unwrap_or(0);

        Ok(CollectionStats {
            doc_count,
            embedding_dim,
        })
    }
}
