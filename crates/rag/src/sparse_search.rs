//! Tantivy-backed BM25 lexical search, loaded from disk if present or
//! rebuilt from a corpus snapshot and persisted, during startup warmup.

use crate::RagError;
use advisor_rag_core::RetrievedHit;
use serde::Deserialize;
use std::collections::HashMap;
use std::path::Path;
use tantivy::collector::TopDocs;
use tantivy::query::QueryParser;
use tantivy::schema::{Schema, Value, FAST, STORED, STRING, TEXT};
use tantivy::{doc, Index, IndexReader, ReloadPolicy, TantivyDocument};

/// One row of the corpus snapshot used to (re)build the lexical index.
#[derive(Debug, Deserialize)]
pub struct CorpusRecord {
    pub id: String,
    pub text: String,
    pub source_path: String,
    pub chunk_index: usize,
}

pub struct SparseIndex {
    index: Index,
    reader: IndexReader,
    field_id: tantivy::schema::Field,
    field_text: tantivy::schema::Field,
    field_source_path: tantivy::schema::Field,
    field_chunk_index: tantivy::schema::Field,
}

impl SparseIndex {
    fn build_schema() -> (
        Schema,
        tantivy::schema::Field,
        tantivy::schema::Field,
        tantivy::schema::Field,
        tantivy::schema::Field,
    ) {
        let mut builder = Schema::builder();
        let field_id = builder.add_text_field("id", STRING | STORED);
        let field_text = builder.add_text_field("text", TEXT | STORED);
        let field_source_path = builder.add_text_field("source_path", STRING | STORED);
        let field_chunk_index = builder.add_u64_field("chunk_index", FAST | STORED);
        (builder.build(), field_id, field_text, field_source_path, field_chunk_index)
    }

    /// Opens the index at `index_dir` if it already contains a valid
    /// tantivy index; otherwise builds one from `corpus_snapshot` (a
    /// JSON-lines file of `CorpusRecord`) and persists it to `index_dir`.
    pub fn open_or_build(index_dir: &Path, corpus_snapshot: &Path) -> Result<Self, RagError> {
        if index_dir.join("meta.json").exists() {
            return Self::open(index_dir);
        }
        Self::build(index_dir, corpus_snapshot)
    }

    fn open(index_dir: &Path) -> Result<Self, RagError> {
        let (schema, field_id, field_text, field_source_path, field_chunk_index) = Self::build_schema();
        let dir = tantivy::directory::MmapDirectory::open(index_dir)
            .map_err(|e| RagError::LexicalIndex(e.to_string()))?;
        let index = Index::open_or_create(dir, schema).map_err(|e| RagError::LexicalIndex(e.to_string()))?;
        let reader = index
            .reader_builder()
            .reload_policy(ReloadPolicy::OnCommitWithDelay)
            .try_into()
            .map_err(|e: tantivy::TantivyError| RagError::LexicalIndex(e.to_string()))?;
        Ok(Self {
            index,
            reader,
            field_id,
            field_text,
            field_source_path,
            field_chunk_index,
        })
    }

    fn build(index_dir: &Path, corpus_snapshot: &Path) -> Result<Self, RagError> {
        std::fs::create_dir_all(index_dir).map_err(|e| RagError::LexicalIndex(e.to_string()))?;
        let (schema, field_id, field_text, field_source_path, field_chunk_index) = Self::build_schema();
        let dir = tantivy::directory::MmapDirectory::open(index_dir)
            .map_err(|e| RagError::LexicalIndex(e.to_string()))?;
        let index = Index::open_or_create(dir, schema).map_err(|e| RagError::LexicalIndex(e.to_string()))?;

        {
            let mut writer = index
                .writer(50_000_000)
                .map_err(|e| RagError::LexicalIndex(e.to_string()))?;

            if corpus_snapshot.exists() {
                let contents = std::fs::read_to_string(corpus_snapshot)
                    .map_err(|e| RagError::LexicalIndex(e.to_string()))?;
                for line in contents.lines() {
                    if line.trim().is_empty() {
                        continue;
                    }
                    let record: CorpusRecord = serde_json::from_str(line)
                        .map_err(|e| RagError::LexicalIndex(format!("malformed snapshot row: {}", e)))?;
                    writer
                        .add_document(doc!(
                            field_id => record.id,
                            field_text => record.text,
                            field_source_path => record.source_path,
                            field_chunk_index => record.chunk_index as u64,
                        ))
                        .map_err(|e| RagError::LexicalIndex(e.to_string()))?;
                }
            }

            writer.commit().map_err(|e| RagError::LexicalIndex(e.to_string()))?;
        }

        let reader = index
            .reader_builder()
            .reload_policy(ReloadPolicy::OnCommitWithDelay)
            .try_into()
            .map_err(|e: tantivy::TantivyError| RagError::LexicalIndex(e.to_string()))?;

        Ok(Self {
            index,
            reader,
            field_id,
            field_text,
            field_source_path,
            field_chunk_index,
        })
    }

    pub fn search(&self, text: &str, k: usize) -> Result<Vec<RetrievedHit>, RagError> {
        let searcher = self.reader.searcher();
        let parser = QueryParser::for_index(&self.index, vec![self.field_text]);
        let query = parser
            .parse_query(text)
            .map_err(|e| RagError::LexicalIndex(e.to_string()))?;

        let top_docs = searcher
            .search(&query, &TopDocs::with_limit(k))
            .map_err(|e| RagError::LexicalIndex(e.to_string()))?;

        let mut hits = Vec::with_capacity(top_docs.len());
        for (score, address) in top_docs {
            let retrieved: TantivyDocument = searcher
                .doc(address)
                .map_err(|e| RagError::LexicalIndex(e.to_string()))?;
            let id = retrieved
                .get_first(self.field_id)
                .and_then(|v| v.as_str())
                .unwrap_or_default()
                .to_string();
            let doc_text = retrieved
                .get_first(self.field_text)
                .and_then(|v| v.as_str())
                .unwrap_or_default()
                .to_string();
            let source_path = retrieved
                .get_first(self.field_source_path)
                .and_then(|v| v.as_str())
                .unwrap_or_default()
                .to_string();
            let chunk_index = retrieved
                .get_first(self.field_chunk_index)
                .and_then(|v| v.as_u64())
                .unwrap_or(0) as usize;

            hits.push(RetrievedHit {
                id,
                text: doc_text,
                source_path,
                chunk_index,
                metadata: HashMap::new(),
                score,
            });
        }

        Ok(hits)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builds_and_searches_a_tiny_index() {
        let dir = tempfile::tempdir().unwrap();
        let snapshot = dir.path().join("corpus.jsonl");
        std::fs::write(
            &snapshot,
            "{\"id\":\"1\",\"text\":\"Monte Carlo simulation percentile success probability\",\"source_path\":\"faq.md\",\"chunk_index\":0}\n\
             {\"id\":\"2\",\"text\":\"ESG financed emissions methodology\",\"source_path\":\"esg.md\",\"chunk_index\":0}\n",
        )
        .unwrap();

        let index_dir = dir.path().join("index");
        let index = SparseIndex::open_or_build(&index_dir, &snapshot).unwrap();
        let hits = index.search("Monte Carlo percentile", 5).unwrap();
        assert!(!hits.is_empty());
        assert_eq!(hits[0].id, "1");
    }

    #[test]
    fn reopens_a_previously_built_index() {
        let dir = tempfile::tempdir().unwrap();
        let snapshot = dir.path().join("corpus.jsonl");
        std::fs::write(
            &snapshot,
            "{\"id\":\"1\",\"text\":\"portfolio rebalancing holdings\",\"source_path\":\"p.md\",\"chunk_index\":0}\n",
        )
        .unwrap();
        let index_dir = dir.path().join("index");
        let _ = SparseIndex::open_or_build(&index_dir, &snapshot).unwrap();
        let reopened = SparseIndex::open_or_build(&index_dir, &snapshot).unwrap();
        let hits = reopened.search("portfolio", 5).unwrap();
        assert_eq!(hits.len(), 1);
    }
}
