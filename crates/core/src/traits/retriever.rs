use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::Error;
use crate::types::Chunk;

/// Optional filters a caller may pass to either retriever (e.g. restrict to
/// a `doc_type` or jurisdiction); left opaque to the core since filtering
/// semantics live with the index implementation.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RetrieverFilters {
    pub doc_types: Vec<String>,
    pub language: Option<String>,
}

/// Keyword/BM25-style search over the corpus. `search` returns results
/// sorted by the retriever's native score.
#[async_trait]
pub trait LexicalRetriever: Send + Sync {
    async fn search(
        &self,
        query: &str,
        top_k: usize,
        filters: Option<&RetrieverFilters>,
    ) -> Result<Vec<(Chunk, f32)>, Error>;
}

/// Dense vector search. The caller supplies a pre-computed query embedding
/// (produced by the same `Embedder` used for cache similarity, per §4.2).
#[async_trait]
pub trait DenseRetriever: Send + Sync {
    async fn search(
        &self,
        query_embedding: &[f32],
        top_k: usize,
        filters: Option<&RetrieverFilters>,
    ) -> Result<Vec<(Chunk, f32)>, Error>;
}
