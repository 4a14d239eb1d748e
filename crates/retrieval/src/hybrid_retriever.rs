//! Hybrid lexical + dense retrieval, merge, and deduplication (§4.2, §4.3).
//!
//! Grounded on the donor's `HybridRetriever::search` (`tokio::join!` of
//! dense/sparse search) and its `rrf_fusion`, generalized from a single
//! internal vector store/index to the `LexicalRetriever`/`DenseRetriever`
//! provider traits.

use std::collections::HashMap;
use std::sync::Arc;

use gweta_core::{
    Chunk, DenseRetriever, Embedder, Error, LexicalRetriever, RetrievalResult, RetrieverFilters,
};

/// RRF's rank-damping constant; 60 is the value the donor's fusion used and
/// the value most commonly cited in reciprocal-rank-fusion literature.
const RRF_K: f32 = 60.0;

pub struct HybridRetriever {
    lexical: Arc<dyn LexicalRetriever>,
    dense: Arc<dyn DenseRetriever>,
    embedder: Arc<dyn Embedder>,
}

impl HybridRetriever {
    pub fn new(
        lexical: Arc<dyn LexicalRetriever>,
        dense: Arc<dyn DenseRetriever>,
        embedder: Arc<dyn Embedder>,
    ) -> Self {
        Self { lexical, dense, embedder }
    }

    /// Runs both retrievers concurrently and merges their results (§4.2,
    /// §4.3). Tolerates one retriever failing provided the other returns at
    /// least one result; fails only if both error.
    #[tracing::instrument(skip(self, filters))]
    pub async fn search(
        &self,
        query: &str,
        top_k: usize,
        filters: Option<RetrieverFilters>,
    ) -> Result<Vec<RetrievalResult>, Error> {
        let filters_ref = filters.as_ref();

        let lexical_future = self.lexical.search(query, top_k, filters_ref);
        let dense_future = async {
            let embedding = self.embedder.embed(&[query.to_string()]).await?;
            let vector = embedding.into_iter().next().unwrap_or_default();
            self.dense.search(&vector, top_k, filters_ref).await
        };

        let (lexical_result, dense_result) = tokio::join!(lexical_future, dense_future);

        let (lexical_hits, dense_hits) = match (lexical_result, dense_result) {
            (Ok(l), Ok(d)) => (l, d),
            (Ok(l), Err(e)) => {
                tracing::warn!(error = %e, "dense retriever failed, continuing with lexical only");
                (l, Vec::new())
            }
            (Err(e), Ok(d)) => {
                tracing::warn!(error = %e, "lexical retriever failed, continuing with dense only");
                (Vec::new(), d)
            }
            (Err(le), Err(de)) => {
                return Err(Error::RetrieverUnavailable(format!(
                    "both retrievers failed: lexical={le}, dense={de}"
                )));
            }
        };

        if lexical_hits.is_empty() && dense_hits.is_empty() {
            return Ok(Vec::new());
        }

        Ok(merge_and_dedupe(lexical_hits, dense_hits, top_k))
    }
}

/// Reciprocal rank fusion merge/dedupe on `chunk_id` (§4.3): keeps the
/// higher native score per chunk, orders by fused RRF score, lexical wins
/// ties, and caps output at `2 * max(lexical_k, dense_k)`.
fn merge_and_dedupe(
    lexical: Vec<(Chunk, f32)>,
    dense: Vec<(Chunk, f32)>,
    top_k: usize,
) -> Vec<RetrievalResult> {
    let cap = 2 * top_k;

    struct Entry {
        chunk: Chunk,
        native_score: f32,
        rrf_score: f32,
        source: &'static str,
    }

    let mut merged: HashMap<String, Entry> = HashMap::new();

    for (rank, (chunk, score)) in lexical.into_iter().enumerate() {
        let rrf = 1.0 / (RRF_K + rank as f32 + 1.0);
        merged
            .entry(chunk.chunk_id.clone())
            .and_modify(|e| {
                e.rrf_score += rrf;
                e.native_score = e.native_score.max(score);
            })
            .or_insert(Entry { chunk, native_score: score, rrf_score: rrf, source: "lexical" });
    }

    for (rank, (chunk, score)) in dense.into_iter().enumerate() {
        let rrf = 1.0 / (RRF_K + rank as f32 + 1.0);
        merged
            .entry(chunk.chunk_id.clone())
            .and_modify(|e| {
                e.rrf_score += rrf;
                e.native_score = e.native_score.max(score);
                if e.source != "lexical" {
                    e.source = "dense";
                } else {
                    e.source = "hybrid";
                }
            })
            .or_insert(Entry { chunk, native_score: score, rrf_score: rrf, source: "dense" });
    }

    let mut results: Vec<Entry> = merged.into_values().collect();
    results.sort_by(|a, b| b.rrf_score.partial_cmp(&a.rrf_score).unwrap());
    results.truncate(cap);

    results
        .into_iter()
        .map(|e| RetrievalResult {
            chunk: e.chunk,
            score: e.native_score,
            confidence: None,
            source: e.source.to_string(),
        })
        .collect()
}
