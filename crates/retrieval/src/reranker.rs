//! Cross-encoder reranking with a quality floor, diversity filter, and a
//! score-sort fallback (§4.4).
//!
//! Grounded on the donor's `EarlyExitReranker`/`SimpleScorer` cascade in
//! `reranker.rs` and `HybridRetriever::rerank`'s fallback-when-unavailable
//! shape, adapted from an ONNX-backed in-process model to the
//! `CrossEncoder` provider trait plus a pure-Rust fallback sort.

use std::collections::HashMap;
use std::sync::Arc;

use gweta_core::{CrossEncoder, RetrievalResult};
use gweta_config::constants::reranker::{DIVERSITY_CAP_RATIO, QUALITY_FLOOR};

pub struct Reranker {
    cross_encoder: Arc<dyn CrossEncoder>,
}

impl Reranker {
    pub fn new(cross_encoder: Arc<dyn CrossEncoder>) -> Self {
        Self { cross_encoder }
    }

    /// Applies the full algorithm of §4.4. On cross-encoder failure, falls
    /// back to sorting by raw `score` and marks `rerank_method`.
    #[tracing::instrument(skip(self, query, candidates))]
    pub async fn rerank(
        &self,
        query: &str,
        candidates: Vec<RetrievalResult>,
        top_k: usize,
    ) -> (Vec<RetrievalResult>, &'static str) {
        if candidates.is_empty() {
            return (Vec::new(), "cross_encoder");
        }

        let pairs: Vec<(String, String)> =
            candidates.iter().map(|c| (query.to_string(), c.chunk.text.clone())).collect();

        match self.cross_encoder.score(&pairs).await {
            Ok(scores) => {
                let scored = normalize_and_attach(candidates, scores);
                (apply_quality_gate(scored, top_k), "cross_encoder")
            }
            Err(err) => {
                tracing::warn!(error = %err, "cross-encoder unavailable, falling back to score sort");
                let mut fallback = candidates;
                fallback.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap());
                fallback.truncate(top_k);
                (fallback, "fallback_score_sort")
            }
        }
    }
}

/// Min-max normalizes cross-encoder scores within the batch and attaches
/// them as `confidence`, preserving `score` unchanged.
fn normalize_and_attach(mut candidates: Vec<RetrievalResult>, scores: Vec<f32>) -> Vec<RetrievalResult> {
    let min = scores.iter().cloned().fold(f32::INFINITY, f32::min);
    let max = scores.iter().cloned().fold(f32::NEG_INFINITY, f32::max);
    let range = (max - min).max(f32::EPSILON);

    for (candidate, raw) in candidates.iter_mut().zip(scores) {
        candidate.confidence = Some(((raw - min) / range).clamp(0.0, 1.0));
    }
    candidates
}

/// Quality floor, descending sort, diversity filter, truncate (§4.4 steps
/// 2–5).
fn apply_quality_gate(mut candidates: Vec<RetrievalResult>, top_k: usize) -> Vec<RetrievalResult> {
    candidates.retain(|c| c.confidence.unwrap_or(0.0) >= QUALITY_FLOOR);
    candidates.sort_by(|a, b| b.confidence.partial_cmp(&a.confidence).unwrap());

    let cap_per_parent = ((DIVERSITY_CAP_RATIO * top_k as f64).ceil() as usize).max(1);

    let mut selected = Vec::with_capacity(top_k);
    let mut per_parent: HashMap<String, usize> = HashMap::new();
    let mut overflow = Vec::new();

    for candidate in candidates {
        if selected.len() >= top_k {
            break;
        }
        let count = per_parent.entry(candidate.chunk.parent_doc_id.clone()).or_insert(0);
        if *count < cap_per_parent {
            *count += 1;
            selected.push(candidate);
        } else {
            overflow.push(candidate);
        }
    }

    // Backfill with the capped-out overflow (still in original rank order)
    // if the diversity filter left room short of top_k.
    for candidate in overflow {
        if selected.len() >= top_k {
            break;
        }
        selected.push(candidate);
    }

    selected
}
