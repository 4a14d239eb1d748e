//! Centralized constants for the query orchestration core.
//!
//! This module provides a single source of truth for the enumerated
//! configuration of spec §9: `{cache_enabled, similarity_threshold,
//! default_ttl_s, short_term_window, memory_token_split, iteration_cap,
//! quality_threshold, diversity_cap_ratio, parent_fetch_concurrency,
//! request_deadline_s}`, plus the per-component tables named throughout §4.
//!
//! DO NOT scatter these thresholds inline at call sites; every tunable named
//! in the spec has exactly one definition here.

use gweta_core::Complexity;

/// Graph-wide knobs (spec §9).
pub mod graph {
    /// Per-request refinement/gap-retrieve loop cap (§4.1, §4.10).
    pub const ITERATION_CAP: u32 = 2;

    /// Request-level deadline (§5); a node in flight when this elapses must
    /// abandon its work and compose the best available answer.
    pub const REQUEST_DEADLINE_S: u64 = 30;

    /// Bounded parallelism for parent-document fetches (§4.6).
    pub const PARENT_FETCH_CONCURRENCY: usize = 8;
    pub const PARENT_FETCH_TIMEOUT_S: u64 = 2;

    /// Illustrative per-node timeout budgets (§5).
    pub const RETRIEVAL_TIMEOUT_S: u64 = 3;
    pub const RERANK_TIMEOUT_S: u64 = 3;
    pub const PARENT_EXPAND_TIMEOUT_S: u64 = 2;
    pub const SYNTHESIS_TIMEOUT_S: u64 = 15;
    pub const QUALITY_TIMEOUT_S: u64 = 5;
}

/// Adaptive top-k policy (§4.5): the contract between intent classification
/// and retrieval/selection.
pub mod adaptive_topk {
    use super::Complexity;

    pub struct TopK {
        pub retrieval_top_k: usize,
        pub rerank_top_k: usize,
    }

    pub fn for_complexity(complexity: Complexity) -> TopK {
        match complexity {
            Complexity::Simple => TopK {
                retrieval_top_k: 15,
                rerank_top_k: 5,
            },
            Complexity::Moderate => TopK {
                retrieval_top_k: 25,
                rerank_top_k: 8,
            },
            Complexity::Complex => TopK {
                retrieval_top_k: 40,
                rerank_top_k: 12,
            },
            Complexity::Expert => TopK {
                retrieval_top_k: 50,
                rerank_top_k: 15,
            },
        }
    }

    /// Default per-retriever top-k before the intent classifier has run
    /// (§4.2): lexical and dense both default to 20.
    pub const DEFAULT_RETRIEVER_TOP_K: usize = 20;
}

/// Reranker thresholds (§4.4).
pub mod reranker {
    /// Quality floor: candidates scoring below this are dropped.
    pub const QUALITY_FLOOR: f32 = 0.3;
    /// No single `parent_doc_id` may contribute more than this fraction of
    /// `top_k` results.
    pub const DIVERSITY_CAP_RATIO: f64 = 0.40;
}

/// Synthesizer token budgets (§4.9), scaled by complexity.
pub mod synthesis {
    use super::Complexity;

    pub fn token_budget(complexity: Complexity) -> usize {
        match complexity {
            Complexity::Simple => 500,
            Complexity::Moderate => 900,
            Complexity::Complex => 1500,
            Complexity::Expert => 2500,
        }
    }

    /// `tldr` length cap in characters (§4.9).
    pub const TLDR_MAX_CHARS: usize = 220;
    pub const KEY_POINTS_MIN: usize = 3;
    pub const KEY_POINTS_MAX: usize = 7;
}

/// Quality gate weights and thresholds (§4.10). Open question: "the exact
/// weighting ... may need per-corpus tuning" — kept as specified pending
/// evaluation data (see DESIGN.md).
pub mod quality {
    pub const WEIGHT_ATTRIBUTION: f32 = 0.5;
    pub const WEIGHT_COHERENCE: f32 = 0.3;
    pub const WEIGHT_RELEVANCE: f32 = 0.2;

    /// `quality_passed = quality_confidence >= QUALITY_THRESHOLD`.
    pub const QUALITY_THRESHOLD: f32 = 0.8;
    /// Weak-but-not-failing band that triggers `refine_synthesis`.
    pub const WEAK_BAND_LOW: f32 = 0.5;
    /// For complex/expert intents, refine below this even outside the weak band.
    pub const COMPLEX_REFINE_THRESHOLD: f32 = 0.7;

    pub fn weighted_mean(attribution: f32, coherence: f32, relevance: f32) -> f32 {
        attribution * WEIGHT_ATTRIBUTION + coherence * WEIGHT_COHERENCE + relevance * WEIGHT_RELEVANCE
    }
}

/// Memory coordinator knobs (§4.14).
pub mod memory {
    /// Default short-term session window (messages).
    pub const SHORT_TERM_WINDOW: usize = 20;
    /// Short-term memory expiration after last append.
    pub const SHORT_TERM_TTL_H: i64 = 24;
    /// Approximate tokens-per-character ratio used for context budgeting.
    pub const CHARS_PER_TOKEN: usize = 4;
    /// `memory_context` token split between short-term and long-term (§4.14).
    pub const SHORT_TERM_TOKEN_SHARE: f64 = 0.7;
    pub const LONG_TERM_TOKEN_SHARE: f64 = 0.3;
    /// Consecutive queries a candidate expertise classification must hold
    /// before superseding the current one.
    pub const EXPERTISE_STABILITY_HYSTERESIS: u32 = 5;
}

/// Multi-level cache keys/TTLs (§4.13). Open question: the 0.95 semantic
/// threshold trades false-hit risk for hit rate; kept as specified (see
/// DESIGN.md).
pub mod cache {
    use super::Complexity;

    pub const CACHE_ENABLED: bool = true;
    pub const SEMANTIC_SIMILARITY_THRESHOLD: f64 = 0.95;
    pub const DEFAULT_TTL_S: u64 = 3600;

    pub const INTENT_CACHE_TTL_S: u64 = 2 * 3600;
    pub const EMBEDDING_CACHE_TTL_S: u64 = 3600;

    /// Complexity-adaptive TTL for exact/semantic response cache entries.
    pub fn response_ttl_s(complexity: Complexity) -> u64 {
        match complexity {
            Complexity::Simple => 2 * 3600,
            Complexity::Moderate => 3600,
            Complexity::Complex => 30 * 60,
            Complexity::Expert => 15 * 60,
        }
    }

    /// Process-wide cache connection pool ceiling (§5).
    pub const MAX_POOL_SIZE: usize = 20;

    /// Semantic index scan cap before falling back to a miss for latency
    /// reasons (§4.13: "< 50ms for <= 100 entries").
    pub const SEMANTIC_INDEX_SCAN_CAP: usize = 100;
}
