//! Hybrid retrieval, cross-encoder reranking, adaptive top-k selection,
//! small-to-big parent expansion, intent classification, query rewriting,
//! gap retrieval, and the multi-level semantic cache (§4.2-§4.8, §4.12,
//! §4.13). This is the crate `gweta-agent`'s graph nodes call into for
//! every retrieval-side step.

mod cache;
mod error;
mod gap_retriever;
mod hybrid_retriever;
mod intent_classifier;
mod parent_expander;
mod query_rewriter;
mod reranker;

pub use cache::MultiLevelCache;
pub use error::RetrievalError;
pub use gap_retriever::{GapRetriever, GAP_TOP_K_INCREMENT};
pub use hybrid_retriever::HybridRetriever;
pub use intent_classifier::{IntentClassification, IntentClassifier, LLM_FALLBACK_THRESHOLD};
pub use parent_expander::ParentExpander;
pub use query_rewriter::QueryRewriter;
pub use reranker::Reranker;
