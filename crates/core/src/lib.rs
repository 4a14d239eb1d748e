//! Core data model, error taxonomy, and provider traits for the Gweta query
//! orchestration core.
//!
//! This crate has no knowledge of HTTP, channel adapters, or any concrete
//! retriever/LLM/store backend — those are named interfaces only (see
//! [`traits`]), consumed by `gweta-retrieval`, `gweta-agent`, and
//! `gweta-orchestrator`.

pub mod cache_types;
pub mod error;
pub mod hash;
pub mod memory_types;
pub mod state;
pub mod traits;
pub mod types;

pub use cache_types::{CacheEntry, CacheStats};
pub use error::Error;
pub use memory_types::{ExpertiseLevel, PendingExpertise, Role, ShortTermMessage, UserProfile};
pub use state::AgentState;
pub use traits::{
    BlobStore, CrossEncoder, DenseRetriever, Embedder, KvVectorCache, LexicalRetriever, Llm,
    LlmStreamToken, ProfilePatch, ProfileStore, RetrieverFilters,
};
pub use types::{
    Answer, BundledContext, Chunk, Citation, Complexity, DocType, Intent, ParentDocument,
    RetrievalResult, UserType,
};
