//! Provider interfaces the core consumes (spec §6). Each is an
//! object-safe `async_trait` so the orchestrator can be constructed from
//! `Arc<dyn Trait>` handles, the same dependency-injection idiom the rest
//! of the workspace uses for its FSM/persona-provider traits.

mod blob_store;
mod cache;
mod cross_encoder;
mod embedder;
mod llm;
mod profile_store;
mod retriever;

pub use blob_store::BlobStore;
pub use cache::KvVectorCache;
pub use cross_encoder::CrossEncoder;
pub use embedder::Embedder;
pub use llm::{Llm, LlmStreamToken};
pub use profile_store::{ProfilePatch, ProfileStore};
pub use retriever::{DenseRetriever, LexicalRetriever, RetrieverFilters};
