//! In-memory reference implementations of the `BlobStore`, `KvVectorCache`,
//! and `ProfileStore` traits defined in `gweta-core`.
//!
//! Production deployments back these with real object storage, a
//! KV+vector store, and a document store respectively (spec §1, §6); none
//! of those are in scope here. What lives in this crate is what tests and
//! local runs use instead, mirroring the donor workspace's
//! `InMemorySessionStore` and `PersistenceLayer` bundling pattern.

mod in_memory_blob;
mod in_memory_cache;
mod in_memory_profile;

pub use in_memory_blob::InMemoryBlobStore;
pub use in_memory_cache::InMemoryKvVectorCache;
pub use in_memory_profile::InMemoryProfileStore;

/// Convenience bundle of the three in-memory stores for tests and local
/// runs, wired up the way the donor's `PersistenceLayer` groups its
/// concrete backends for injection into the rest of the pipeline.
#[derive(Default)]
pub struct InMemoryPersistence {
    pub blobs: InMemoryBlobStore,
    pub cache: InMemoryKvVectorCache,
    pub profiles: InMemoryProfileStore,
}

impl InMemoryPersistence {
    pub fn new() -> Self {
        Self::default()
    }
}
