//! In-memory `BlobStore` reference implementation.
//!
//! The real blob store (object storage) is out of scope (spec §1); this
//! exists for tests and local runs, the same role the donor workspace's
//! `InMemorySessionStore` plays for session state.

use std::collections::HashMap;

use async_trait::async_trait;
use gweta_core::{BlobStore, Error};
use parking_lot::RwLock;

#[derive(Default)]
pub struct InMemoryBlobStore {
    objects: RwLock<HashMap<String, Vec<u8>>>,
}

impl InMemoryBlobStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn put(&self, key: impl Into<String>, value: Vec<u8>) {
        self.objects.write().insert(key.into(), value);
    }
}

#[async_trait]
impl BlobStore for InMemoryBlobStore {
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>, Error> {
        Ok(self.objects.read().get(key).cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn missing_key_is_none_not_error() {
        let store = InMemoryBlobStore::new();
        assert!(store.get("missing").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn put_then_get_roundtrips() {
        let store = InMemoryBlobStore::new();
        store.put("doc-1", b"hello".to_vec());
        assert_eq!(store.get("doc-1").await.unwrap(), Some(b"hello".to_vec()));
    }
}
