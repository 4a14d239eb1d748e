//! In-memory `KvVectorCache` reference implementation.
//!
//! The production KV+vector store is out of scope (spec §1); this backs the
//! multi-level cache (§4.13) in tests and local runs. Per the cache's own
//! fault-tolerance invariant, nothing here ever needs to "fail" a caller —
//! expired entries are simply treated as absent.

use std::collections::HashSet;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use dashmap::DashMap;
use gweta_core::{Error, KvVectorCache};

struct Entry {
    value: Vec<u8>,
    expires_at: Instant,
}

pub struct InMemoryKvVectorCache {
    values: DashMap<String, Entry>,
    sets: DashMap<String, HashSet<String>>,
}

impl Default for InMemoryKvVectorCache {
    fn default() -> Self {
        Self {
            values: DashMap::new(),
            sets: DashMap::new(),
        }
    }
}

impl InMemoryKvVectorCache {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl KvVectorCache for InMemoryKvVectorCache {
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>, Error> {
        match self.values.get(key) {
            Some(entry) if entry.expires_at > Instant::now() => Ok(Some(entry.value.clone())),
            Some(_) => {
                self.values.remove(key);
                Ok(None)
            }
            None => Ok(None),
        }
    }

    async fn set(&self, key: &str, value: Vec<u8>, ttl: Duration) -> Result<(), Error> {
        self.values.insert(
            key.to_string(),
            Entry {
                value,
                expires_at: Instant::now() + ttl,
            },
        );
        Ok(())
    }

    async fn expire(&self, key: &str) -> Result<(), Error> {
        self.values.remove(key);
        Ok(())
    }

    async fn sadd(&self, key: &str, member: &str) -> Result<(), Error> {
        self.sets.entry(key.to_string()).or_default().insert(member.to_string());
        Ok(())
    }

    async fn smembers(&self, key: &str) -> Result<Vec<String>, Error> {
        Ok(self
            .sets
            .get(key)
            .map(|s| s.iter().cloned().collect())
            .unwrap_or_default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn hit_within_ttl_miss_after() {
        let cache = InMemoryKvVectorCache::new();
        cache.set("k", b"v".to_vec(), Duration::from_millis(20)).await.unwrap();
        assert_eq!(cache.get("k").await.unwrap(), Some(b"v".to_vec()));
        tokio::time::sleep(Duration::from_millis(40)).await;
        assert_eq!(cache.get("k").await.unwrap(), None);
    }

    #[tokio::test]
    async fn sadd_smembers_roundtrip() {
        let cache = InMemoryKvVectorCache::new();
        cache.sadd("professional", "hash-1").await.unwrap();
        cache.sadd("professional", "hash-2").await.unwrap();
        let mut members = cache.smembers("professional").await.unwrap();
        members.sort();
        assert_eq!(members, vec!["hash-1".to_string(), "hash-2".to_string()]);
    }

    #[tokio::test]
    async fn expire_removes_key() {
        let cache = InMemoryKvVectorCache::new();
        cache.set("k", b"v".to_vec(), Duration::from_secs(60)).await.unwrap();
        cache.expire("k").await.unwrap();
        assert_eq!(cache.get("k").await.unwrap(), None);
    }
}
