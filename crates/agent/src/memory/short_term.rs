//! Short-term (session) memory: a bounded FIFO window per `session_id`
//! (§4.14), backed by the same `KvVectorCache` the retrieval cache uses.
//!
//! Grounded on the donor's `RecallMemory` (`memory/recall.rs`): a
//! `VecDeque`-backed FIFO with a configured max size and a turn-count
//! eviction policy, generalized from an in-process `RwLock<VecDeque<_>>` to
//! a serialized window stored under a per-session cache key so it survives
//! across requests without a dedicated session store.

use std::time::Duration;

use chrono::Utc;
use gweta_config::constants::memory::SHORT_TERM_WINDOW;
use gweta_core::{Error, KvVectorCache, Role, ShortTermMessage};
use std::sync::Arc;

const SHORT_TERM_TTL_S: u64 = 24 * 3600;

pub struct ShortTermMemory {
    kv: Arc<dyn KvVectorCache>,
}

impl ShortTermMemory {
    pub fn new(kv: Arc<dyn KvVectorCache>) -> Self {
        Self { kv }
    }

    fn key(session_id: &str) -> String {
        format!("stm:{session_id}")
    }

    /// All messages currently stored for the session, oldest first.
    pub async fn all(&self, session_id: &str) -> Vec<ShortTermMessage> {
        match self.kv.get(&Self::key(session_id)).await {
            Ok(Some(bytes)) => serde_json::from_slice(&bytes).unwrap_or_default(),
            Ok(None) => Vec::new(),
            Err(err) => {
                tracing::warn!(error = %err, "short-term memory read failed, treating as empty");
                Vec::new()
            }
        }
    }

    /// Appends a message, evicting from the front once the window exceeds
    /// `SHORT_TERM_WINDOW` (§4.14).
    pub async fn append(&self, session_id: &str, role: Role, content: impl Into<String>) -> Result<(), Error> {
        let mut messages = self.all(session_id).await;
        messages.push(ShortTermMessage {
            role,
            content: content.into(),
            timestamp: Utc::now(),
            metadata: Default::default(),
        });
        while messages.len() > SHORT_TERM_WINDOW {
            messages.remove(0);
        }

        let bytes = serde_json::to_vec(&messages)
            .map_err(|e| Error::internal("short_term_memory", e.to_string()))?;
        self.kv.set(&Self::key(session_id), bytes, Duration::from_secs(SHORT_TERM_TTL_S)).await
    }

    /// The most recent messages bounded by both a message count and a
    /// character-budget proxy for tokens (§4.14).
    pub async fn get_context(&self, session_id: &str, max_messages: usize, max_tokens: usize) -> Vec<ShortTermMessage> {
        let all = self.all(session_id).await;
        let chars_per_token = gweta_config::constants::memory::CHARS_PER_TOKEN;
        let max_chars = max_tokens * chars_per_token;

        let mut selected = Vec::new();
        let mut chars_used = 0;
        for message in all.into_iter().rev().take(max_messages) {
            chars_used += message.content.len();
            if chars_used > max_chars && !selected.is_empty() {
                break;
            }
            selected.push(message);
        }
        selected.reverse();
        selected
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use dashmap::DashMap;

    struct FakeKv {
        values: DashMap<String, Vec<u8>>,
    }

    #[async_trait]
    impl KvVectorCache for FakeKv {
        async fn get(&self, key: &str) -> Result<Option<Vec<u8>>, Error> {
            Ok(self.values.get(key).map(|v| v.clone()))
        }
        async fn set(&self, key: &str, value: Vec<u8>, _ttl: Duration) -> Result<(), Error> {
            self.values.insert(key.to_string(), value);
            Ok(())
        }
        async fn expire(&self, key: &str) -> Result<(), Error> {
            self.values.remove(key);
            Ok(())
        }
        async fn sadd(&self, _key: &str, _member: &str) -> Result<(), Error> {
            Ok(())
        }
        async fn smembers(&self, _key: &str) -> Result<Vec<String>, Error> {
            Ok(Vec::new())
        }
    }

    fn memory() -> ShortTermMemory {
        ShortTermMemory::new(Arc::new(FakeKv { values: DashMap::new() }))
    }

    #[tokio::test]
    async fn appends_and_reads_back() {
        let mem = memory();
        mem.append("s1", Role::User, "hello").await.unwrap();
        mem.append("s1", Role::Assistant, "hi there").await.unwrap();
        let all = mem.all("s1").await;
        assert_eq!(all.len(), 2);
        assert_eq!(all[0].content, "hello");
    }

    #[tokio::test]
    async fn evicts_oldest_past_window() {
        let mem = memory();
        for i in 0..(SHORT_TERM_WINDOW + 5) {
            mem.append("s1", Role::User, format!("msg-{i}")).await.unwrap();
        }
        let all = mem.all("s1").await;
        assert_eq!(all.len(), SHORT_TERM_WINDOW);
        assert_eq!(all[0].content, "msg-5");
    }

    #[tokio::test]
    async fn get_context_respects_message_count() {
        let mem = memory();
        for i in 0..10 {
            mem.append("s1", Role::User, format!("msg-{i}")).await.unwrap();
        }
        let ctx = mem.get_context("s1", 3, 10_000).await;
        assert_eq!(ctx.len(), 3);
        assert_eq!(ctx.last().unwrap().content, "msg-9");
    }

    #[tokio::test]
    async fn get_context_always_includes_at_least_one_message() {
        let mem = memory();
        mem.append("s1", Role::User, "a".repeat(10_000)).await.unwrap();
        let ctx = mem.get_context("s1", 5, 1).await;
        assert_eq!(ctx.len(), 1);
    }
}
