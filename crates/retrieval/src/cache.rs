//! Multi-level semantic cache: exact, semantic, intent, and embedding
//! levels (§4.13).
//!
//! Grounded on the donor's `EmbeddingCache`/response-cache pairing in
//! `embeddings.rs` (MD5-keyed blob cache with a TTL and a cosine-similarity
//! near-hit path), generalized from a single embedding cache to the full
//! four-level cache the spec names, all model-namespaced so an embedder
//! upgrade cannot collide with stale vectors.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use gweta_core::{CacheEntry, CacheStats, Complexity, Embedder, KvVectorCache, UserType};
use gweta_config::constants::cache::{
    response_ttl_s, EMBEDDING_CACHE_TTL_S, INTENT_CACHE_TTL_S, SEMANTIC_INDEX_SCAN_CAP,
    SEMANTIC_SIMILARITY_THRESHOLD,
};
use md5::{Digest, Md5};
use parking_lot::Mutex;

pub struct MultiLevelCache {
    kv: Arc<dyn KvVectorCache>,
    embedder: Arc<dyn Embedder>,
    stats: Mutex<CacheStats>,
}

impl MultiLevelCache {
    pub fn new(kv: Arc<dyn KvVectorCache>, embedder: Arc<dyn Embedder>) -> Self {
        Self { kv, embedder, stats: Mutex::new(CacheStats::default()) }
    }

    pub fn stats(&self) -> CacheStats {
        *self.stats.lock()
    }

    /// Exact lookup, then semantic near-hit scan within the user_type's
    /// index (§4.13 levels 1-2). A cache fault degrades to a miss rather
    /// than failing the request.
    #[tracing::instrument(skip(self, query, query_embedding))]
    pub async fn get_response(
        &self,
        query: &str,
        user_type: UserType,
        query_embedding: &[f32],
    ) -> Option<serde_json::Value> {
        let normalized = normalize_query(query);
        let exact_key = self.exact_key(&normalized, user_type);

        if let Some(entry) = self.fetch_entry(&exact_key).await {
            if !entry.is_expired(Utc::now()) {
                self.stats.lock().exact_hits += 1;
                return Some(entry.response_blob);
            }
        }

        let semantic_hit = self.semantic_scan(user_type, query_embedding).await;
        match semantic_hit {
            Some(blob) => {
                self.stats.lock().semantic_hits += 1;
                Some(blob)
            }
            None => {
                self.stats.lock().misses += 1;
                None
            }
        }
    }

    /// Stores the response under the exact key and registers it in the
    /// user_type's semantic index (§4.13 levels 1-2). TTL is
    /// complexity-adaptive per `response_ttl_s`.
    #[tracing::instrument(skip(self, query, response, query_embedding))]
    pub async fn store_response(
        &self,
        query: &str,
        user_type: UserType,
        query_embedding: &[f32],
        complexity: Complexity,
        response: serde_json::Value,
    ) {
        let normalized = normalize_query(query);
        let exact_key = self.exact_key(&normalized, user_type);
        let ttl = Duration::from_secs(response_ttl_s(complexity));

        let entry = CacheEntry {
            key_hash: exact_key.clone(),
            query_normalized: normalized,
            embedding: query_embedding.to_vec(),
            response_blob: response,
            user_type,
            created_at: Utc::now(),
            expires_at: Utc::now() + chrono::Duration::seconds(ttl.as_secs() as i64),
            hit_count: 0,
        };

        let Ok(bytes) = serde_json::to_vec(&entry) else {
            tracing::warn!("failed to serialize cache entry, skipping store");
            return;
        };

        if let Err(err) = self.kv.set(&exact_key, bytes, ttl).await {
            tracing::warn!(error = %err, "cache store failed");
            return;
        }

        let index_key = self.semantic_index_key(user_type);
        if let Err(err) = self.kv.sadd(&index_key, &exact_key).await {
            tracing::warn!(error = %err, "semantic index registration failed");
        }
    }

    /// Level 3: intent classification cache, keyed on the normalized query
    /// alone (no user_type split) with a 2h TTL (§4.13).
    pub async fn get_intent(&self, query: &str) -> Option<serde_json::Value> {
        let key = self.intent_key(&normalize_query(query));
        self.fetch_json(&key).await
    }

    pub async fn store_intent(&self, query: &str, value: serde_json::Value) {
        let key = self.intent_key(&normalize_query(query));
        self.store_json(&key, value, Duration::from_secs(INTENT_CACHE_TTL_S)).await;
    }

    /// Level 4: raw embedding cache, keyed on the exact text, 1h TTL
    /// (§4.13).
    pub async fn get_embedding(&self, text: &str) -> Option<Vec<f32>> {
        let key = self.embedding_key(text);
        let bytes = self.fetch_bytes(&key).await?;
        serde_json::from_slice(&bytes).ok()
    }

    pub async fn store_embedding(&self, text: &str, embedding: &[f32]) {
        let key = self.embedding_key(text);
        let Ok(bytes) = serde_json::to_vec(embedding) else { return };
        if let Err(err) = self.kv.set(&key, bytes, Duration::from_secs(EMBEDDING_CACHE_TTL_S)).await {
            tracing::warn!(error = %err, "embedding cache store failed");
        }
    }

    async fn semantic_scan(&self, user_type: UserType, query_embedding: &[f32]) -> Option<serde_json::Value> {
        let index_key = self.semantic_index_key(user_type);
        let members = match self.kv.smembers(&index_key).await {
            Ok(members) => members,
            Err(err) => {
                tracing::warn!(error = %err, "semantic index scan failed");
                return None;
            }
        };

        let now = Utc::now();
        for member_key in members.into_iter().take(SEMANTIC_INDEX_SCAN_CAP) {
            let Some(entry) = self.fetch_entry(&member_key).await else { continue };
            if entry.is_expired(now) {
                continue;
            }
            if cosine_similarity(&entry.embedding, query_embedding) >= SEMANTIC_SIMILARITY_THRESHOLD {
                return Some(entry.response_blob);
            }
        }
        None
    }

    async fn fetch_entry(&self, key: &str) -> Option<CacheEntry> {
        let bytes = self.fetch_bytes(key).await?;
        serde_json::from_slice(&bytes).ok()
    }

    async fn fetch_json(&self, key: &str) -> Option<serde_json::Value> {
        let bytes = self.fetch_bytes(key).await?;
        serde_json::from_slice(&bytes).ok()
    }

    async fn store_json(&self, key: &str, value: serde_json::Value, ttl: Duration) {
        let Ok(bytes) = serde_json::to_vec(&value) else { return };
        if let Err(err) = self.kv.set(key, bytes, ttl).await {
            tracing::warn!(error = %err, "cache store failed");
        }
    }

    async fn fetch_bytes(&self, key: &str) -> Option<Vec<u8>> {
        match self.kv.get(key).await {
            Ok(value) => value,
            Err(err) => {
                tracing::warn!(error = %err, "cache read failed, treating as miss");
                None
            }
        }
    }

    fn exact_key(&self, normalized_query: &str, user_type: UserType) -> String {
        self.namespaced(&md5_hex(&format!("{normalized_query}|{user_type:?}")))
    }

    fn intent_key(&self, normalized_query: &str) -> String {
        self.namespaced(&md5_hex(normalized_query))
    }

    fn embedding_key(&self, text: &str) -> String {
        self.namespaced(&md5_hex(text))
    }

    fn semantic_index_key(&self, user_type: UserType) -> String {
        format!("{}:semantic_index:{:?}", self.embedder.model_namespace(), user_type)
    }

    fn namespaced(&self, hash: &str) -> String {
        format!("{}:{}", self.embedder.model_namespace(), hash)
    }
}

fn normalize_query(query: &str) -> String {
    query.trim().to_lowercase().split_whitespace().collect::<Vec<_>>().join(" ")
}

fn md5_hex(input: &str) -> String {
    let digest = Md5::digest(input.as_bytes());
    hex::encode(digest)
}

fn cosine_similarity(a: &[f32], b: &[f32]) -> f64 {
    if a.is_empty() || b.is_empty() || a.len() != b.len() {
        return 0.0;
    }
    let dot: f32 = a.iter().zip(b).map(|(x, y)| x * y).sum();
    let norm_a = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b = b.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    (dot / (norm_a * norm_b)) as f64
}
