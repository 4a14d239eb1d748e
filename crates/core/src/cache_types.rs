//! Multi-level cache entities (spec §3, §4.13).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::types::UserType;

/// A stored semantic/exact cache entry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheEntry {
    pub key_hash: String,
    pub query_normalized: String,
    pub embedding: Vec<f32>,
    pub response_blob: serde_json::Value,
    pub user_type: UserType,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    pub hit_count: u64,
}

impl CacheEntry {
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at
    }
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct CacheStats {
    pub exact_hits: u64,
    pub semantic_hits: u64,
    pub misses: u64,
}

impl CacheStats {
    pub fn total(&self) -> u64 {
        self.exact_hits + self.semantic_hits + self.misses
    }

    pub fn hit_rate(&self) -> f64 {
        let total = self.total();
        if total == 0 {
            return 0.0;
        }
        (self.exact_hits + self.semantic_hits) as f64 / total as f64
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn expiry_invariant() {
        let now = Utc::now();
        let entry = CacheEntry {
            key_hash: "h".into(),
            query_normalized: "q".into(),
            embedding: vec![],
            response_blob: serde_json::json!({}),
            user_type: UserType::Citizen,
            created_at: now,
            expires_at: now + Duration::seconds(10),
            hit_count: 0,
        };
        assert!(!entry.is_expired(now));
        assert!(entry.is_expired(now + Duration::seconds(11)));
    }

    #[test]
    fn hit_rate_counts_exact_and_semantic() {
        let stats = CacheStats {
            exact_hits: 3,
            semantic_hits: 2,
            misses: 5,
        };
        assert!((stats.hit_rate() - 0.5).abs() < 1e-9);
    }

    #[test]
    fn hit_rate_of_empty_stats_is_zero() {
        assert_eq!(CacheStats::default().hit_rate(), 0.0);
    }
}
