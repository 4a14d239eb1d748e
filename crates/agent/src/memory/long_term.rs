//! Long-term (cross-session) memory: the user's aggregated profile (§4.14),
//! a thin typed wrapper over `ProfileStore`.
//!
//! Grounded on the donor's `memory/core.rs` domain-agnostic profile
//! accumulation pattern, generalized from gold-loan product affinity
//! tracking to legal-area frequency and expertise-level stability.

use std::sync::Arc;

use gweta_core::{Error, ProfilePatch, ProfileStore, UserProfile};

pub struct LongTermMemory {
    store: Arc<dyn ProfileStore>,
}

impl LongTermMemory {
    pub fn new(store: Arc<dyn ProfileStore>) -> Self {
        Self { store }
    }

    pub async fn get(&self, user_id: &str) -> Option<UserProfile> {
        match self.store.get(user_id).await {
            Ok(profile) => profile,
            Err(err) => {
                tracing::warn!(error = %err, "long-term memory read failed, treating as unknown user");
                None
            }
        }
    }

    pub async fn update(&self, user_id: &str, patch: ProfilePatch) -> Result<UserProfile, Error> {
        self.store.update(user_id, patch).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use parking_lot::RwLock;
    use std::collections::HashMap;

    struct FakeProfileStore {
        profiles: RwLock<HashMap<String, UserProfile>>,
    }

    #[async_trait]
    impl ProfileStore for FakeProfileStore {
        async fn get(&self, user_id: &str) -> Result<Option<UserProfile>, Error> {
            Ok(self.profiles.read().get(user_id).cloned())
        }
        async fn update(&self, user_id: &str, _patch: ProfilePatch) -> Result<UserProfile, Error> {
            let profile = UserProfile::new(user_id);
            self.profiles.write().insert(user_id.to_string(), profile.clone());
            Ok(profile)
        }
    }

    #[tokio::test]
    async fn unknown_user_is_none() {
        let mem = LongTermMemory::new(Arc::new(FakeProfileStore { profiles: RwLock::new(HashMap::new()) }));
        assert!(mem.get("new-user").await.is_none());
    }

    #[tokio::test]
    async fn update_creates_profile() {
        let mem = LongTermMemory::new(Arc::new(FakeProfileStore { profiles: RwLock::new(HashMap::new()) }));
        let profile = mem.update("u1", ProfilePatch::default()).await.unwrap();
        assert_eq!(profile.user_id, "u1");
    }
}
