//! In-memory `ProfileStore` reference implementation.
//!
//! The production profile store is out of scope (spec §1); this backs
//! long-term memory (§4.14) in tests and local runs.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::Utc;
use gweta_core::{Error, ProfilePatch, ProfileStore, UserProfile};
use parking_lot::RwLock;

#[derive(Default)]
pub struct InMemoryProfileStore {
    profiles: RwLock<HashMap<String, UserProfile>>,
}

impl InMemoryProfileStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ProfileStore for InMemoryProfileStore {
    async fn get(&self, user_id: &str) -> Result<Option<UserProfile>, Error> {
        Ok(self.profiles.read().get(user_id).cloned())
    }

    async fn update(&self, user_id: &str, patch: ProfilePatch) -> Result<UserProfile, Error> {
        let mut profiles = self.profiles.write();
        let profile = profiles
            .entry(user_id.to_string())
            .or_insert_with(|| UserProfile::new(user_id));

        let now = Utc::now();
        let increments = patch.query_increment.max(1);
        for _ in 0..increments {
            profile.record_query(patch.area_increment.as_deref(), now);
        }
        if let Some(candidate) = patch.expertise_candidate {
            profile.observe_expertise_candidate(candidate);
        }
        if let Some(complexity) = patch.observed_complexity {
            profile.typical_complexity = complexity;
        }

        Ok(profile.clone())
    }
}
