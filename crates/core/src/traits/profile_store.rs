use async_trait::async_trait;

use crate::error::Error;
use crate::memory_types::UserProfile;

/// Incremental read/modify/write store for `UserProfile` documents (§4.14, §6).
#[async_trait]
pub trait ProfileStore: Send + Sync {
    async fn get(&self, user_id: &str) -> Result<Option<UserProfile>, Error>;

    /// Apply `patch` to the stored profile (creating one if absent) and
    /// return the result. Implementations must apply monotonic fields
    /// (`query_count`, `area_frequency`) commutatively.
    async fn update(
        &self,
        user_id: &str,
        patch: ProfilePatch,
    ) -> Result<UserProfile, Error>;
}

/// An incremental update to a user profile; commutative fields are deltas,
/// not absolute values.
#[derive(Debug, Clone, Default)]
pub struct ProfilePatch {
    pub area_increment: Option<String>,
    pub query_increment: u64,
    pub expertise_candidate: Option<crate::memory_types::ExpertiseLevel>,
    pub observed_complexity: Option<crate::types::Complexity>,
}
