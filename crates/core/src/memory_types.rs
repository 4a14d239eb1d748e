//! Short-term and long-term memory entities (spec §3, §4.14).

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::types::{Complexity, UserType};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    User,
    Assistant,
}

/// One message in a session's bounded short-term window.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ShortTermMessage {
    pub role: Role,
    pub content: String,
    pub timestamp: DateTime<Utc>,
    pub metadata: HashMap<String, String>,
}

/// Per-user aggregated profile; incrementally updated, never stores raw
/// query text beyond aggregation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserProfile {
    pub user_id: String,
    pub expertise_level: ExpertiseLevel,
    pub area_frequency: HashMap<String, u32>,
    pub typical_complexity: Complexity,
    pub query_count: u64,
    pub last_seen_at: DateTime<Utc>,
    /// How many consecutive queries have agreed on a candidate expertise
    /// level that differs from the current one (stability hysteresis, §4.14).
    #[serde(default)]
    pub pending_expertise: Option<PendingExpertise>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PendingExpertise {
    pub candidate: ExpertiseLevel,
    pub streak: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExpertiseLevel {
    Unknown,
    Citizen,
    Professional,
}

impl From<UserType> for ExpertiseLevel {
    fn from(u: UserType) -> Self {
        match u {
            UserType::Citizen => ExpertiseLevel::Citizen,
            UserType::Professional => ExpertiseLevel::Professional,
        }
    }
}

impl UserProfile {
    /// Number of consecutive queries a candidate classification must hold
    /// before it supersedes the current `expertise_level` (spec §4.14).
    pub const STABILITY_HYSTERESIS: u32 = 5;

    pub fn new(user_id: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            expertise_level: ExpertiseLevel::Unknown,
            area_frequency: HashMap::new(),
            typical_complexity: Complexity::Simple,
            query_count: 0,
            last_seen_at: Utc::now(),
            pending_expertise: None,
        }
    }

    /// Monotonic, commutative increments: safe to apply out of order or
    /// concurrently (query_count and per-area frequency only ever grow).
    pub fn record_query(&mut self, area: Option<&str>, now: DateTime<Utc>) {
        self.query_count += 1;
        if let Some(area) = area {
            *self.area_frequency.entry(area.to_string()).or_insert(0) += 1;
        }
        self.last_seen_at = now;
    }

    /// Last-write-wins with a stability hysteresis (§4.14): a candidate
    /// level must be observed `STABILITY_HYSTERESIS` times in a row before
    /// it replaces the current classification.
    pub fn observe_expertise_candidate(&mut self, candidate: ExpertiseLevel) {
        if candidate == self.expertise_level {
            self.pending_expertise = None;
            return;
        }
        let streak = match &self.pending_expertise {
            Some(p) if p.candidate == candidate => p.streak + 1,
            _ => 1,
        };
        if streak >= Self::STABILITY_HYSTERESIS {
            self.expertise_level = candidate;
            self.pending_expertise = None;
        } else {
            self.pending_expertise = Some(PendingExpertise { candidate, streak });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn record_query_is_commutative_for_counts() {
        let mut a = UserProfile::new("u1");
        let mut b = UserProfile::new("u1");
        let now = Utc::now();

        a.record_query(Some("labour"), now);
        a.record_query(Some("tax"), now);

        b.record_query(Some("tax"), now);
        b.record_query(Some("labour"), now);

        assert_eq!(a.query_count, b.query_count);
        assert_eq!(a.area_frequency.get("labour"), b.area_frequency.get("labour"));
        assert_eq!(a.area_frequency.get("tax"), b.area_frequency.get("tax"));
    }

    #[test]
    fn expertise_requires_stability_streak() {
        let mut p = UserProfile::new("u1");
        assert_eq!(p.expertise_level, ExpertiseLevel::Unknown);
        for _ in 0..UserProfile::STABILITY_HYSTERESIS - 1 {
            p.observe_expertise_candidate(ExpertiseLevel::Professional);
            assert_eq!(p.expertise_level, ExpertiseLevel::Unknown);
        }
        p.observe_expertise_candidate(ExpertiseLevel::Professional);
        assert_eq!(p.expertise_level, ExpertiseLevel::Professional);
    }

    #[test]
    fn flip_flopping_candidates_reset_streak() {
        let mut p = UserProfile::new("u1");
        p.observe_expertise_candidate(ExpertiseLevel::Professional);
        p.observe_expertise_candidate(ExpertiseLevel::Citizen);
        p.observe_expertise_candidate(ExpertiseLevel::Professional);
        assert_eq!(p.expertise_level, ExpertiseLevel::Unknown);
        assert_eq!(p.pending_expertise.as_ref().unwrap().streak, 1);
    }
}
