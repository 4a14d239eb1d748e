//! Memory coordinator: fetches short-term and long-term memory in
//! parallel and formats them into `AgentState::memory_context` under a
//! 70/30 token split; persists updates fire-and-forget after the response
//! is composed (§4.14).
//!
//! Grounded on the donor's `memory/mod.rs` `MemoryManager`, which fronts
//! both memory tiers behind one facade and fetches them concurrently
//! before assembling the LLM context.

use std::sync::Arc;

use gweta_config::constants::memory::{CHARS_PER_TOKEN, LONG_TERM_TOKEN_SHARE, SHORT_TERM_TOKEN_SHARE};
use gweta_core::{Complexity, Error, ExpertiseLevel, ProfilePatch, Role, UserProfile};

use super::long_term::LongTermMemory;
use super::short_term::ShortTermMemory;

pub struct MemoryCoordinator {
    short_term: ShortTermMemory,
    long_term: LongTermMemory,
}

pub struct MemoryFetch {
    pub context: Option<String>,
    pub known_expertise: Option<ExpertiseLevel>,
    pub typical_complexity: Option<Complexity>,
}

impl MemoryCoordinator {
    pub fn new(short_term: ShortTermMemory, long_term: LongTermMemory) -> Self {
        Self { short_term, long_term }
    }

    /// Fetches both memory tiers concurrently and renders them into a
    /// single context string split 70/30 between short-term and long-term
    /// content within `total_token_budget` (§4.14).
    #[tracing::instrument(skip(self))]
    pub async fn fetch(&self, session_id: &str, user_id: &str, total_token_budget: usize) -> MemoryFetch {
        let short_term_tokens = (total_token_budget as f64 * SHORT_TERM_TOKEN_SHARE) as usize;
        let long_term_tokens = (total_token_budget as f64 * LONG_TERM_TOKEN_SHARE) as usize;

        let (recent, profile) = tokio::join!(
            self.short_term.get_context(session_id, 20, short_term_tokens),
            self.long_term.get(user_id),
        );

        if recent.is_empty() && profile.is_none() {
            return MemoryFetch { context: None, known_expertise: None, typical_complexity: None };
        }

        let mut sections = Vec::new();
        if !recent.is_empty() {
            let transcript = recent
                .iter()
                .map(|m| format!("{:?}: {}", m.role, m.content))
                .collect::<Vec<_>>()
                .join("\n");
            sections.push(format!("Recent conversation:\n{transcript}"));
        }

        let known_expertise = profile.as_ref().map(|p| p.expertise_level);
        let typical_complexity = profile.as_ref().map(|p| p.typical_complexity);
        if let Some(profile) = &profile {
            let max_chars = long_term_tokens * CHARS_PER_TOKEN;
            let summary = format_profile_summary(profile);
            sections.push(truncate_chars(&summary, max_chars));
        }

        MemoryFetch { context: Some(sections.join("\n\n")), known_expertise, typical_complexity }
    }

    /// Persists the turn and any observed profile signals without blocking
    /// the caller; failures are logged, never propagated (§4.14).
    pub fn update_fire_and_forget(
        self: &Arc<Self>,
        session_id: String,
        user_id: String,
        user_message: String,
        assistant_message: String,
        observed_complexity: Complexity,
        expertise_candidate: Option<ExpertiseLevel>,
    ) {
        let this = Arc::clone(self);
        tokio::spawn(async move {
            if let Err(err) = this.short_term.append(&session_id, Role::User, user_message).await {
                tracing::warn!(error = %err, "short-term memory update failed");
            }
            if let Err(err) = this.short_term.append(&session_id, Role::Assistant, assistant_message).await {
                tracing::warn!(error = %err, "short-term memory update failed");
            }

            let patch = ProfilePatch {
                area_increment: None,
                query_increment: 1,
                expertise_candidate,
                observed_complexity: Some(observed_complexity),
            };
            if let Err(err) = this.long_term.update(&user_id, patch).await {
                tracing::warn!(error = %err, "long-term memory update failed");
            }
        });
    }
}

fn format_profile_summary(profile: &UserProfile) -> String {
    format!(
        "Returning user profile: expertise={:?}, typical_complexity={:?}, query_count={}",
        profile.expertise_level, profile.typical_complexity, profile.query_count
    )
}

fn truncate_chars(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        text.to_string()
    } else {
        text.chars().take(max_chars).collect()
    }
}
