//! Conversational query rewriting: pronoun/ellipsis resolution against
//! recent turns (§4.8).
//!
//! Grounded on the donor's `ConversationManager`-driven prompt assembly in
//! `conversation.rs`, which folds prior turns into a single LLM call;
//! generalized here to a dedicated single-purpose rewrite step that must be
//! idempotent when there is no context to resolve against.

use std::sync::Arc;

use gweta_core::{Error, Llm, ShortTermMessage};

pub struct QueryRewriter {
    llm: Arc<dyn Llm>,
}

impl QueryRewriter {
    pub fn new(llm: Arc<dyn Llm>) -> Self {
        Self { llm }
    }

    /// Resolves pronouns and ellipsis in `query` against the last 3-5
    /// exchanges of `history`. Must be idempotent on an empty history and
    /// must never invent entities not present in `query` or `history`
    /// (§4.8).
    #[tracing::instrument(skip(self, query, history))]
    pub async fn rewrite(&self, query: &str, history: &[ShortTermMessage]) -> Result<String, Error> {
        if history.is_empty() {
            return Ok(query.to_string());
        }

        if !needs_resolution(query) {
            return Ok(query.to_string());
        }

        let context_window: Vec<&ShortTermMessage> = history.iter().rev().take(5).collect();
        let transcript = context_window
            .iter()
            .rev()
            .map(|m| format!("{:?}: {}", m.role, m.content))
            .collect::<Vec<_>>()
            .join("\n");

        let prompt = format!(
            "Rewrite the final question into a standalone question by resolving \
             pronouns and ellipsis using the conversation below. Do not introduce \
             any fact, entity, or detail that is not already present in the \
             conversation or the question. If the question is already standalone, \
             return it unchanged. Respond with only the rewritten question.\n\n\
             Conversation:\n{transcript}\n\nQuestion: {query}"
        );

        match self.llm.complete(&prompt, 200, 0.0).await {
            Ok(rewritten) => {
                let rewritten = rewritten.trim();
                if rewritten.is_empty() {
                    Ok(query.to_string())
                } else {
                    Ok(rewritten.to_string())
                }
            }
            Err(err) => {
                tracing::warn!(error = %err, "query rewrite failed, falling back to raw query");
                Ok(query.to_string())
            }
        }
    }
}

/// Cheap heuristic: only bother calling the LLM when the query actually
/// contains a cue that needs resolving against prior turns.
fn needs_resolution(query: &str) -> bool {
    let lower = query.to_lowercase();
    const PRONOUN_CUES: &[&str] = &[
        " it ", " it?", " it.", " that ", " this ", " they ", " them ", " those ", " these ",
        "what about", "and what", "also,", "and also",
    ];
    PRONOUN_CUES.iter().any(|cue| lower.contains(cue)) || lower.split_whitespace().count() <= 3
}
