//! Synthesizer: turns bundled context into a grounded `Answer::Grounded`
//! (§4.9).
//!
//! Grounded on the donor's prompt-assembly style in `conversation.rs`
//! (system preamble + structured context sections), built against
//! `gweta-llm`'s `PromptBuilder` and adapted from free-form dialog replies
//! to a structured tldr/key_points/body/citations shape with a
//! complexity-driven token budget and an IRAC register for professional
//! readers.

use std::sync::Arc;

use gweta_config::constants::synthesis::{token_budget, KEY_POINTS_MAX, KEY_POINTS_MIN, TLDR_MAX_CHARS};
use gweta_core::{AgentState, Answer, BundledContext, Citation, Complexity, Error, Llm, UserType};
use gweta_llm::PromptBuilder;

pub struct Synthesizer {
    llm: Arc<dyn Llm>,
}

impl Synthesizer {
    pub fn new(llm: Arc<dyn Llm>) -> Self {
        Self { llm }
    }

    /// Synthesizes `state.synthesis` from `state.bundled_context`,
    /// honoring the complexity-scaled token budget and choosing an IRAC
    /// body for professional/complex queries versus plain prose otherwise
    /// (§4.9). Citations are grounded only in `bundled_context` — no
    /// citation is emitted for a source not present there.
    #[tracing::instrument(skip(self, state))]
    pub async fn synthesize(&self, state: &AgentState) -> Result<Answer, Error> {
        let budget = token_budget(state.complexity);
        let prompt = build_prompt(state, budget, None);
        self.run_completion(&prompt, budget, citations_from_context(&state.bundled_context)).await
    }

    /// Regenerates the answer against the same bundle plus the self-critic's
    /// instructions (§4.11), so the refinement loop actually acts on the
    /// critique rather than re-asking the identical question.
    #[tracing::instrument(skip(self, state))]
    pub async fn refine(&self, state: &AgentState) -> Result<Answer, Error> {
        let budget = token_budget(state.complexity);
        let prompt = build_prompt(state, budget, Some(refinement_instructions_text(state)));
        self.run_completion(&prompt, budget, citations_from_context(&state.bundled_context)).await
    }

    async fn run_completion(&self, prompt: &str, budget: usize, citations: Vec<Citation>) -> Result<Answer, Error> {
        let raw = self.llm.complete(prompt, budget, 0.2).await?;
        let (tldr, key_points, body) = parse_synthesis(&raw);

        Ok(Answer::Grounded {
            tldr: truncate_chars(&tldr, TLDR_MAX_CHARS),
            key_points: clamp_key_points(key_points),
            body,
            citations,
            confidence: 0.0, // filled in by quality_gate once scored
        })
    }
}

fn build_prompt(state: &AgentState, budget: usize, refinement: Option<String>) -> String {
    let use_irac = matches!(state.complexity, Complexity::Complex | Complexity::Expert)
        || state.user_type == UserType::Professional;

    let context = state
        .bundled_context
        .iter()
        .enumerate()
        .map(|(i, b)| format!("[{}] {}", i + 1, b.chunk.chunk.text))
        .collect::<Vec<_>>()
        .join("\n\n");

    let register = if use_irac {
        "Structure the body as Issue, Rule, Application, Conclusion (IRAC)."
    } else {
        "Write the body as plain, accessible prose for a layperson."
    };

    let mut builder = PromptBuilder::new(
        "You are a legal research assistant answering questions about Zimbabwean \
         statute and case law. Ground every claim in the numbered sources below; \
         never state a fact the sources do not support. Respond as a JSON object \
         with keys \"tldr\" (<=220 characters), \"key_points\" (3 to 7 short \
         strings), and \"body\" (the full answer).",
    );
    builder = builder.section("SOURCES", context);
    builder = builder.section("STYLE", register);
    builder = builder.section("TOKEN_BUDGET", budget.to_string());
    if let Some(instructions) = refinement {
        builder = builder.section("REFINEMENT INSTRUCTIONS", instructions);
    }
    builder = builder.section("QUESTION", state.effective_query());
    builder.build()
}

/// Renders the self-critic's output (§4.11) into the text for a
/// `REFINEMENT INSTRUCTIONS` prompt section. Only called once
/// `SelfCriticNode` has populated at least one of the two fields.
fn refinement_instructions_text(state: &AgentState) -> String {
    let mut lines = Vec::new();
    if !state.priority_fixes.is_empty() {
        lines.push(format!("Priority fixes: {}", state.priority_fixes.join("; ")));
    }
    if !state.refinement_instructions.is_empty() {
        lines.push(format!("Instructions: {}", state.refinement_instructions.join("; ")));
    }
    lines.join("\n")
}

/// A chunk whose parent document could not be fetched (§4.6) is not a
/// primary authority: it carries no confirmed title or document identity,
/// so it is left out of citations rather than cited on a guess.
fn citations_from_context(bundled: &[BundledContext]) -> Vec<Citation> {
    bundled
        .iter()
        .filter_map(|b| {
            let parent = b.parent.as_ref()?;
            Some(Citation {
                title: parent.title.clone(),
                url: b.chunk.chunk.source_url.clone(),
                page: None,
                sha: Some(b.chunk.chunk.chunk_id.clone()),
            })
        })
        .collect()
}

fn parse_synthesis(raw: &str) -> (String, Vec<String>, String) {
    if let Ok(value) = serde_json::from_str::<serde_json::Value>(raw.trim()) {
        let tldr = value.get("tldr").and_then(|v| v.as_str()).unwrap_or_default().to_string();
        let key_points = value
            .get("key_points")
            .and_then(|v| v.as_array())
            .map(|arr| arr.iter().filter_map(|v| v.as_str().map(str::to_string)).collect())
            .unwrap_or_default();
        let body = value.get("body").and_then(|v| v.as_str()).unwrap_or(raw).to_string();
        return (tldr, key_points, body);
    }

    // Fallback: the model did not return JSON; use the raw text as the body
    // and derive a tldr from its first sentence.
    let tldr = raw.split('.').next().unwrap_or(raw).trim().to_string();
    (tldr, Vec::new(), raw.to_string())
}

fn clamp_key_points(mut points: Vec<String>) -> Vec<String> {
    points.retain(|p| !p.trim().is_empty());
    if points.len() > KEY_POINTS_MAX {
        points.truncate(KEY_POINTS_MAX);
    }
    while points.len() < KEY_POINTS_MIN && !points.is_empty() {
        // Never invent a point; if the model under-delivered, repeat
        // nothing and let the shortfall surface as-is rather than pad
        // with synthetic filler.
        break;
    }
    points
}

fn truncate_chars(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        text.to_string()
    } else {
        text.chars().take(max_chars).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use gweta_core::{Chunk, DocType, LlmStreamToken, ParentDocument, RetrievalResult};
    use std::collections::HashMap;
    use tokio::sync::mpsc;

    struct FakeLlm {
        response: String,
    }

    #[async_trait]
    impl Llm for FakeLlm {
        async fn complete(&self, _p: &str, _m: usize, _t: f32) -> Result<String, Error> {
            Ok(self.response.clone())
        }
        async fn stream(
            &self,
            _p: &str,
            _m: usize,
            _t: f32,
            _s: mpsc::Sender<LlmStreamToken>,
        ) -> Result<String, Error> {
            Ok(self.response.clone())
        }
    }

    fn sample_state() -> AgentState {
        let mut state = AgentState::new("What is the minimum wage?", "s1", "u1");
        state.bundled_context = vec![BundledContext {
            chunk: RetrievalResult {
                chunk: Chunk {
                    chunk_id: "c1".into(),
                    parent_doc_id: "p1".into(),
                    text: "The minimum wage is set by statutory instrument.".into(),
                    doc_type: DocType::Act,
                    section_path: "s12".into(),
                    start_char: 0,
                    end_char: 10,
                    num_tokens: 10,
                    language: "en".into(),
                    date_context: None,
                    entities: vec![],
                    source_url: "https://example.org/act".into(),
                    metadata: HashMap::new(),
                },
                score: 0.8,
                confidence: Some(0.9),
                source: "hybrid".into(),
            },
            parent: Some(ParentDocument {
                parent_doc_id: "p1".into(),
                doc_type: DocType::Act,
                title: "Labour Act".into(),
                canonical_citation: Some("Chapter 28:01".into()),
                language: "en".into(),
                jurisdiction: "ZW".into(),
                version_effective_date: None,
                source_url: "https://example.org/act".into(),
                content_tree: serde_json::Value::Null,
                markdown: String::new(),
            }),
        }];
        state
    }

    #[tokio::test]
    async fn synthesizes_grounded_answer_with_citations() {
        let raw = r#"{"tldr": "Short answer.", "key_points": ["a", "b", "c"], "body": "Full body text."}"#;
        let synthesizer = Synthesizer::new(Arc::new(FakeLlm { response: raw.to_string() }));
        let state = sample_state();
        let answer = synthesizer.synthesize(&state).await.unwrap();
        match answer {
            Answer::Grounded { tldr, key_points, citations, .. } => {
                assert_eq!(tldr, "Short answer.");
                assert_eq!(key_points.len(), 3);
                assert_eq!(citations.len(), 1);
                assert_eq!(citations[0].sha.as_deref(), Some("c1"));
            }
            _ => panic!("expected Grounded"),
        }
    }

    #[tokio::test]
    async fn citation_excluded_when_parent_missing() {
        let raw = r#"{"tldr": "Short answer.", "key_points": ["a", "b", "c"], "body": "Full body text."}"#;
        let synthesizer = Synthesizer::new(Arc::new(FakeLlm { response: raw.to_string() }));
        let mut state = sample_state();
        state.bundled_context[0].parent = None;
        let answer = synthesizer.synthesize(&state).await.unwrap();
        match answer {
            Answer::Grounded { citations, .. } => assert!(citations.is_empty()),
            _ => panic!("expected Grounded"),
        }
    }

    struct CapturingLlm {
        response: String,
        last_prompt: std::sync::Mutex<Option<String>>,
    }

    #[async_trait]
    impl Llm for CapturingLlm {
        async fn complete(&self, p: &str, _m: usize, _t: f32) -> Result<String, Error> {
            *self.last_prompt.lock().unwrap() = Some(p.to_string());
            Ok(self.response.clone())
        }
        async fn stream(
            &self,
            _p: &str,
            _m: usize,
            _t: f32,
            _s: mpsc::Sender<LlmStreamToken>,
        ) -> Result<String, Error> {
            Ok(self.response.clone())
        }
    }

    #[tokio::test]
    async fn refine_prompt_carries_refinement_instructions() {
        let raw = r#"{"tldr": "Short answer.", "key_points": ["a", "b", "c"], "body": "Revised body."}"#;
        let llm = Arc::new(CapturingLlm { response: raw.to_string(), last_prompt: std::sync::Mutex::new(None) });
        let synthesizer = Synthesizer::new(llm.clone());
        let mut state = sample_state();
        state.priority_fixes = vec!["cite the Labour Act section directly".to_string()];
        state.refinement_instructions = vec!["shorten the tldr".to_string()];

        synthesizer.refine(&state).await.unwrap();

        let prompt = llm.last_prompt.lock().unwrap().clone().unwrap();
        assert!(prompt.contains("REFINEMENT INSTRUCTIONS"));
        assert!(prompt.contains("cite the Labour Act section directly"));
        assert!(prompt.contains("shorten the tldr"));
    }

    #[tokio::test]
    async fn non_json_response_falls_back_to_raw_body() {
        let synthesizer = Synthesizer::new(Arc::new(FakeLlm { response: "Plain answer. More detail.".into() }));
        let state = sample_state();
        let answer = synthesizer.synthesize(&state).await.unwrap();
        match answer {
            Answer::Grounded { tldr, body, .. } => {
                assert_eq!(tldr, "Plain answer");
                assert!(body.contains("More detail"));
            }
            _ => panic!("expected Grounded"),
        }
    }
}
