//! Self-critic: turns quality-gate issues into structured refinement
//! instructions for `refined_synthesize` (§4.11).
//!
//! Grounded on the donor's `persuasion.rs` objection-handling pattern
//! (classify the weakness, produce a targeted counter), generalized from
//! sales objections to answer-quality issues, with a fallback to generic
//! instructions when the model's critique does not parse as JSON.

use std::sync::Arc;

use gweta_core::{AgentState, Error, Llm};
use gweta_llm::PromptBuilder;

use crate::quality::QualityScores;

pub struct SelfCritic {
    llm: Arc<dyn Llm>,
}

pub struct Critique {
    pub instructions: Vec<String>,
    pub priority_fixes: Vec<String>,
}

const GENERIC_INSTRUCTIONS: &[&str] =
    &["Tighten grounding to the provided sources.", "Address the question more directly."];

impl SelfCritic {
    pub fn new(llm: Arc<dyn Llm>) -> Self {
        Self { llm }
    }

    #[tracing::instrument(skip(self, state, scores))]
    pub async fn critique(&self, state: &AgentState, scores: &QualityScores) -> Critique {
        if scores.issues.is_empty() {
            return Critique { instructions: Vec::new(), priority_fixes: Vec::new() };
        }

        let prompt = build_prompt(state, scores);
        match self.llm.complete(&prompt, 300, 0.2).await {
            Ok(raw) => parse_critique(&raw).unwrap_or_else(fallback_critique),
            Err(err) => {
                tracing::warn!(error = %err, "self-critic call failed, using generic instructions");
                fallback_critique()
            }
        }
    }
}

fn build_prompt(state: &AgentState, scores: &QualityScores) -> String {
    let issues = scores.issues.join("; ");
    PromptBuilder::new(
        "A legal answer failed quality review. Respond with exactly one JSON \
         object: {\"instructions\": [short imperative strings], \
         \"priority_fixes\": [short imperative strings, most important first]}.",
    )
    .section("ISSUES", issues)
    .section("QUESTION", state.effective_query())
    .build()
}

fn parse_critique(raw: &str) -> Option<Critique> {
    let value: serde_json::Value = serde_json::from_str(raw.trim()).ok()?;
    let instructions = value
        .get("instructions")?
        .as_array()?
        .iter()
        .filter_map(|v| v.as_str().map(str::to_string))
        .collect::<Vec<_>>();
    let priority_fixes = value
        .get("priority_fixes")
        .and_then(|v| v.as_array())
        .map(|arr| arr.iter().filter_map(|v| v.as_str().map(str::to_string)).collect())
        .unwrap_or_default();

    if instructions.is_empty() {
        return None;
    }
    Some(Critique { instructions, priority_fixes })
}

fn fallback_critique() -> Critique {
    Critique {
        instructions: GENERIC_INSTRUCTIONS.iter().map(|s| s.to_string()).collect(),
        priority_fixes: Vec::new(),
    }
}
