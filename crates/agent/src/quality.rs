//! Quality gates: three independent checkers scored and combined by a
//! weighted mean, then routed by a 5-branch priority decision function
//! (§4.10).
//!
//! Grounded on the donor's multi-signal scoring idiom in `lead_scoring.rs`
//! (independent weighted signals summed into one score that drives a
//! branching decision), generalized from sales-qualification signals to
//! attribution/coherence/relevance checks over a legal answer.

use std::sync::Arc;

use gweta_config::constants::quality::{weighted_mean, COMPLEX_REFINE_THRESHOLD, QUALITY_THRESHOLD, WEAK_BAND_LOW};
use gweta_core::{AgentState, Answer, Complexity, Error, Llm};
use gweta_llm::PromptBuilder;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QualityDecision {
    Pass,
    RefineSynthesis,
    RetrieveMore,
    Fail,
}

pub struct QualityGate {
    llm: Arc<dyn Llm>,
}

pub struct QualityScores {
    pub attribution: f32,
    pub coherence: f32,
    pub relevance: f32,
    pub source_gap: bool,
    pub issues: Vec<String>,
}

impl QualityGate {
    pub fn new(llm: Arc<dyn Llm>) -> Self {
        Self { llm }
    }

    /// Runs the three checkers concurrently and combines them into a
    /// single confidence score (§4.10).
    #[tracing::instrument(skip(self, state))]
    pub async fn evaluate(&self, state: &AgentState) -> QualityScores {
        let (attribution, coherence, relevance) = tokio::join!(
            self.check_attribution(state),
            self.check_coherence(state),
            self.check_relevance(state),
        );

        let mut issues = Vec::new();
        if attribution < QUALITY_THRESHOLD {
            issues.push("attribution_below_threshold".to_string());
        }
        if coherence < QUALITY_THRESHOLD {
            issues.push("coherence_below_threshold".to_string());
        }
        if relevance < QUALITY_THRESHOLD {
            issues.push("relevance_below_threshold".to_string());
        }

        // A source gap is flagged when the relevance checker scores low
        // *and* the bundled context is thin relative to the adaptive
        // rerank_top_k — i.e. the synthesizer had little to ground on.
        let source_gap = relevance < WEAK_BAND_LOW && state.bundled_context.len() < state.rerank_top_k / 2;

        QualityScores { attribution, coherence, relevance, source_gap, issues }
    }

    /// Checks that every sentence-level claim in the synthesis is
    /// supported by `bundled_context`; scores 1.0 when there is no
    /// synthesis to check against (nothing to attribute).
    async fn check_attribution(&self, state: &AgentState) -> f32 {
        let Some(Answer::Grounded { body, .. }) = &state.synthesis else { return 0.0 };
        if state.bundled_context.is_empty() {
            return 0.0;
        }
        self.score_with_llm(
            "Rate from 0.0 to 1.0 how well every factual claim in the ANSWER is \
             directly supported by the SOURCES. Respond with only the number.",
            &bundled_context_text(state),
            body,
        )
        .await
    }

    async fn check_coherence(&self, state: &AgentState) -> f32 {
        let Some(Answer::Grounded { body, .. }) = &state.synthesis else { return 0.0 };
        self.score_with_llm(
            "Rate from 0.0 to 1.0 how logically coherent and internally consistent \
             the ANSWER is, independent of the sources. Respond with only the number.",
            "",
            body,
        )
        .await
    }

    async fn check_relevance(&self, state: &AgentState) -> f32 {
        let Some(Answer::Grounded { body, .. }) = &state.synthesis else { return 0.0 };
        self.score_with_llm(
            "Rate from 0.0 to 1.0 how directly the ANSWER addresses the QUESTION. \
             Respond with only the number.",
            state.effective_query(),
            body,
        )
        .await
    }

    async fn score_with_llm(&self, instruction: &str, context: &str, answer: &str) -> f32 {
        let mut builder = PromptBuilder::new(instruction);
        if !context.is_empty() {
            builder = builder.section("CONTEXT", context);
        }
        builder = builder.section("ANSWER", answer);
        let prompt = builder.build();

        match self.llm.complete(&prompt, 10, 0.0).await {
            Ok(raw) => raw.trim().parse::<f32>().unwrap_or(0.5).clamp(0.0, 1.0),
            Err(err) => {
                tracing::warn!(error = %err, "quality checker call failed, defaulting to weak score");
                0.5
            }
        }
    }
}

fn bundled_context_text(state: &AgentState) -> String {
    state
        .bundled_context
        .iter()
        .map(|b| b.chunk.chunk.text.as_str())
        .collect::<Vec<_>>()
        .join("\n\n")
}

impl QualityScores {
    pub fn confidence(&self) -> f32 {
        weighted_mean(self.attribution, self.coherence, self.relevance)
    }
}

/// The 5-branch priority decision of §4.10, evaluated in order:
/// 1. iteration cap reached -> fail
/// 2. a source gap exists and iteration budget remains -> retrieve_more
/// 3. confidence is in the weak band and iteration budget remains -> refine_synthesis
/// 4. complex/expert intent with sub-threshold confidence and iteration budget remains -> refine_synthesis
/// 5. otherwise -> pass
pub fn decide(state: &AgentState, scores: &QualityScores) -> QualityDecision {
    let confidence = scores.confidence();

    if state.iteration_cap_reached() {
        return QualityDecision::Fail;
    }
    if scores.source_gap {
        return QualityDecision::RetrieveMore;
    }
    if confidence >= WEAK_BAND_LOW && confidence < QUALITY_THRESHOLD {
        return QualityDecision::RefineSynthesis;
    }
    let is_demanding = matches!(state.complexity, Complexity::Complex | Complexity::Expert);
    if is_demanding && confidence < COMPLEX_REFINE_THRESHOLD {
        return QualityDecision::RefineSynthesis;
    }
    QualityDecision::Pass
}
