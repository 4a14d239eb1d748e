//! Two-tier intent classification: heuristic pattern-matching first, LLM
//! fallback when heuristic confidence is low (§4.7).
//!
//! The heuristic vocabulary-category idiom is grounded on the donor's
//! `domain_boost.rs` (`TermCategory`, per-category term lists), generalized
//! from gold-loan product/rate/process terms to the seven legal intents.

use std::sync::Arc;

use gweta_core::{Complexity, Error, ExpertiseLevel, Intent, Llm, UserType};
use once_cell::sync::Lazy;
use regex::Regex;

/// Below this heuristic confidence, the LLM fallback is invoked (§4.7).
pub const LLM_FALLBACK_THRESHOLD: f32 = 0.8;

#[derive(Debug, Clone)]
pub struct IntentClassification {
    pub intent: Intent,
    pub complexity: Complexity,
    pub user_type: UserType,
    pub confidence: f32,
}

static PROFESSIONAL_CUE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)section\s+\d+\s*(\([0-9a-z]+\))+|pleadings?|affidavit|heads of argument").unwrap());

static CITATION_CUE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)\[\d{4}\]\s*zwsc|\bchapter\s+\d").unwrap());

struct IntentCue {
    intent: Intent,
    keywords: &'static [&'static str],
}

const INTENT_CUES: &[IntentCue] = &[
    IntentCue { intent: Intent::Constitutional, keywords: &["constitution", "bill of rights", "section 50", "fundamental right"] },
    IntentCue { intent: Intent::Statutory, keywords: &["act", "statutory instrument", "si ", "statute", "regulation"] },
    IntentCue { intent: Intent::CaseLaw, keywords: &["case", "judgment", "ruling", "precedent", "court held"] },
    IntentCue { intent: Intent::Procedural, keywords: &["how do i", "procedure", "file a", "apply for", "process of"] },
    IntentCue { intent: Intent::Rights, keywords: &["my rights", "am i entitled", "can i be", "is it legal"] },
    IntentCue { intent: Intent::Summarization, keywords: &["summarize", "summary", "explain in brief", "tldr"] },
    IntentCue { intent: Intent::Conversational, keywords: &["hello", "hi", "thanks", "thank you"] },
];

pub struct IntentClassifier {
    llm: Arc<dyn Llm>,
}

impl IntentClassifier {
    pub fn new(llm: Arc<dyn Llm>) -> Self {
        Self { llm }
    }

    /// Runs the heuristic pass; if its confidence is below the fallback
    /// threshold, invokes the LLM for a second opinion. `known_expertise`
    /// biases `user_type` and complexity for a returning user with a
    /// stable classification (§4.7).
    #[tracing::instrument(skip(self, query))]
    pub async fn classify(
        &self,
        query: &str,
        known_expertise: Option<ExpertiseLevel>,
    ) -> Result<IntentClassification, Error> {
        let mut classification = heuristic_classify(query);

        if let Some(level) = known_expertise {
            if level != ExpertiseLevel::Unknown {
                classification.user_type = match level {
                    ExpertiseLevel::Professional => UserType::Professional,
                    _ => UserType::Citizen,
                };
            }
        }

        if classification.confidence >= LLM_FALLBACK_THRESHOLD {
            return Ok(classification);
        }

        match self.llm_classify(query).await {
            Ok(llm_classification) => Ok(llm_classification),
            Err(err) => {
                tracing::warn!(error = %err, "intent LLM fallback failed, keeping heuristic result");
                Ok(classification)
            }
        }
    }

    async fn llm_classify(&self, query: &str) -> Result<IntentClassification, Error> {
        let prompt = format!(
            "Classify the following legal question. Respond with exactly one JSON object: \
             {{\"intent\": one of [constitutional, statutory, case_law, procedural, rights, conversational, summarization], \
             \"complexity\": one of [simple, moderate, complex, expert], \
             \"user_type\": one of [citizen, professional]}}.\n\nQuestion: {query}"
        );
        let response = self.llm.complete(&prompt, 150, 0.0).await?;
        parse_llm_classification(&response)
            .ok_or_else(|| Error::internal("intent_classifier", "unparseable LLM classification"))
    }
}

fn parse_llm_classification(raw: &str) -> Option<IntentClassification> {
    let value: serde_json::Value = serde_json::from_str(raw.trim()).ok()?;
    let intent = match value.get("intent")?.as_str()? {
        "constitutional" => Intent::Constitutional,
        "statutory" => Intent::Statutory,
        "case_law" => Intent::CaseLaw,
        "procedural" => Intent::Procedural,
        "rights" => Intent::Rights,
        "conversational" => Intent::Conversational,
        "summarization" => Intent::Summarization,
        _ => return None,
    };
    let complexity = match value.get("complexity")?.as_str()? {
        "simple" => Complexity::Simple,
        "moderate" => Complexity::Moderate,
        "complex" => Complexity::Complex,
        "expert" => Complexity::Expert,
        _ => return None,
    };
    let user_type = match value.get("user_type")?.as_str()? {
        "citizen" => UserType::Citizen,
        "professional" => UserType::Professional,
        _ => return None,
    };
    Some(IntentClassification { intent, complexity, user_type, confidence: 0.6 })
}

/// Pattern-matches intent, assesses complexity from length/operator
/// density/vocabulary cues, and infers `user_type` from professional
/// indicators (§4.7).
fn heuristic_classify(query: &str) -> IntentClassification {
    let lower = query.to_lowercase();
    let trimmed = lower.trim();

    if trimmed.is_empty() {
        return IntentClassification {
            intent: Intent::Conversational,
            complexity: Complexity::Simple,
            user_type: UserType::Citizen,
            confidence: 1.0,
        };
    }

    let mut best: Option<(Intent, usize)> = None;
    for cue in INTENT_CUES {
        let hits = cue.keywords.iter().filter(|kw| lower.contains(*kw)).count();
        if hits > 0 && best.as_ref().map(|(_, best_hits)| hits > *best_hits).unwrap_or(true) {
            best = Some((cue.intent, hits));
        }
    }
    let (intent, hits) = best.unwrap_or((Intent::Statutory, 0));

    let is_professional = PROFESSIONAL_CUE.is_match(&lower) || CITATION_CUE.is_match(&lower);
    let user_type = if is_professional { UserType::Professional } else { UserType::Citizen };

    let word_count = trimmed.split_whitespace().count();
    let operator_density = lower.matches(" and ").count() + lower.matches(" or ").count() + lower.matches(';').count();
    let complexity = match (word_count, operator_density, is_professional) {
        (_, d, _) if d >= 2 => Complexity::Expert,
        (w, _, true) if w > 25 => Complexity::Complex,
        (w, _, _) if w > 25 => Complexity::Moderate,
        (w, _, _) if w > 12 => Complexity::Moderate,
        _ => Complexity::Simple,
    };

    // Confidence reflects how decisively the keyword vocabulary matched;
    // a clean single-intent hit is high confidence, no hit is low.
    let confidence = match hits {
        0 => 0.4,
        1 => 0.75,
        _ => 0.9,
    };

    IntentClassification { intent, complexity, user_type, confidence }
}
