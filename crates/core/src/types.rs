//! Data model entities (spec §3).

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// The legal document categories a chunk can be drawn from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DocType {
    Act,
    Si,
    Constitution,
    Judgment,
    Regulation,
    Other,
}

/// A contiguous, content-addressed passage of a parent legal document.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Chunk {
    pub chunk_id: String,
    pub parent_doc_id: String,
    pub text: String,
    pub doc_type: DocType,
    pub section_path: String,
    pub start_char: usize,
    pub end_char: usize,
    pub num_tokens: usize,
    pub language: String,
    pub date_context: Option<String>,
    pub entities: Vec<String>,
    pub source_url: String,
    pub metadata: HashMap<String, String>,
}

impl Chunk {
    /// The corpus's content-length cap (§4.2): no chunk text may exceed this.
    pub const MAX_TEXT_CHARS: usize = 5000;

    pub fn text_within_cap(&self) -> bool {
        self.text.chars().count() <= Self::MAX_TEXT_CHARS
    }
}

/// The full source document a chunk was extracted from; immutable per
/// version and retrieved by key from blob storage.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ParentDocument {
    pub parent_doc_id: String,
    pub doc_type: DocType,
    pub title: String,
    pub canonical_citation: Option<String>,
    pub language: String,
    /// Always `"ZW"` for this corpus.
    pub jurisdiction: String,
    pub version_effective_date: Option<DateTime<Utc>>,
    pub source_url: String,
    pub content_tree: serde_json::Value,
    pub markdown: String,
}

/// A `Chunk` enriched with retrieval/rerank scores.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetrievalResult {
    #[serde(flatten)]
    pub chunk: Chunk,
    /// Raw retriever score, preserved unchanged through reranking.
    pub score: f32,
    /// Post-rerank relevance in `[0, 1]`; `None` until reranked.
    pub confidence: Option<f32>,
    /// Which retriever produced this result (`"lexical"` / `"dense"`).
    pub source: String,
}

/// A `{chunk, parent}` pair attached to the synthesis context once the
/// chunk's parent has been fetched (or found missing).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BundledContext {
    pub chunk: RetrievalResult,
    pub parent: Option<ParentDocument>,
}

/// A citation surfaced to callers in the final answer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Citation {
    pub title: String,
    pub url: String,
    pub page: Option<u32>,
    pub sha: Option<String>,
}

/// Query complexity, driving the adaptive top-k policy (§4.5) and the
/// synthesizer's token budget (§4.9).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Complexity {
    Simple,
    Moderate,
    Complex,
    Expert,
}

/// Inferred reader sophistication; biases synthesis register (plain prose
/// vs. IRAC) and default complexity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UserType {
    Citizen,
    Professional,
}

/// One of the seven intents the heuristic/LLM classifier emits (§4.7).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Intent {
    Constitutional,
    Statutory,
    CaseLaw,
    Procedural,
    Rights,
    Conversational,
    Summarization,
}

/// Tagged terminal answer shape (§9's redesign note): the graph driver
/// always produces exactly one of these three, never a loosely-typed map.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Answer {
    Grounded {
        tldr: String,
        key_points: Vec<String>,
        body: String,
        citations: Vec<Citation>,
        confidence: f32,
    },
    Degraded {
        tldr: String,
        body: String,
        citations: Vec<Citation>,
        confidence: f32,
        warnings: Vec<String>,
    },
    Error {
        request_id: String,
        kind: String,
        message: String,
    },
}

impl Answer {
    pub fn warnings(&self) -> &[String] {
        match self {
            Answer::Degraded { warnings, .. } => warnings,
            _ => &[],
        }
    }

    pub fn confidence(&self) -> f32 {
        match self {
            Answer::Grounded { confidence, .. } => *confidence,
            Answer::Degraded { confidence, .. } => *confidence,
            Answer::Error { .. } => 0.0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn chunk_text_cap_is_enforced() {
        let mut chunk = sample_chunk();
        chunk.text = "a".repeat(Chunk::MAX_TEXT_CHARS);
        assert!(chunk.text_within_cap());
        chunk.text.push('a');
        assert!(!chunk.text_within_cap());
    }

    #[test]
    fn answer_degraded_carries_warnings() {
        let a = Answer::Degraded {
            tldr: "t".into(),
            body: "b".into(),
            citations: vec![],
            confidence: 0.4,
            warnings: vec!["quality_below_threshold".into()],
        };
        assert_eq!(a.warnings(), &["quality_below_threshold".to_string()]);
    }

    fn sample_chunk() -> Chunk {
        Chunk {
            chunk_id: "abc0123456789def".into(),
            parent_doc_id: "doc-1".into(),
            text: "text".into(),
            doc_type: DocType::Act,
            section_path: "s1".into(),
            start_char: 0,
            end_char: 4,
            num_tokens: 1,
            language: "en".into(),
            date_context: None,
            entities: vec![],
            source_url: "https://example.org".into(),
            metadata: HashMap::new(),
        }
    }
}
