//! `AgentState`: the typed, per-request record the agent graph runtime owns
//! exclusively for the lifetime of one request (spec §3).

use serde::{Deserialize, Serialize};

use crate::types::{Answer, BundledContext, Citation, Complexity, Intent, RetrievalResult, UserType};

/// Per-request state owned exclusively by the graph runtime. Never shared
/// across concurrent requests. Kept JSON-serializable and small (the spec
/// caps it at 8 KiB) so it can be checkpointed between node executions.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentState {
    pub raw_query: String,
    pub rewritten_query: Option<String>,
    pub session_id: String,
    pub user_id: String,
    pub trace_id: String,

    pub intent: Option<Intent>,
    pub complexity: Complexity,
    pub user_type: UserType,
    pub reasoning_framework: Option<String>,
    pub legal_areas: Vec<String>,

    pub retrieval_top_k: usize,
    pub rerank_top_k: usize,

    pub combined_results: Vec<RetrievalResult>,
    pub reranked_results: Vec<RetrievalResult>,
    pub selected_chunks: Vec<RetrievalResult>,
    pub bundled_context: Vec<BundledContext>,

    pub synthesis: Option<Answer>,
    pub quality_passed: Option<bool>,
    pub quality_confidence: Option<f32>,
    pub quality_issues: Vec<String>,

    pub refinement_iteration: u32,
    pub refinement_instructions: Vec<String>,
    pub priority_fixes: Vec<String>,
    pub suggested_additions: Vec<String>,

    pub rerank_method: Option<String>,

    pub final_answer: Option<Answer>,
    pub citations: Vec<Citation>,
    pub memory_context: Option<String>,
    pub cache_hit: bool,

    pub warnings: Vec<String>,
}

impl AgentState {
    pub fn new(raw_query: impl Into<String>, session_id: impl Into<String>, user_id: impl Into<String>) -> Self {
        Self {
            raw_query: raw_query.into(),
            rewritten_query: None,
            session_id: session_id.into(),
            user_id: user_id.into(),
            trace_id: uuid::Uuid::new_v4().to_string(),
            intent: None,
            complexity: Complexity::Simple,
            user_type: UserType::Citizen,
            reasoning_framework: None,
            legal_areas: Vec::new(),
            retrieval_top_k: 15,
            rerank_top_k: 5,
            combined_results: Vec::new(),
            reranked_results: Vec::new(),
            selected_chunks: Vec::new(),
            bundled_context: Vec::new(),
            synthesis: None,
            quality_passed: None,
            quality_confidence: None,
            quality_issues: Vec::new(),
            refinement_iteration: 0,
            refinement_instructions: Vec::new(),
            priority_fixes: Vec::new(),
            suggested_additions: Vec::new(),
            rerank_method: None,
            final_answer: None,
            citations: Vec::new(),
            memory_context: None,
            cache_hit: false,
            warnings: Vec::new(),
        }
    }

    /// The query the retrieval nodes should act on: the rewritten form if
    /// one exists, otherwise the raw query.
    pub fn effective_query(&self) -> &str {
        self.rewritten_query.as_deref().unwrap_or(&self.raw_query)
    }

    /// The per-request iteration cap (spec §4.1, §4.10): `refinement_iteration <= 2`.
    pub const ITERATION_CAP: u32 = 2;

    pub fn iteration_cap_reached(&self) -> bool {
        self.refinement_iteration >= Self::ITERATION_CAP
    }
}
