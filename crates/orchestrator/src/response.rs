//! The external request/response shapes of §6 — the core's one stable
//! JSON contract, independent of the graph's internal `AgentState`.

use serde::{Deserialize, Serialize};

use gweta_core::Citation;

/// The caller-facing query request (§6).
#[derive(Debug, Clone, Deserialize)]
pub struct QueryRequest {
    pub text: String,
    pub user_id: String,
    pub session_id: String,
    pub channel: String,
    pub lang_hint: Option<String>,
    pub date_ctx: Option<String>,
}

/// The caller-facing, non-streaming response (§6). `source` distinguishes
/// a fresh answer from a cache hit (`"cache:exact"` / `"cache:semantic"`)
/// so callers can reason about `processing_time_ms`.
#[derive(Debug, Clone, Serialize)]
pub struct QueryResponse {
    pub tldr: String,
    pub key_points: Vec<String>,
    pub body: String,
    pub citations: Vec<Citation>,
    pub confidence: f32,
    pub source: String,
    pub request_id: String,
    pub processing_time_ms: u64,
    pub warnings: Vec<String>,
}
