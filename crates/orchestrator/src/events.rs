//! The streaming event grammar of §4.15:
//! `meta -> retrieval* -> token* -> citation* -> final | error`.
//!
//! Grounded on the donor's `PipelineEvent` enum in `pipeline/src/orchestrator.rs`
//! (a tagged event enum broadcast as the pipeline progresses through VAD/STT/
//! TTS stages), generalized from the voice pipeline's stage events to the
//! retrieval/synthesis stage events of a single query, and from a
//! `broadcast` fan-out to a per-request bounded `mpsc` channel matching
//! `gweta-llm`'s token-streaming idiom.

use serde::Serialize;

use gweta_core::Citation;

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum StreamEvent {
    Meta { request_id: String, trace_id: String },
    Retrieval { source: String, candidate_count: usize },
    Token { text: String },
    Citation { citation: Citation },
    Final { response: crate::response::QueryResponse },
    Error { request_id: String, kind: String, message: String },
}

/// Enforces the event grammar at the point of emission: `meta` must be
/// first, `final`/`error` must be last, and nothing may follow either.
/// A violation is a programming error in the orchestrator, not a runtime
/// condition callers can trigger — panics rather than degrading silently.
pub struct GrammarEmitter {
    tx: tokio::sync::mpsc::Sender<StreamEvent>,
    phase: Phase,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    BeforeMeta,
    Streaming,
    Closed,
}

impl GrammarEmitter {
    pub fn new(tx: tokio::sync::mpsc::Sender<StreamEvent>) -> Self {
        Self { tx, phase: Phase::BeforeMeta }
    }

    pub async fn meta(&mut self, request_id: String, trace_id: String) {
        assert_eq!(self.phase, Phase::BeforeMeta, "meta must be the first event");
        self.phase = Phase::Streaming;
        let _ = self.tx.send(StreamEvent::Meta { request_id, trace_id }).await;
    }

    pub async fn retrieval(&mut self, source: impl Into<String>, candidate_count: usize) {
        assert_eq!(self.phase, Phase::Streaming, "retrieval may not precede meta or follow final/error");
        let _ = self.tx.send(StreamEvent::Retrieval { source: source.into(), candidate_count }).await;
    }

    pub async fn token(&mut self, text: impl Into<String>) {
        assert_eq!(self.phase, Phase::Streaming, "token may not precede meta or follow final/error");
        let _ = self.tx.send(StreamEvent::Token { text: text.into() }).await;
    }

    pub async fn citation(&mut self, citation: Citation) {
        assert_eq!(self.phase, Phase::Streaming, "citation may not precede meta or follow final/error");
        let _ = self.tx.send(StreamEvent::Citation { citation }).await;
    }

    pub async fn finish(mut self, response: crate::response::QueryResponse) {
        assert_eq!(self.phase, Phase::Streaming, "final may not precede meta or follow another final/error");
        self.phase = Phase::Closed;
        let _ = self.tx.send(StreamEvent::Final { response }).await;
    }

    pub async fn abort(mut self, request_id: String, kind: impl Into<String>, message: impl Into<String>) {
        assert_ne!(self.phase, Phase::Closed, "error may not follow another final/error");
        self.phase = Phase::Closed;
        let _ = self.tx.send(StreamEvent::Error { request_id, kind: kind.into(), message: message.into() }).await;
    }
}
