//! The typed agent graph runtime: 17 named nodes behind a shared `Node`
//! trait, static edges except the quality gate's 4-way branch (§4.1).
//!
//! Grounded on the donor's `StageManagerAdapter`/`ConversationFSM` seam in
//! `fsm_adapter.rs` — a small trait wrapping state-machine steps so the
//! driver can be tested against mock stages — generalized from a
//! conversational-stage FSM to a one-shot request DAG.

mod nodes;
mod runtime;

use async_trait::async_trait;
use gweta_core::{AgentState, Error};

use crate::quality::QualityDecision;

/// What a node's execution tells the graph driver to do next. Only
/// `cache_lookup` and `quality_gate` ever return a variant other than
/// `Continue`; every other node follows the static edge to its successor.
pub enum NodeOutcome {
    Continue,
    Halt,
    QualityDecision(QualityDecision),
}

#[async_trait]
pub trait Node: Send + Sync {
    fn name(&self) -> &'static str;
    async fn run(&self, state: &mut AgentState) -> Result<NodeOutcome, Error>;
}

pub use runtime::{AgentGraph, GraphDeps};
