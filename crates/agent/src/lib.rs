//! Agent internals: short/long-term memory, the synthesizer, quality
//! gates, self-critic, and the typed graph runtime that sequences them.

pub mod graph;
pub mod memory;
pub mod quality;
pub mod self_critic;
pub mod synthesis;

pub use graph::{AgentGraph, GraphDeps, Node, NodeOutcome};
pub use memory::{LongTermMemory, MemoryCoordinator, MemoryFetch, ShortTermMemory};
pub use quality::{decide, QualityDecision, QualityGate, QualityScores};
pub use self_critic::{Critique, SelfCritic};
pub use synthesis::Synthesizer;
