//! Claude-backed reference adapter for the `gweta_core::Llm` provider
//! interface, plus prompt construction helpers shared by the synthesizer,
//! self-critic, and intent-classification fallback.

mod claude;
mod error;
mod prompt;

pub use claude::{ClaudeConfig, ClaudeLlm, ClaudeModel};
pub use error::LlmError;
pub use prompt::PromptBuilder;
