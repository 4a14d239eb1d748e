use async_trait::async_trait;
use tokio::sync::mpsc;

use crate::error::Error;

/// One piece of a streamed completion.
#[derive(Debug, Clone)]
pub struct LlmStreamToken {
    pub text: String,
    pub is_final: bool,
}

/// The LLM provider interface (§6). The provider's network behavior itself
/// is out of scope; this is the seam `gweta-llm`'s reference adapter and the
/// synthesizer/quality nodes are built against.
#[async_trait]
pub trait Llm: Send + Sync {
    async fn complete(&self, prompt: &str, max_tokens: usize, temperature: f32) -> Result<String, Error>;

    /// Streams tokens over `tx` as they are generated; returns the full text
    /// once generation completes.
    async fn stream(
        &self,
        prompt: &str,
        max_tokens: usize,
        temperature: f32,
        tx: mpsc::Sender<LlmStreamToken>,
    ) -> Result<String, Error>;
}
