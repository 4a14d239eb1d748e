//! Crate-wide error taxonomy.
//!
//! Every other crate defines its own narrower error enum and converts into
//! this one at the boundary, the same layering the rest of the workspace
//! uses for its `RagError`/`LlmError`-style per-crate errors.

use thiserror::Error;

/// The kinds of failure the query orchestration core can surface.
///
/// This is a taxonomy of *kinds*, not a 1:1 mirror of every internal error
/// type: node-local recovery happens before a failure ever reaches here.
#[derive(Error, Debug)]
pub enum Error {
    #[error("invalid input: {0}")]
    InputInvalid(String),

    #[error("authentication required")]
    AuthRequired,

    #[error("invalid credentials")]
    AuthInvalid,

    #[error("rate limited, retry after {retry_after_s}s")]
    RateLimited { retry_after_s: u64 },

    #[error("lexical retriever unavailable: {0}")]
    RetrieverUnavailable(String),

    #[error("embedding provider unavailable: {0}")]
    EmbeddingUnavailable(String),

    #[error("llm provider unavailable: {0}")]
    LlmUnavailable(String),

    #[error("blob not found: {0}")]
    BlobMiss(String),

    #[error("cache fault: {0}")]
    CacheFault(String),

    #[error("memory fault: {0}")]
    MemoryFault(String),

    #[error("request timed out")]
    Timeout,

    #[error("request cancelled")]
    Cancelled,

    #[error("request aborted: {0}")]
    RequestAborted(String),

    #[error("internal error (request_id={request_id}): {message}")]
    Internal { request_id: String, message: String },
}

impl Error {
    /// Whether this error should be surfaced as a degraded-but-successful
    /// answer rather than a hard failure, per the error handling design.
    pub fn is_recoverable_as_degraded(&self) -> bool {
        matches!(
            self,
            Error::RetrieverUnavailable(_)
                | Error::EmbeddingUnavailable(_)
                | Error::LlmUnavailable(_)
                | Error::BlobMiss(_)
                | Error::CacheFault(_)
                | Error::MemoryFault(_)
        )
    }

    pub fn internal(request_id: impl Into<String>, message: impl Into<String>) -> Self {
        Error::Internal {
            request_id: request_id.into(),
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn degraded_recovery_classification() {
        assert!(Error::BlobMiss("p1".into()).is_recoverable_as_degraded());
        assert!(!Error::InputInvalid("empty".into()).is_recoverable_as_degraded());
    }

    #[test]
    fn internal_error_carries_request_id() {
        let err = Error::internal("req-1", "boom");
        assert!(err.to_string().contains("req-1"));
    }
}
