//! The orchestrator's narrow error type, converting into the crate-wide
//! taxonomy at the boundary (§7's layering, same as `RetrievalError`/
//! `MemoryError`).

use thiserror::Error;

#[derive(Error, Debug)]
pub enum OrchestratorError {
    #[error("request deadline exceeded")]
    DeadlineExceeded,

    #[error("request cancelled by caller")]
    Cancelled,

    #[error(transparent)]
    Core(#[from] gweta_core::Error),
}

impl From<OrchestratorError> for gweta_core::Error {
    fn from(err: OrchestratorError) -> Self {
        match err {
            OrchestratorError::DeadlineExceeded => gweta_core::Error::Timeout,
            OrchestratorError::Cancelled => gweta_core::Error::Cancelled,
            OrchestratorError::Core(inner) => inner,
        }
    }
}
