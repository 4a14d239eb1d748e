use thiserror::Error;

#[derive(Debug, Error)]
pub enum LlmError {
    #[error("llm configuration error: {0}")]
    Configuration(String),
    #[error("llm network error: {0}")]
    Network(String),
    #[error("llm api error: {0}")]
    Api(String),
    #[error("llm returned an unparseable response: {0}")]
    InvalidResponse(String),
}

impl From<reqwest::Error> for LlmError {
    fn from(err: reqwest::Error) -> Self {
        LlmError::Network(err.to_string())
    }
}

impl From<LlmError> for gweta_core::Error {
    fn from(err: LlmError) -> Self {
        match err {
            LlmError::Configuration(msg) | LlmError::InvalidResponse(msg) => {
                gweta_core::Error::internal("llm", msg)
            }
            LlmError::Network(msg) | LlmError::Api(msg) => gweta_core::Error::LlmUnavailable(msg),
        }
    }
}
