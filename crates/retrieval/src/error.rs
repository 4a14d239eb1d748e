use thiserror::Error;

#[derive(Debug, Error)]
pub enum RetrievalError {
    #[error("lexical retriever error: {0}")]
    Lexical(String),
    #[error("dense retriever error: {0}")]
    Dense(String),
    #[error("both retrievers failed: lexical={lexical}, dense={dense}")]
    BothRetrieversFailed { lexical: String, dense: String },
    #[error("cross-encoder error: {0}")]
    CrossEncoder(String),
    #[error("embedding error: {0}")]
    Embedding(String),
    #[error("cache error: {0}")]
    Cache(String),
}

impl From<RetrievalError> for gweta_core::Error {
    fn from(err: RetrievalError) -> Self {
        match err {
            RetrievalError::Lexical(msg) | RetrievalError::BothRetrieversFailed { lexical: msg, .. } => {
                gweta_core::Error::RetrieverUnavailable(msg)
            }
            RetrievalError::Dense(msg) => gweta_core::Error::RetrieverUnavailable(msg),
            RetrievalError::CrossEncoder(msg) => gweta_core::Error::Internal {
                request_id: "retrieval".to_string(),
                message: msg,
            },
            RetrievalError::Embedding(msg) => gweta_core::Error::EmbeddingUnavailable(msg),
            RetrievalError::Cache(msg) => gweta_core::Error::CacheFault(msg),
        }
    }
}
