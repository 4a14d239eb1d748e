use async_trait::async_trait;

use crate::error::Error;

/// Cross-encoder relevance scoring for `(query, passage)` pairs, as opposed
/// to the decoupled scoring used during retrieval.
#[async_trait]
pub trait CrossEncoder: Send + Sync {
    /// Score every pair; output order matches input order.
    async fn score(&self, pairs: &[(String, String)]) -> Result<Vec<f32>, Error>;
}
