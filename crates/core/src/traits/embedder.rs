use async_trait::async_trait;

use crate::error::Error;

/// Text embedding provider. The same model backs dense retrieval and cache
/// similarity (§4.2, §4.13); implementors are expected to expose a stable
/// `model_namespace()` so the cache can version its keys (§9).
#[async_trait]
pub trait Embedder: Send + Sync {
    async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, Error>;

    /// A short, stable identifier for the embedding model in use, used as a
    /// cache-key namespace prefix so an upgrade cannot collide with stale
    /// vectors from a previous model.
    fn model_namespace(&self) -> &str;
}
