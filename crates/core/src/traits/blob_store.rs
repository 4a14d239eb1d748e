use async_trait::async_trait;

use crate::error::Error;

/// Content-addressed object storage for `ParentDocument` blobs (§4.6, §6).
/// A miss is not fatal: the caller degrades to `parent = None`.
#[async_trait]
pub trait BlobStore: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>, Error>;
}
