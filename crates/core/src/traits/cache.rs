use async_trait::async_trait;
use std::time::Duration;

use crate::error::Error;

/// Key-value + set-membership cache used for the multi-level cache (§4.13).
/// Implementations are expected to behave as a miss on any internal fault
/// (§4.13 invariant (a)) rather than propagate the fault to the caller;
/// `gweta-retrieval`'s `MultiLevelCache` treats an `Err` here the same way
/// regardless, as a defense-in-depth measure.
#[async_trait]
pub trait KvVectorCache: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>, Error>;
    async fn set(&self, key: &str, value: Vec<u8>, ttl: Duration) -> Result<(), Error>;
    async fn expire(&self, key: &str) -> Result<(), Error>;

    /// Add `member` to the set named `key` (semantic index membership).
    async fn sadd(&self, key: &str, member: &str) -> Result<(), Error>;
    /// List all members of the set named `key`.
    async fn smembers(&self, key: &str) -> Result<Vec<String>, Error>;
}
