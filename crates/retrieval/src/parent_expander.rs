//! Small-to-big parent expansion (§4.6).
//!
//! Grounded on the donor's bounded-concurrency fetch idiom (`spawn_blocking`
//! pools in `retriever.rs`), generalized to a `Semaphore`-gated concurrent
//! fetch of `ParentDocument` blobs with a per-fetch timeout and graceful
//! degradation to `parent = None` on miss, error, or timeout.

use std::sync::Arc;
use std::time::Duration;

use futures::stream::{self, StreamExt};
use gweta_core::{BlobStore, BundledContext, ParentDocument, RetrievalResult};

pub struct ParentExpander {
    blob_store: Arc<dyn BlobStore>,
    concurrency: usize,
    timeout: Duration,
}

impl ParentExpander {
    pub fn new(blob_store: Arc<dyn BlobStore>, concurrency: usize, timeout: Duration) -> Self {
        Self { blob_store, concurrency, timeout }
    }

    /// Fetches each chunk's parent concurrently (bounded) and attaches it;
    /// a missing, errored, or timed-out parent degrades to `parent: None`
    /// rather than dropping the chunk.
    #[tracing::instrument(skip(self, chunks))]
    pub async fn expand(&self, chunks: Vec<RetrievalResult>) -> Vec<BundledContext> {
        let concurrency = self.concurrency.max(1);

        stream::iter(chunks)
            .map(|chunk| self.fetch_one(chunk))
            .buffer_unordered(concurrency)
            .collect()
            .await
    }

    async fn fetch_one(&self, chunk: RetrievalResult) -> BundledContext {
        let key = chunk.chunk.parent_doc_id.clone();
        let parent = match tokio::time::timeout(self.timeout, self.blob_store.get(&key)).await {
            Ok(Ok(Some(bytes))) => serde_json::from_slice::<ParentDocument>(&bytes).ok(),
            Ok(Ok(None)) => {
                tracing::debug!(parent_doc_id = %key, "parent document not found");
                None
            }
            Ok(Err(err)) => {
                tracing::warn!(parent_doc_id = %key, error = %err, "blob store error fetching parent");
                None
            }
            Err(_) => {
                tracing::warn!(parent_doc_id = %key, "parent fetch timed out");
                None
            }
        };

        BundledContext { chunk, parent }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use gweta_core::{Chunk, DocType, Error};
    use std::collections::HashMap;
    use tokio::sync::Mutex;

    struct FakeBlobStore {
        objects: Mutex<HashMap<String, Vec<u8>>>,
        delay: Option<Duration>,
    }

    #[async_trait]
    impl BlobStore for FakeBlobStore {
        async fn get(&self, key: &str) -> Result<Option<Vec<u8>>, Error> {
            if let Some(delay) = self.delay {
                tokio::time::sleep(delay).await;
            }
            Ok(self.objects.lock().await.get(key).cloned())
        }
    }

    fn sample_result(parent_doc_id: &str) -> RetrievalResult {
        RetrievalResult {
            chunk: Chunk {
                chunk_id: "c1".to_string(),
                parent_doc_id: parent_doc_id.to_string(),
                text: "text".to_string(),
                doc_type: DocType::Act,
                section_path: "s1".to_string(),
                start_char: 0,
                end_char: 4,
                num_tokens: 1,
                language: "en".to_string(),
                date_context: None,
                entities: vec![],
                source_url: "https://example.org".to_string(),
                metadata: HashMap::new(),
            },
            score: 0.5,
            confidence: None,
            source: "lexical".to_string(),
        }
    }

    fn sample_parent(id: &str) -> ParentDocument {
        ParentDocument {
            parent_doc_id: id.to_string(),
            doc_type: DocType::Act,
            title: "Labour Act".to_string(),
            canonical_citation: None,
            language: "en".to_string(),
            jurisdiction: "ZW".to_string(),
            version_effective_date: None,
            source_url: "https://example.org".to_string(),
            content_tree: serde_json::json!({}),
            markdown: "# Labour Act".to_string(),
        }
    }

    #[tokio::test]
    async fn missing_parent_degrades_gracefully() {
        let store = FakeBlobStore { objects: Mutex::new(HashMap::new()), delay: None };
        let expander = ParentExpander::new(Arc::new(store), 8, Duration::from_secs(2));
        let bundled = expander.expand(vec![sample_result("missing")]).await;
        assert_eq!(bundled.len(), 1);
        assert!(bundled[0].parent.is_none());
    }

    #[tokio::test]
    async fn found_parent_is_attached() {
        let mut objects = HashMap::new();
        objects.insert(
            "p1".to_string(),
            serde_json::to_vec(&sample_parent("p1")).unwrap(),
        );
        let store = FakeBlobStore { objects: Mutex::new(objects), delay: None };
        let expander = ParentExpander::new(Arc::new(store), 8, Duration::from_secs(2));
        let bundled = expander.expand(vec![sample_result("p1")]).await;
        assert_eq!(bundled[0].parent.as_ref().unwrap().parent_doc_id, "p1");
    }

    #[tokio::test]
    async fn timeout_degrades_gracefully() {
        let mut objects = HashMap::new();
        objects.insert(
            "p1".to_string(),
            serde_json::to_vec(&sample_parent("p1")).unwrap(),
        );
        let store = FakeBlobStore { objects: Mutex::new(objects), delay: Some(Duration::from_millis(50)) };
        let expander = ParentExpander::new(Arc::new(store), 8, Duration::from_millis(5));
        let bundled = expander.expand(vec![sample_result("p1")]).await;
        assert!(bundled[0].parent.is_none());
    }
}
