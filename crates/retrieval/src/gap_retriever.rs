//! Gap retrieval: generates a targeted follow-up query from quality-gate
//! issues and fetches additional candidates to close a source gap (§4.12).
//!
//! Grounded on the donor's `AgenticRetriever`'s iterative "need more
//! evidence" re-query loop in `agentic.rs`, generalized from a fixed
//! re-query template to an LLM-composed gap query driven by structured
//! `quality_issues` strings.

use std::collections::HashSet;
use std::sync::Arc;

use gweta_core::{Error, Llm, RetrievalResult};

use crate::hybrid_retriever::HybridRetriever;

/// How much `retrieval_top_k` grows for the gap retrieval pass (§4.12).
pub const GAP_TOP_K_INCREMENT: usize = 15;

pub struct GapRetriever {
    retriever: Arc<HybridRetriever>,
    llm: Arc<dyn Llm>,
}

impl GapRetriever {
    pub fn new(retriever: Arc<HybridRetriever>, llm: Arc<dyn Llm>) -> Self {
        Self { retriever, llm }
    }

    /// Composes a gap query from `quality_issues`, retrieves with
    /// `retrieval_top_k + GAP_TOP_K_INCREMENT`, and returns only chunks not
    /// already present in `existing_chunk_ids` (§4.12). Feeds back into
    /// rerank, not directly into synthesis.
    #[tracing::instrument(skip(self, original_query, quality_issues, existing_chunk_ids))]
    pub async fn retrieve_gap(
        &self,
        original_query: &str,
        quality_issues: &[String],
        retrieval_top_k: usize,
        existing_chunk_ids: &HashSet<String>,
    ) -> Result<Vec<RetrievalResult>, Error> {
        let gap_query = self.compose_gap_query(original_query, quality_issues).await;
        let top_k = retrieval_top_k + GAP_TOP_K_INCREMENT;

        let candidates = self.retriever.search(&gap_query, top_k, None).await?;

        Ok(candidates
            .into_iter()
            .filter(|c| !existing_chunk_ids.contains(&c.chunk.chunk_id))
            .collect())
    }

    async fn compose_gap_query(&self, original_query: &str, quality_issues: &[String]) -> String {
        if quality_issues.is_empty() {
            return original_query.to_string();
        }

        let issues = quality_issues.join("; ");
        let prompt = format!(
            "A legal question was answered but a quality reviewer flagged the \
             following gaps in source coverage: {issues}\n\n\
             Original question: {original_query}\n\n\
             Write a single focused search query (no preamble) that would \
             retrieve the missing evidence."
        );

        match self.llm.complete(&prompt, 100, 0.2).await {
            Ok(query) => {
                let trimmed = query.trim();
                if trimmed.is_empty() {
                    original_query.to_string()
                } else {
                    trimmed.to_string()
                }
            }
            Err(err) => {
                tracing::warn!(error = %err, "gap query composition failed, reusing original query");
                original_query.to_string()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use gweta_core::{
        Chunk, DenseRetriever, DocType, Embedder, LexicalRetriever, LlmStreamToken, RetrieverFilters,
    };
    use std::collections::HashMap;
    use tokio::sync::mpsc;

    struct FakeLlm {
        response: String,
    }

    #[async_trait]
    impl Llm for FakeLlm {
        async fn complete(&self, _p: &str, _m: usize, _t: f32) -> Result<String, Error> {
            Ok(self.response.clone())
        }
        async fn stream(
            &self,
            _p: &str,
            _m: usize,
            _t: f32,
            _s: mpsc::Sender<LlmStreamToken>,
        ) -> Result<String, Error> {
            Ok(self.response.clone())
        }
    }

    fn chunk(id: &str) -> Chunk {
        Chunk {
            chunk_id: id.to_string(),
            parent_doc_id: "p1".to_string(),
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
        }
    }

    struct FakeLexical;
    #[async_trait]
    impl LexicalRetriever for FakeLexical {
        async fn search(
            &self,
            _query: &str,
            _top_k: usize,
            _filters: Option<&RetrieverFilters>,
        ) -> Result<Vec<(Chunk, f32)>, Error> {
            Ok(vec![(chunk("existing"), 0.9), (chunk("fresh"), 0.8)])
        }
    }

    struct FakeDense;
    #[async_trait]
    impl DenseRetriever for FakeDense {
        async fn search(
            &self,
            _query_embedding: &[f32],
            _top_k: usize,
            _filters: Option<&RetrieverFilters>,
        ) -> Result<Vec<(Chunk, f32)>, Error> {
            Ok(vec![])
        }
    }

    struct FakeEmbedder;
    #[async_trait]
    impl Embedder for FakeEmbedder {
        async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, Error> {
            Ok(texts.iter().map(|_| vec![0.0_f32]).collect())
        }
        fn model_namespace(&self) -> &str {
            "fake"
        }
    }

    #[tokio::test]
    async fn filters_out_already_seen_chunks() {
        let retriever = Arc::new(HybridRetriever::new(
            Arc::new(FakeLexical),
            Arc::new(FakeDense),
            Arc::new(FakeEmbedder),
        ));
        let gap_retriever = GapRetriever::new(retriever, Arc::new(FakeLlm { response: "gap query".into() }));

        let mut existing = HashSet::new();
        existing.insert("existing".to_string());

        let gap = gap_retriever
            .retrieve_gap("original question", &["missing source for claim X".to_string()], 15, &existing)
            .await
            .unwrap();

        assert!(gap.iter().all(|c| c.chunk.chunk_id != "existing"));
        assert!(gap.iter().any(|c| c.chunk.chunk_id == "fresh"));
    }

    #[tokio::test]
    async fn no_issues_reuses_original_query() {
        let retriever = Arc::new(HybridRetriever::new(
            Arc::new(FakeLexical),
            Arc::new(FakeDense),
            Arc::new(FakeEmbedder),
        ));
        let gap_retriever =
            GapRetriever::new(retriever, Arc::new(FakeLlm { response: "should not be used".into() }));
        let composed = gap_retriever.compose_gap_query("original question", &[]).await;
        assert_eq!(composed, "original question");
    }
}
