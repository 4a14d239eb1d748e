//! `run_query`/`stream_query` entry points (§6) with request-level
//! deadline enforcement (§5).
//!
//! Grounded on the donor's `VoicePipeline::process_audio`/`handle_final_transcript`
//! stage-sequencing shape in `pipeline/src/orchestrator.rs`, generalized
//! from a per-frame audio loop to a one-shot request that walks
//! `gweta_agent::AgentGraph` under a `tokio::time::timeout` deadline instead
//! of a real-time frame budget.

use std::sync::Arc;
use std::time::{Duration, Instant};

use gweta_agent::AgentGraph;
use gweta_core::{AgentState, Answer, Error};
use tokio::sync::mpsc;

use crate::events::{GrammarEmitter, StreamEvent};
use crate::metrics;
use crate::response::{QueryRequest, QueryResponse};

/// Default request-level deadline (§5): 30 s.
pub const DEFAULT_REQUEST_DEADLINE: Duration = Duration::from_secs(30);

/// Bound on the `stream_query` event channel; a slow consumer applies
/// backpressure to token emission rather than unbounded buffering.
const EVENT_CHANNEL_CAPACITY: usize = 256;

pub struct Orchestrator {
    graph: Arc<AgentGraph>,
    deadline: Duration,
}

impl Orchestrator {
    pub fn new(graph: AgentGraph) -> Self {
        Self { graph: Arc::new(graph), deadline: DEFAULT_REQUEST_DEADLINE }
    }

    pub fn with_deadline(mut self, deadline: Duration) -> Self {
        self.deadline = deadline;
        self
    }

    /// Runs the graph to completion for one request, honoring the
    /// request-level deadline. On timeout, composes the best available
    /// answer from whatever state the graph reached rather than failing
    /// the request outright (§5, §7).
    #[tracing::instrument(skip(self, request), fields(session_id = %request.session_id))]
    pub async fn run_query(&self, request: QueryRequest) -> Result<QueryResponse, Error> {
        let start = Instant::now();
        metrics::record_request(&request.channel);

        let mut state = AgentState::new(request.text, request.session_id, request.user_id);
        match tokio::time::timeout(self.deadline, self.graph.run(&mut state)).await {
            Ok(Ok(())) => {}
            Ok(Err(err)) => {
                metrics::record_request_error(error_kind(&err));
                return Err(err);
            }
            Err(_) => {
                tracing::warn!(trace_id = %state.trace_id, "request deadline exceeded, composing best-effort answer");
                metrics::record_request_error("deadline_exceeded");
                state.warnings.push("request_deadline_exceeded".to_string());
            }
        }

        let response = compose_response(&state, start.elapsed());
        metrics::record_cache_outcome(state.cache_hit);
        metrics::record_total_latency(start.elapsed(), &response.source);
        Ok(response)
    }

    /// Runs the graph and relays its progress as the event grammar of
    /// §4.15. Real per-token LLM streaming is the synthesizer's internal
    /// concern (out of this layer's scope); tokens here are the completed
    /// answer's body split on whitespace, preserving generation order.
    pub fn stream_query(&self, request: QueryRequest) -> mpsc::Receiver<StreamEvent> {
        let (tx, rx) = mpsc::channel(EVENT_CHANNEL_CAPACITY);
        let graph = Arc::clone(&self.graph);
        let deadline = self.deadline;

        tokio::spawn(async move {
            let start = Instant::now();
            let mut state = AgentState::new(request.text, request.session_id, request.user_id);
            let mut emitter = GrammarEmitter::new(tx);
            emitter.meta(state.trace_id.clone(), state.trace_id.clone()).await;

            let run_result = tokio::time::timeout(deadline, graph.run(&mut state)).await;

            match run_result {
                Ok(Err(err)) => {
                    emitter.abort(state.trace_id.clone(), error_kind(&err), err.to_string()).await;
                    return;
                }
                Err(_) => {
                    state.warnings.push("request_deadline_exceeded".to_string());
                }
                Ok(Ok(())) => {}
            }

            for source in retrieval_sources(&state) {
                emitter.retrieval(source.0, source.1).await;
            }

            let response = compose_response(&state, start.elapsed());
            for word in response.body.split_whitespace() {
                emitter.token(format!("{word} ")).await;
            }
            for citation in response.citations.clone() {
                emitter.citation(citation).await;
            }
            emitter.finish(response).await;
        });

        rx
    }
}

/// Groups `combined_results` by retriever source for the `retrieval`
/// stream events; best-effort, not authoritative per-retriever counts
/// once merge/rerank have already run.
fn retrieval_sources(state: &AgentState) -> Vec<(String, usize)> {
    use std::collections::HashMap;
    let mut counts: HashMap<String, usize> = HashMap::new();
    for result in &state.combined_results {
        *counts.entry(result.source.clone()).or_insert(0) += 1;
    }
    counts.into_iter().collect()
}

fn compose_response(state: &AgentState, elapsed: Duration) -> QueryResponse {
    let source = if state.cache_hit { "cache:exact".to_string() } else { "fresh".to_string() };
    let request_id = state.trace_id.clone();
    let processing_time_ms = elapsed.as_millis() as u64;

    match &state.final_answer {
        Some(Answer::Grounded { tldr, key_points, body, citations, confidence }) => QueryResponse {
            tldr: tldr.clone(),
            key_points: key_points.clone(),
            body: body.clone(),
            citations: citations.clone(),
            confidence: *confidence,
            source,
            request_id,
            processing_time_ms,
            warnings: state.warnings.clone(),
        },
        Some(Answer::Degraded { tldr, body, citations, confidence, warnings }) => QueryResponse {
            tldr: tldr.clone(),
            key_points: Vec::new(),
            body: body.clone(),
            citations: citations.clone(),
            confidence: *confidence,
            source: "degraded".to_string(),
            request_id,
            processing_time_ms,
            warnings: warnings.clone(),
        },
        Some(Answer::Error { kind, message, .. }) => QueryResponse {
            tldr: String::new(),
            key_points: Vec::new(),
            body: String::new(),
            citations: Vec::new(),
            confidence: 0.0,
            source: format!("error:{kind}"),
            request_id,
            processing_time_ms,
            warnings: vec![message.clone()],
        },
        None => QueryResponse {
            tldr: String::new(),
            key_points: Vec::new(),
            body: String::new(),
            citations: Vec::new(),
            confidence: 0.0,
            source: "error:no_answer".to_string(),
            request_id,
            processing_time_ms,
            warnings: vec!["request_deadline_exceeded".to_string()],
        },
    }
}

fn error_kind(err: &Error) -> &'static str {
    match err {
        Error::InputInvalid(_) => "input_invalid",
        Error::AuthRequired => "auth_required",
        Error::AuthInvalid => "auth_invalid",
        Error::RateLimited { .. } => "rate_limited",
        Error::RetrieverUnavailable(_) => "retriever_unavailable",
        Error::EmbeddingUnavailable(_) => "embedding_unavailable",
        Error::LlmUnavailable(_) => "llm_unavailable",
        Error::BlobMiss(_) => "blob_miss",
        Error::CacheFault(_) => "cache_fault",
        Error::MemoryFault(_) => "memory_fault",
        Error::Timeout => "timeout",
        Error::Cancelled => "cancelled",
        Error::RequestAborted(_) => "request_aborted",
        Error::Internal { .. } => "internal",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use gweta_agent::GraphDeps;
    use gweta_core::{
        Chunk, CrossEncoder, DenseRetriever, DocType, Embedder, LexicalRetriever, Llm, LlmStreamToken,
        RetrieverFilters,
    };
    use gweta_persistence::{InMemoryBlobStore, InMemoryKvVectorCache, InMemoryProfileStore};
    use gweta_retrieval::{
        GapRetriever, HybridRetriever, IntentClassifier, MultiLevelCache, ParentExpander, QueryRewriter, Reranker,
    };

    struct FakeLlm;
    #[async_trait]
    impl Llm for FakeLlm {
        async fn complete(&self, prompt: &str, _m: usize, _t: f32) -> Result<String, Error> {
            if prompt.contains("Rate from 0.0 to 1.0") {
                return Ok("0.95".to_string());
            }
            if prompt.contains("tldr") {
                return Ok(r#"{"tldr": "Short answer.", "key_points": ["a", "b", "c"], "body": "Full body text about minimum wage."}"#.to_string());
            }
            Ok("unused".to_string())
        }
        async fn stream(&self, _p: &str, _m: usize, _t: f32, _s: mpsc::Sender<LlmStreamToken>) -> Result<String, Error> {
            Ok(String::new())
        }
    }

    struct FakeLexical;
    #[async_trait]
    impl LexicalRetriever for FakeLexical {
        async fn search(&self, _q: &str, _k: usize, _f: Option<&RetrieverFilters>) -> Result<Vec<(Chunk, f32)>, Error> {
            Ok(vec![(sample_chunk("c1", "p1"), 0.9), (sample_chunk("c2", "p2"), 0.6)])
        }
    }

    struct FakeDense;
    #[async_trait]
    impl DenseRetriever for FakeDense {
        async fn search(&self, _q: &[f32], _k: usize, _f: Option<&RetrieverFilters>) -> Result<Vec<(Chunk, f32)>, Error> {
            Ok(vec![])
        }
    }

    struct FakeEmbedder;
    #[async_trait]
    impl Embedder for FakeEmbedder {
        async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, Error> {
            Ok(texts.iter().map(|_| vec![1.0, 0.0]).collect())
        }
        fn model_namespace(&self) -> &str {
            "fake"
        }
    }

    struct FakeCrossEncoder;
    #[async_trait]
    impl CrossEncoder for FakeCrossEncoder {
        async fn score(&self, pairs: &[(String, String)]) -> Result<Vec<f32>, Error> {
            Ok(pairs.iter().enumerate().map(|(i, _)| 0.95 - i as f32 * 0.5).collect())
        }
    }

    fn sample_chunk(id: &str, parent_id: &str) -> Chunk {
        Chunk {
            chunk_id: id.to_string(),
            parent_doc_id: parent_id.to_string(),
            text: "The minimum wage is determined by statutory instrument.".to_string(),
            doc_type: DocType::Act,
            section_path: "s12".to_string(),
            start_char: 0,
            end_char: 10,
            num_tokens: 10,
            language: "en".to_string(),
            date_context: None,
            entities: vec![],
            source_url: "https://example.org".to_string(),
            metadata: Default::default(),
        }
    }

    fn build_orchestrator() -> Orchestrator {
        let llm: Arc<dyn Llm> = Arc::new(FakeLlm);
        let embedder: Arc<dyn Embedder> = Arc::new(FakeEmbedder);
        let kv = Arc::new(InMemoryKvVectorCache::default());
        let profiles = Arc::new(InMemoryProfileStore::default());
        let blobs = Arc::new(InMemoryBlobStore::default());
        let retriever = Arc::new(HybridRetriever::new(Arc::new(FakeLexical), Arc::new(FakeDense), Arc::clone(&embedder)));

        let deps = GraphDeps {
            intent_classifier: Arc::new(IntentClassifier::new(Arc::clone(&llm))),
            memory_coordinator: Arc::new(gweta_agent::MemoryCoordinator::new(
                gweta_agent::ShortTermMemory::new(Arc::clone(&kv) as Arc<dyn gweta_core::KvVectorCache>),
                gweta_agent::LongTermMemory::new(Arc::clone(&profiles) as Arc<dyn gweta_core::ProfileStore>),
            )),
            short_term: Arc::new(gweta_agent::ShortTermMemory::new(Arc::clone(&kv) as Arc<dyn gweta_core::KvVectorCache>)),
            query_rewriter: Arc::new(QueryRewriter::new(Arc::clone(&llm))),
            cache: Arc::new(MultiLevelCache::new(Arc::clone(&kv) as Arc<dyn gweta_core::KvVectorCache>, Arc::clone(&embedder))),
            embedder: Arc::clone(&embedder),
            retriever: Arc::clone(&retriever),
            reranker: Arc::new(Reranker::new(Arc::new(FakeCrossEncoder))),
            parent_expander: Arc::new(ParentExpander::new(Arc::clone(&blobs) as Arc<dyn gweta_core::BlobStore>, 4, Duration::from_secs(1))),
            synthesizer: Arc::new(gweta_agent::Synthesizer::new(Arc::clone(&llm))),
            quality_gate: Arc::new(gweta_agent::QualityGate::new(Arc::clone(&llm))),
            self_critic: Arc::new(gweta_agent::SelfCritic::new(Arc::clone(&llm))),
            gap_retriever: Arc::new(GapRetriever::new(Arc::clone(&retriever), Arc::clone(&llm))),
        };

        Orchestrator::new(AgentGraph::new(deps))
    }

    fn sample_request(session_id: &str) -> QueryRequest {
        QueryRequest {
            text: "What is the minimum wage?".to_string(),
            user_id: "u1".to_string(),
            session_id: session_id.to_string(),
            channel: "api".to_string(),
            lang_hint: None,
            date_ctx: None,
        }
    }

    #[tokio::test]
    async fn run_query_returns_grounded_response() {
        let orchestrator = build_orchestrator();
        let response = orchestrator.run_query(sample_request("s1")).await.unwrap();
        assert!(!response.tldr.is_empty());
        assert!(response.confidence > 0.8);
        assert_eq!(response.source, "fresh");
    }

    #[tokio::test]
    async fn second_identical_request_hits_cache() {
        let orchestrator = build_orchestrator();
        orchestrator.run_query(sample_request("s1")).await.unwrap();
        let second = orchestrator.run_query(sample_request("s2")).await.unwrap();
        assert_eq!(second.source, "cache:exact");
    }

    #[tokio::test]
    async fn stream_query_emits_grammar_ending_in_final() {
        let orchestrator = build_orchestrator();
        let mut rx = orchestrator.stream_query(sample_request("s1"));

        let mut saw_meta_first = false;
        let mut saw_final = false;
        let mut first = true;
        while let Some(event) = rx.recv().await {
            if first {
                saw_meta_first = matches!(event, StreamEvent::Meta { .. });
                first = false;
            }
            if matches!(event, StreamEvent::Final { .. }) {
                saw_final = true;
            }
        }
        assert!(saw_meta_first);
        assert!(saw_final);
    }
}
