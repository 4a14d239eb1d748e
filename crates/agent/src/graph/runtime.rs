use std::sync::Arc;

use gweta_core::{AgentState, Embedder, Error};
use gweta_retrieval::{GapRetriever, HybridRetriever, IntentClassifier, MultiLevelCache, ParentExpander, QueryRewriter, Reranker};

use crate::memory::{MemoryCoordinator, ShortTermMemory};
use crate::quality::{QualityDecision, QualityGate};
use crate::self_critic::SelfCritic;
use crate::synthesis::Synthesizer;

use super::nodes::{
    CacheLookupNode, CacheStoreNode, ComposeFinalNode, GapRetrieveNode, IntentClassifyNode, MemoryFetchNode,
    MemoryUpdateNode, MergeNode, ParentExpandNode, QualityGateNode, QueryRewriteNode, RefinedSynthesizeNode,
    RerankNode, RetrieveParallelNode, SelectTopkNode, SelfCriticNode, SynthesizeNode,
};
use super::{Node, NodeOutcome};

/// Runs `node` and records its wall-clock time under
/// `gweta_node_latency_ms`, tagged by node name (SPEC_FULL.md §5).
/// `gweta-agent` has no dependency on `gweta-orchestrator`, so this emits
/// straight through the `metrics` facade rather than through a wrapper
/// function in that crate.
async fn run_timed<N: Node + ?Sized>(node: &N, state: &mut AgentState) -> Result<NodeOutcome, Error> {
    let start = std::time::Instant::now();
    let outcome = node.run(state).await;
    metrics::histogram!("gweta_node_latency_ms", "node" => node.name()).record(start.elapsed().as_millis() as f64);
    outcome
}

/// Every provider/component the graph's 17 nodes are built from. Wiring
/// these together is the orchestrator crate's job; `AgentGraph::new` just
/// assembles the node instances once.
pub struct GraphDeps {
    pub intent_classifier: Arc<IntentClassifier>,
    pub memory_coordinator: Arc<MemoryCoordinator>,
    pub short_term: Arc<ShortTermMemory>,
    pub query_rewriter: Arc<QueryRewriter>,
    pub cache: Arc<MultiLevelCache>,
    pub embedder: Arc<dyn Embedder>,
    pub retriever: Arc<HybridRetriever>,
    pub reranker: Arc<Reranker>,
    pub parent_expander: Arc<ParentExpander>,
    pub synthesizer: Arc<Synthesizer>,
    pub quality_gate: Arc<QualityGate>,
    pub self_critic: Arc<SelfCritic>,
    pub gap_retriever: Arc<GapRetriever>,
}

/// The 17-node request graph of §4.1: static edges throughout except the
/// quality gate's 4-way branch, with an iteration cap shared between the
/// `refine_synthesis` and `retrieve_more` loops.
pub struct AgentGraph {
    intent_classify: IntentClassifyNode,
    memory_fetch: MemoryFetchNode,
    query_rewrite: QueryRewriteNode,
    cache_lookup: CacheLookupNode,
    retrieve_parallel: RetrieveParallelNode,
    merge: MergeNode,
    rerank: RerankNode,
    select_topk: SelectTopkNode,
    parent_expand: ParentExpandNode,
    synthesize: SynthesizeNode,
    quality_gate: QualityGateNode,
    self_critic: SelfCriticNode,
    refined_synthesize: RefinedSynthesizeNode,
    gap_retrieve: GapRetrieveNode,
    compose_final: ComposeFinalNode,
    cache_store: CacheStoreNode,
    memory_update: MemoryUpdateNode,
}

impl AgentGraph {
    pub fn new(deps: GraphDeps) -> Self {
        Self {
            intent_classify: IntentClassifyNode { classifier: deps.intent_classifier },
            memory_fetch: MemoryFetchNode { coordinator: Arc::clone(&deps.memory_coordinator) },
            query_rewrite: QueryRewriteNode { rewriter: deps.query_rewriter, short_term: deps.short_term },
            cache_lookup: CacheLookupNode { cache: Arc::clone(&deps.cache), embedder: Arc::clone(&deps.embedder) },
            retrieve_parallel: RetrieveParallelNode { retriever: deps.retriever },
            merge: MergeNode,
            rerank: RerankNode { reranker: deps.reranker },
            select_topk: SelectTopkNode,
            parent_expand: ParentExpandNode { expander: deps.parent_expander },
            synthesize: SynthesizeNode { synthesizer: Arc::clone(&deps.synthesizer) },
            quality_gate: QualityGateNode { gate: deps.quality_gate },
            self_critic: SelfCriticNode { critic: deps.self_critic },
            refined_synthesize: RefinedSynthesizeNode { synthesizer: deps.synthesizer },
            gap_retrieve: GapRetrieveNode { gap_retriever: deps.gap_retriever },
            compose_final: ComposeFinalNode,
            cache_store: CacheStoreNode { cache: deps.cache, embedder: deps.embedder },
            memory_update: MemoryUpdateNode { coordinator: deps.memory_coordinator },
        }
    }

    /// Runs the full graph to completion, producing `state.final_answer`.
    #[tracing::instrument(skip(self, state), fields(trace_id = %state.trace_id))]
    pub async fn run(&self, state: &mut AgentState) -> Result<(), Error> {
        run_timed(&self.intent_classify, state).await?;
        run_timed(&self.memory_fetch, state).await?;
        run_timed(&self.query_rewrite, state).await?;

        if let NodeOutcome::Halt = run_timed(&self.cache_lookup, state).await? {
            tracing::debug!(node = self.cache_lookup.name(), "cache hit, skipping retrieval pipeline");
            run_timed(&self.compose_final, state).await?;
            run_timed(&self.memory_update, state).await?;
            return Ok(());
        }

        run_timed(&self.retrieve_parallel, state).await?;
        self.run_rerank_to_quality_loop(state).await?;

        run_timed(&self.compose_final, state).await?;
        run_timed(&self.cache_store, state).await?;
        run_timed(&self.memory_update, state).await?;
        Ok(())
    }

    /// `merge -> rerank -> select_topk -> parent_expand -> synthesize ->
    /// quality_gate`, re-entering from `merge` whenever the gate asks for
    /// `retrieve_more` (via `gap_retrieve`), until the gate's decision is
    /// `Pass` or `Fail` (§4.1, §4.10, §4.12).
    async fn run_rerank_to_quality_loop(&self, state: &mut AgentState) -> Result<(), Error> {
        loop {
            run_timed(&self.merge, state).await?;
            run_timed(&self.rerank, state).await?;
            run_timed(&self.select_topk, state).await?;
            run_timed(&self.parent_expand, state).await?;
            run_timed(&self.synthesize, state).await?;

            match self.run_quality_loop(state).await? {
                QualityLoopResult::Done => return Ok(()),
                QualityLoopResult::RetrieveMore => {
                    run_timed(&self.gap_retrieve, state).await?;
                    continue;
                }
            }
        }
    }

    /// `quality_gate`, looping through `self_critic -> refined_synthesize`
    /// on `refine_synthesis` without touching retrieval, until the gate
    /// settles on `Pass`, `Fail`, or asks for `retrieve_more` (§4.11).
    async fn run_quality_loop(&self, state: &mut AgentState) -> Result<QualityLoopResult, Error> {
        loop {
            let outcome = run_timed(&self.quality_gate, state).await?;
            let NodeOutcome::QualityDecision(decision) = outcome else {
                unreachable!("quality_gate always returns a QualityDecision")
            };

            match decision {
                QualityDecision::Pass | QualityDecision::Fail => return Ok(QualityLoopResult::Done),
                QualityDecision::RetrieveMore => return Ok(QualityLoopResult::RetrieveMore),
                QualityDecision::RefineSynthesis => {
                    run_timed(&self.self_critic, state).await?;
                    run_timed(&self.refined_synthesize, state).await?;
                    continue;
                }
            }
        }
    }
}

enum QualityLoopResult {
    Done,
    RetrieveMore,
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use gweta_core::{
        Answer, Chunk, CrossEncoder, DenseRetriever, DocType, LexicalRetriever, Llm, LlmStreamToken,
        RetrieverFilters,
    };
    use gweta_persistence::{InMemoryKvVectorCache, InMemoryProfileStore};
    use gweta_retrieval::{HybridRetriever, IntentClassifier, MultiLevelCache, ParentExpander, QueryRewriter, Reranker, GapRetriever};
    use gweta_persistence::InMemoryBlobStore;
    use tokio::sync::mpsc;
    use std::time::Duration;

    struct FakeLlm;
    #[async_trait]
    impl Llm for FakeLlm {
        async fn complete(&self, prompt: &str, _max_tokens: usize, _temperature: f32) -> Result<String, Error> {
            if prompt.contains("Rate from 0.0 to 1.0") {
                return Ok("0.95".to_string());
            }
            if prompt.contains("tldr") {
                return Ok(r#"{"tldr": "Minimum wage is set by statute.", "key_points": ["a", "b", "c"], "body": "Full explanation."}"#.to_string());
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
            // Distinct scores so min-max normalization doesn't collapse to a
            // single confidence value dropped by the quality floor.
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

    fn build_graph() -> AgentGraph {
        let llm: Arc<dyn Llm> = Arc::new(FakeLlm);
        let embedder: Arc<dyn Embedder> = Arc::new(FakeEmbedder);
        let kv = Arc::new(InMemoryKvVectorCache::default());
        let profiles = Arc::new(InMemoryProfileStore::default());
        let blobs = Arc::new(InMemoryBlobStore::default());

        let retriever = Arc::new(HybridRetriever::new(Arc::new(FakeLexical), Arc::new(FakeDense), Arc::clone(&embedder)));
        let deps = GraphDeps {
            intent_classifier: Arc::new(IntentClassifier::new(Arc::clone(&llm))),
            memory_coordinator: Arc::new(MemoryCoordinator::new(
                ShortTermMemory::new(Arc::clone(&kv) as Arc<dyn gweta_core::KvVectorCache>),
                crate::memory::LongTermMemory::new(Arc::clone(&profiles) as Arc<dyn gweta_core::ProfileStore>),
            )),
            short_term: Arc::new(ShortTermMemory::new(Arc::clone(&kv) as Arc<dyn gweta_core::KvVectorCache>)),
            query_rewriter: Arc::new(QueryRewriter::new(Arc::clone(&llm))),
            cache: Arc::new(MultiLevelCache::new(Arc::clone(&kv) as Arc<dyn gweta_core::KvVectorCache>, Arc::clone(&embedder))),
            embedder: Arc::clone(&embedder),
            retriever: Arc::clone(&retriever),
            reranker: Arc::new(Reranker::new(Arc::new(FakeCrossEncoder))),
            parent_expander: Arc::new(ParentExpander::new(Arc::clone(&blobs) as Arc<dyn gweta_core::BlobStore>, 4, Duration::from_secs(1))),
            synthesizer: Arc::new(Synthesizer::new(Arc::clone(&llm))),
            quality_gate: Arc::new(QualityGate::new(Arc::clone(&llm))),
            self_critic: Arc::new(SelfCritic::new(Arc::clone(&llm))),
            gap_retriever: Arc::new(GapRetriever::new(Arc::clone(&retriever), Arc::clone(&llm))),
        };
        AgentGraph::new(deps)
    }

    #[tokio::test]
    async fn full_run_produces_grounded_answer() {
        let graph = build_graph();
        let mut state = AgentState::new("What is the minimum wage in Zimbabwe?", "s1", "u1");
        graph.run(&mut state).await.unwrap();

        match state.final_answer.unwrap() {
            Answer::Grounded { tldr, confidence, .. } => {
                assert!(!tldr.is_empty());
                assert!(confidence > 0.8);
            }
            other => panic!("expected Grounded, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn second_run_hits_cache() {
        let graph = build_graph();
        let mut first = AgentState::new("What is the minimum wage?", "s1", "u1");
        graph.run(&mut first).await.unwrap();

        let mut second = AgentState::new("What is the minimum wage?", "s2", "u1");
        graph.run(&mut second).await.unwrap();
        assert!(second.final_answer.is_some());
        assert!(second.cache_hit);
    }
}
