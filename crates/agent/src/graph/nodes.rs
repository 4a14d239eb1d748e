use std::collections::HashSet;
use std::sync::Arc;

use async_trait::async_trait;
use gweta_core::{AgentState, Answer, Embedder, Error};
use gweta_retrieval::{GapRetriever, HybridRetriever, IntentClassifier, MultiLevelCache, ParentExpander, QueryRewriter, Reranker};

use crate::memory::MemoryCoordinator;
use crate::quality::{decide, QualityGate};
use crate::self_critic::SelfCritic;
use crate::synthesis::Synthesizer;

use super::{Node, NodeOutcome};

pub struct IntentClassifyNode {
    pub classifier: Arc<IntentClassifier>,
}

#[async_trait]
impl Node for IntentClassifyNode {
    fn name(&self) -> &'static str {
        "intent_classify"
    }

    async fn run(&self, state: &mut AgentState) -> Result<NodeOutcome, Error> {
        let classification = self.classifier.classify(&state.raw_query, None).await?;
        state.intent = Some(classification.intent);
        state.complexity = classification.complexity;
        state.user_type = classification.user_type;
        let topk = gweta_config::constants::adaptive_topk::for_complexity(state.complexity);
        state.retrieval_top_k = topk.retrieval_top_k;
        state.rerank_top_k = topk.rerank_top_k;
        Ok(NodeOutcome::Continue)
    }
}

pub struct MemoryFetchNode {
    pub coordinator: Arc<MemoryCoordinator>,
}

#[async_trait]
impl Node for MemoryFetchNode {
    fn name(&self) -> &'static str {
        "memory_fetch"
    }

    async fn run(&self, state: &mut AgentState) -> Result<NodeOutcome, Error> {
        let budget = gweta_config::constants::synthesis::token_budget(state.complexity);
        let fetch = self.coordinator.fetch(&state.session_id, &state.user_id, budget).await;
        state.memory_context = fetch.context;

        // A returning user's stable expertise classification biases both
        // `user_type` and the default `complexity` over the single-turn
        // heuristic guess from intent_classify (§4.7).
        if let Some(known) = fetch.known_expertise {
            state.user_type = match known {
                gweta_core::ExpertiseLevel::Professional => gweta_core::UserType::Professional,
                gweta_core::ExpertiseLevel::Citizen => gweta_core::UserType::Citizen,
                gweta_core::ExpertiseLevel::Unknown => state.user_type,
            };
        }
        if let Some(typical_complexity) = fetch.typical_complexity {
            if typical_complexity != state.complexity {
                state.complexity = typical_complexity;
                let topk = gweta_config::constants::adaptive_topk::for_complexity(state.complexity);
                state.retrieval_top_k = topk.retrieval_top_k;
                state.rerank_top_k = topk.rerank_top_k;
            }
        }
        Ok(NodeOutcome::Continue)
    }
}

pub struct QueryRewriteNode {
    pub rewriter: Arc<QueryRewriter>,
    pub short_term: Arc<crate::memory::ShortTermMemory>,
}

#[async_trait]
impl Node for QueryRewriteNode {
    fn name(&self) -> &'static str {
        "query_rewrite"
    }

    async fn run(&self, state: &mut AgentState) -> Result<NodeOutcome, Error> {
        let history = self.short_term.all(&state.session_id).await;
        let rewritten = self.rewriter.rewrite(&state.raw_query, &history).await?;
        if rewritten != state.raw_query {
            state.rewritten_query = Some(rewritten);
        }
        Ok(NodeOutcome::Continue)
    }
}

pub struct CacheLookupNode {
    pub cache: Arc<MultiLevelCache>,
    pub embedder: Arc<dyn Embedder>,
}

#[async_trait]
impl Node for CacheLookupNode {
    fn name(&self) -> &'static str {
        "cache_lookup"
    }

    async fn run(&self, state: &mut AgentState) -> Result<NodeOutcome, Error> {
        let embedding = self.embedder.embed(&[state.effective_query().to_string()]).await?;
        let vector = embedding.into_iter().next().unwrap_or_default();

        if let Some(hit) = self.cache.get_response(state.effective_query(), state.user_type, &vector).await {
            if let Ok(answer) = serde_json::from_value::<Answer>(hit) {
                state.final_answer = Some(answer);
                state.cache_hit = true;
                return Ok(NodeOutcome::Halt);
            }
        }
        Ok(NodeOutcome::Continue)
    }
}

pub struct RetrieveParallelNode {
    pub retriever: Arc<HybridRetriever>,
}

#[async_trait]
impl Node for RetrieveParallelNode {
    fn name(&self) -> &'static str {
        "retrieve_parallel"
    }

    async fn run(&self, state: &mut AgentState) -> Result<NodeOutcome, Error> {
        let query = state.effective_query().to_string();
        state.combined_results = self.retriever.search(&query, state.retrieval_top_k, None).await?;
        Ok(NodeOutcome::Continue)
    }
}

/// Merge/dedupe already happens inside `HybridRetriever::search`
/// (reciprocal rank fusion across lexical and dense hits); this node is
/// the named graph checkpoint the edge table routes through between
/// retrieval and reranking.
pub struct MergeNode;

#[async_trait]
impl Node for MergeNode {
    fn name(&self) -> &'static str {
        "merge"
    }

    async fn run(&self, _state: &mut AgentState) -> Result<NodeOutcome, Error> {
        Ok(NodeOutcome::Continue)
    }
}

pub struct RerankNode {
    pub reranker: Arc<Reranker>,
}

#[async_trait]
impl Node for RerankNode {
    fn name(&self) -> &'static str {
        "rerank"
    }

    async fn run(&self, state: &mut AgentState) -> Result<NodeOutcome, Error> {
        let query = state.effective_query().to_string();
        let candidates = std::mem::take(&mut state.combined_results);
        let (reranked, method) = self.reranker.rerank(&query, candidates, state.rerank_top_k).await;
        state.reranked_results = reranked;
        state.rerank_method = Some(method.to_string());
        Ok(NodeOutcome::Continue)
    }
}

/// Promotes the reranked, diversity-filtered candidates into the final
/// selection the synthesizer will read.
pub struct SelectTopkNode;

#[async_trait]
impl Node for SelectTopkNode {
    fn name(&self) -> &'static str {
        "select_topk"
    }

    async fn run(&self, state: &mut AgentState) -> Result<NodeOutcome, Error> {
        state.selected_chunks = state.reranked_results.clone();
        Ok(NodeOutcome::Continue)
    }
}

pub struct ParentExpandNode {
    pub expander: Arc<ParentExpander>,
}

#[async_trait]
impl Node for ParentExpandNode {
    fn name(&self) -> &'static str {
        "parent_expand"
    }

    async fn run(&self, state: &mut AgentState) -> Result<NodeOutcome, Error> {
        let chunks = state.selected_chunks.clone();
        state.bundled_context = self.expander.expand(chunks).await;
        Ok(NodeOutcome::Continue)
    }
}

pub struct SynthesizeNode {
    pub synthesizer: Arc<Synthesizer>,
}

#[async_trait]
impl Node for SynthesizeNode {
    fn name(&self) -> &'static str {
        "synthesize"
    }

    async fn run(&self, state: &mut AgentState) -> Result<NodeOutcome, Error> {
        state.synthesis = Some(self.synthesizer.synthesize(state).await?);
        Ok(NodeOutcome::Continue)
    }
}

pub struct QualityGateNode {
    pub gate: Arc<QualityGate>,
}

#[async_trait]
impl Node for QualityGateNode {
    fn name(&self) -> &'static str {
        "quality_gate"
    }

    async fn run(&self, state: &mut AgentState) -> Result<NodeOutcome, Error> {
        let scores = self.gate.evaluate(state).await;
        let decision = decide(state, &scores);
        state.quality_confidence = Some(scores.confidence());
        state.quality_passed = Some(decision == crate::quality::QualityDecision::Pass);
        state.quality_issues = scores.issues;
        Ok(NodeOutcome::QualityDecision(decision))
    }
}

pub struct SelfCriticNode {
    pub critic: Arc<SelfCritic>,
}

#[async_trait]
impl Node for SelfCriticNode {
    fn name(&self) -> &'static str {
        "self_critic"
    }

    async fn run(&self, state: &mut AgentState) -> Result<NodeOutcome, Error> {
        let scores = crate::quality::QualityScores {
            attribution: 0.0,
            coherence: 0.0,
            relevance: 0.0,
            source_gap: false,
            issues: state.quality_issues.clone(),
        };
        let critique = self.critic.critique(state, &scores).await;
        state.refinement_instructions = critique.instructions;
        state.priority_fixes = critique.priority_fixes;
        Ok(NodeOutcome::Continue)
    }
}

pub struct RefinedSynthesizeNode {
    pub synthesizer: Arc<Synthesizer>,
}

#[async_trait]
impl Node for RefinedSynthesizeNode {
    fn name(&self) -> &'static str {
        "refined_synthesize"
    }

    async fn run(&self, state: &mut AgentState) -> Result<NodeOutcome, Error> {
        state.refinement_iteration += 1;
        state.synthesis = Some(self.synthesizer.refine(state).await?);
        Ok(NodeOutcome::Continue)
    }
}

pub struct GapRetrieveNode {
    pub gap_retriever: Arc<GapRetriever>,
}

#[async_trait]
impl Node for GapRetrieveNode {
    fn name(&self) -> &'static str {
        "gap_retrieve"
    }

    async fn run(&self, state: &mut AgentState) -> Result<NodeOutcome, Error> {
        state.refinement_iteration += 1;
        let existing: HashSet<String> =
            state.bundled_context.iter().map(|b| b.chunk.chunk.chunk_id.clone()).collect();
        let query = state.raw_query.clone();
        let gap_hits = self
            .gap_retriever
            .retrieve_gap(&query, &state.quality_issues, state.retrieval_top_k, &existing)
            .await?;
        state.retrieval_top_k += gweta_retrieval::GAP_TOP_K_INCREMENT;

        // Accumulate evidence rather than replace it: the next rerank pass
        // must see a strictly larger pool of unique chunks than the first
        // pass did (§8), not a disjoint, typically smaller one.
        let mut seen: HashSet<String> = existing;
        let mut combined = std::mem::take(&mut state.bundled_context)
            .into_iter()
            .map(|b| b.chunk)
            .collect::<Vec<_>>();
        for hit in gap_hits {
            if seen.insert(hit.chunk.chunk_id.clone()) {
                combined.push(hit);
            }
        }
        state.combined_results = combined;
        Ok(NodeOutcome::Continue)
    }
}

pub struct ComposeFinalNode;

#[async_trait]
impl Node for ComposeFinalNode {
    fn name(&self) -> &'static str {
        "compose_final"
    }

    async fn run(&self, state: &mut AgentState) -> Result<NodeOutcome, Error> {
        if state.final_answer.is_some() {
            return Ok(NodeOutcome::Continue); // already filled by cache_lookup
        }

        let passed = state.quality_passed.unwrap_or(false);
        let confidence = state.quality_confidence.unwrap_or(0.0);

        state.final_answer = Some(match state.synthesis.take() {
            Some(Answer::Grounded { tldr, key_points, body, citations, .. }) if passed => {
                state.citations = citations.clone();
                Answer::Grounded { tldr, key_points, body, citations, confidence }
            }
            Some(Answer::Grounded { tldr, body, citations, .. }) => {
                state.citations = citations.clone();
                state.warnings.push("quality_below_threshold".to_string());
                Answer::Degraded { tldr, body, citations, confidence, warnings: state.warnings.clone() }
            }
            Some(other) => other,
            None => Answer::Error {
                request_id: state.trace_id.clone(),
                kind: "synthesis_missing".to_string(),
                message: "no synthesis was produced before the iteration cap".to_string(),
            },
        });

        Ok(NodeOutcome::Continue)
    }
}

pub struct CacheStoreNode {
    pub cache: Arc<MultiLevelCache>,
    pub embedder: Arc<dyn Embedder>,
}

#[async_trait]
impl Node for CacheStoreNode {
    fn name(&self) -> &'static str {
        "cache_store"
    }

    async fn run(&self, state: &mut AgentState) -> Result<NodeOutcome, Error> {
        let Some(answer @ Answer::Grounded { .. }) = &state.final_answer else {
            return Ok(NodeOutcome::Continue);
        };
        let Ok(blob) = serde_json::to_value(answer) else { return Ok(NodeOutcome::Continue) };

        let embedding = self.embedder.embed(&[state.effective_query().to_string()]).await?;
        let vector = embedding.into_iter().next().unwrap_or_default();

        self.cache
            .store_response(state.effective_query(), state.user_type, &vector, state.complexity, blob)
            .await;
        Ok(NodeOutcome::Continue)
    }
}

pub struct MemoryUpdateNode {
    pub coordinator: Arc<MemoryCoordinator>,
}

#[async_trait]
impl Node for MemoryUpdateNode {
    fn name(&self) -> &'static str {
        "memory_update"
    }

    async fn run(&self, state: &mut AgentState) -> Result<NodeOutcome, Error> {
        let assistant_message = match &state.final_answer {
            Some(Answer::Grounded { tldr, .. }) | Some(Answer::Degraded { tldr, .. }) => tldr.clone(),
            _ => String::new(),
        };
        self.coordinator.update_fire_and_forget(
            state.session_id.clone(),
            state.user_id.clone(),
            state.raw_query.clone(),
            assistant_message,
            state.complexity,
            Some(state.user_type.into()),
        );
        Ok(NodeOutcome::Continue)
    }
}
