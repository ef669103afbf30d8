use crate::claim_analysis::ClaimAnalyzer;
use crate::credibility::SourceCredibility;
use crate::nodes::{RefinementNode, VerifierNode};
use anyhow::Result;
use async_trait::async_trait;
use autoverifier_ai::{LLMProvider, LLMProviderFactory};
use autoverifier_core::{
    AgentState, AutoVerifierConfig, EvidenceItem, RefinementConfig, TrustAssessment, WorkflowStep,
};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::sync::Arc;
use tracing::{info, warn};

/// Supplies additional evidence for a follow-up query
#[async_trait]
pub trait EvidenceSource: Send + Sync {
    async fn search(&self, query: &str) -> Result<Vec<EvidenceItem>>;
}

/// Offline source that never finds anything
#[derive(Debug, Default, Clone, Copy)]
pub struct NoEvidenceSource;

#[async_trait]
impl EvidenceSource for NoEvidenceSource {
    async fn search(&self, _query: &str) -> Result<Vec<EvidenceItem>> {
        Ok(Vec::new())
    }
}

/// Returns pre-loaded batches, one per search, then nothing
#[derive(Debug, Default)]
pub struct StaticEvidenceSource {
    batches: Mutex<VecDeque<Vec<EvidenceItem>>>,
    queries: Mutex<Vec<String>>,
}

impl StaticEvidenceSource {
    pub fn new(batches: impl IntoIterator<Item = Vec<EvidenceItem>>) -> Self {
        Self {
            batches: Mutex::new(batches.into_iter().collect()),
            queries: Mutex::new(Vec::new()),
        }
    }

    /// Queries received so far
    pub fn queries(&self) -> Vec<String> {
        self.queries.lock().clone()
    }
}

#[async_trait]
impl EvidenceSource for StaticEvidenceSource {
    async fn search(&self, query: &str) -> Result<Vec<EvidenceItem>> {
        self.queries.lock().push(query.to_string());
        Ok(self.batches.lock().pop_front().unwrap_or_default())
    }
}

/// Aggregate view of the trust assessments gathered so far
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrustSummary {
    pub total: usize,
    pub high_trust: usize,
    pub low_trust: usize,
    pub mean_trust: f64,
}

impl TrustSummary {
    pub fn from_results(results: &[TrustAssessment], config: &RefinementConfig) -> Self {
        let total = results.len();
        let high_trust = results
            .iter()
            .filter(|r| r.trust_score >= config.high_trust_threshold)
            .count();
        let low_trust = results
            .iter()
            .filter(|r| r.trust_score < config.low_trust_threshold)
            .count();
        let mean_trust = if total == 0 {
            0.0
        } else {
            results.iter().map(|r| r.trust_score).sum::<f64>() / total as f64
        };

        Self {
            total,
            high_trust,
            low_trust,
            mean_trust,
        }
    }

    fn conclusion(&self, next_query: &str) -> String {
        let verdict = if next_query.is_empty() {
            "evidence sufficient".to_string()
        } else {
            format!("evidence insufficient, suggested query: {}", next_query)
        };
        format!(
            "{} of {} evidence items high-trust, {} low-trust (mean trust {:.3}); {}",
            self.high_trust, self.total, self.low_trust, self.mean_trust, verdict
        )
    }
}

/// Two-node trust workflow: the verifier node scores evidence, the
/// refinement node decides whether another search is needed
pub struct VerifierWorkflow {
    verifier: VerifierNode,
    refinement: RefinementNode,
    refinement_config: RefinementConfig,
    max_iterations: u32,
    confidence_threshold: f64,
    require_multiple_sources: bool,
}

impl VerifierWorkflow {
    pub fn new(provider: Option<Arc<dyn LLMProvider>>, config: &AutoVerifierConfig) -> Self {
        let verifier = VerifierNode::new(
            SourceCredibility::from_config(&config.credibility),
            ClaimAnalyzer::new(provider.clone()),
            config.scoring.clone(),
        );
        let refinement = RefinementNode::new(provider, config.refinement.clone());

        Self {
            verifier,
            refinement,
            refinement_config: config.refinement.clone(),
            max_iterations: config.verifier.max_iterations.max(1),
            confidence_threshold: config.verifier.confidence_threshold,
            require_multiple_sources: config.verifier.require_multiple_sources,
        }
    }

    /// Use the configured LLM when it can be built, heuristics otherwise
    pub fn from_config(config: &AutoVerifierConfig) -> Self {
        let provider = if config.llm.enabled {
            match LLMProviderFactory::create_from_config(&config.llm) {
                Ok(provider) => Some(provider),
                Err(e) => {
                    warn!("LLM unavailable for the trust workflow, using heuristics: {:#}", e);
                    None
                }
            }
        } else {
            None
        };

        Self::new(provider, config)
    }

    pub fn with_max_iterations(mut self, max_iterations: u32) -> Self {
        self.max_iterations = max_iterations.max(1);
        self
    }

    fn initial_state(&self, initial_query: &str, evidence: Vec<EvidenceItem>) -> AgentState {
        let mut state = AgentState::new(initial_query, self.max_iterations);
        state.confidence_threshold = self.confidence_threshold;
        state.require_multiple_sources = self.require_multiple_sources;
        for item in evidence {
            if !state.add_evidence(item) {
                state
                    .warnings
                    .push("Duplicate evidence id ignored".to_string());
            }
        }
        state
    }

    async fn pass(&self, state: &mut AgentState) {
        state.advance(WorkflowStep::Verifying);
        let results = self.verifier.run(state).await;
        state.extend_analysis(results);

        state.step = WorkflowStep::Refining;
        state.next_query = self.refinement.run(state).await;
    }

    fn finish(&self, mut state: AgentState) -> AgentState {
        let summary = TrustSummary::from_results(&state.analysis_results, &self.refinement_config);
        state.final_conclusion = summary.conclusion(&state.next_query);
        state.step = WorkflowStep::Complete;

        info!(
            task_id = %state.task_id,
            iterations = state.iterations,
            assessed = summary.total,
            high_trust = summary.high_trust,
            "Trust workflow complete"
        );
        state
    }

    /// One verifier pass followed by one refinement pass
    pub async fn run_once(&self, initial_query: &str, evidence: Vec<EvidenceItem>) -> AgentState {
        let mut state = self.initial_state(initial_query, evidence);
        self.pass(&mut state).await;
        self.finish(state)
    }

    /// Iterate until the evidence is sufficient, the iteration limit is hit,
    /// or the source stops producing new evidence
    pub async fn run(
        &self,
        initial_query: &str,
        evidence: Vec<EvidenceItem>,
        source: &dyn EvidenceSource,
    ) -> AgentState {
        let mut state = self.initial_state(initial_query, evidence);

        loop {
            self.pass(&mut state).await;

            if state.next_query.is_empty() || state.iterations >= state.max_iterations {
                break;
            }

            state.step = WorkflowStep::Searching;
            let query = state.next_query.clone();
            let found = match source.search(&query).await {
                Ok(found) => found,
                Err(e) => {
                    warn!(query = %query, "Evidence search failed: {:#}", e);
                    state.warnings.push(format!("Evidence search failed: {:#}", e));
                    break;
                }
            };

            let added = found
                .into_iter()
                .filter(|item| state.add_evidence(item.clone()))
                .count();

            if added == 0 {
                state
                    .warnings
                    .push(format!("No new evidence found for query: {}", query));
                break;
            }

            info!(added, query = %query, "New evidence gathered");
        }

        self.finish(state)
    }
}
