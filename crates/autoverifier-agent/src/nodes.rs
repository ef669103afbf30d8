use crate::claim_analysis::ClaimAnalyzer;
use crate::credibility::SourceCredibility;
use crate::prompts::build_refinement_prompt;
use crate::scoring::compute_trust_score;
use autoverifier_ai::{GenerationConfig, LLMProvider};
use autoverifier_core::{AgentState, RefinementConfig, ScoringConfig, TrustAssessment};
use std::sync::Arc;
use tracing::{debug, info, instrument};

/// Scores every evidence item that has not been assessed yet
#[derive(Clone)]
pub struct VerifierNode {
    credibility: SourceCredibility,
    analyzer: ClaimAnalyzer,
    scoring: ScoringConfig,
}

impl VerifierNode {
    pub fn new(
        credibility: SourceCredibility,
        analyzer: ClaimAnalyzer,
        scoring: ScoringConfig,
    ) -> Self {
        Self {
            credibility,
            analyzer,
            scoring,
        }
    }

    /// Heuristic-only node with default weights
    pub fn heuristic() -> Self {
        Self::new(
            SourceCredibility::default(),
            ClaimAnalyzer::heuristic_only(),
            ScoringConfig::default(),
        )
    }

    /// Assess pending evidence. Items already present in
    /// `analysis_results` are skipped.
    #[instrument(skip_all, fields(task_id = %state.task_id))]
    pub async fn run(&self, state: &AgentState) -> Vec<TrustAssessment> {
        let pending = state.pending_evidence();
        let mut results = Vec::with_capacity(pending.len());

        for ev in pending {
            let cred = self.credibility.assess(ev.locator());
            let claim = self.analyzer.analyze(&ev.content).await;
            let content_len = ev.content_len();

            let trust = compute_trust_score(
                &self.scoring,
                cred.score,
                claim.stance,
                &claim.fallacies,
                content_len,
            );

            let fallacies = if claim.fallacies.is_empty() {
                "none".to_string()
            } else {
                claim.fallacies.join(", ")
            };

            let reasoning = format!(
                "domain={}; cred={}. stance={}; fallacies={}. len={}. computed_trust={}",
                cred.domain, cred.score, claim.stance, fallacies, content_len, trust
            );

            debug!(evidence_id = %ev.evidence_id, trust, "Evidence assessed");

            results.push(TrustAssessment {
                evidence_id: ev.evidence_id.clone(),
                trust_score: trust,
                reasoning,
            });
        }

        results
    }
}

/// Decides whether the evidence is sufficient and, if not, proposes the next
/// search query
#[derive(Clone)]
pub struct RefinementNode {
    provider: Option<Arc<dyn LLMProvider>>,
    config: RefinementConfig,
}

impl RefinementNode {
    pub fn new(provider: Option<Arc<dyn LLMProvider>>, config: RefinementConfig) -> Self {
        Self { provider, config }
    }

    /// Returns the next query, or an empty string when the evidence is sufficient
    #[instrument(skip_all, fields(task_id = %state.task_id))]
    pub async fn run(&self, state: &AgentState) -> String {
        let results = &state.analysis_results;

        if results.is_empty() {
            return format!(
                "{} {} \"official statement\"",
                state.initial_query,
                site_filter(&self.config.primary_sites)
            );
        }

        if self.is_sufficient(results) {
            info!("Evidence is sufficient, no further query needed");
            return String::new();
        }

        if let Some(query) = self.llm_query(state).await {
            return query;
        }

        let fallback = format!(
            "{} {} \"official statement\"",
            state.initial_query,
            site_filter(&self.config.fallback_sites)
        );
        truncate_chars(&fallback, self.config.max_query_chars)
    }

    /// Enough high-trust items and no low-trust item contradicting them
    pub fn is_sufficient(&self, results: &[TrustAssessment]) -> bool {
        let high = results
            .iter()
            .filter(|r| r.trust_score >= self.config.high_trust_threshold)
            .count();
        let low = results
            .iter()
            .filter(|r| r.trust_score < self.config.low_trust_threshold)
            .count();

        high >= self.config.min_high_trust && !(high > 0 && low > 0)
    }

    async fn llm_query(&self, state: &AgentState) -> Option<String> {
        let provider = self.provider.as_ref()?;

        let table = state
            .analysis_results
            .iter()
            .take(self.config.summary_limit)
            .map(|r| format!("{}={}", r.evidence_id, r.trust_score))
            .collect::<Vec<_>>()
            .join("; ");

        let prompt = build_refinement_prompt(&state.initial_query, &table, self.config.max_query_chars);
        let response = match provider
            .generate_with_config(&prompt, &GenerationConfig::default())
            .await
        {
            Ok(response) => response,
            Err(e) => {
                debug!(error = %e, "Refinement LLM call failed, using fallback query");
                return None;
            }
        };

        let first_line = response.content.trim().lines().next().unwrap_or_default().trim();
        let query = truncate_chars(first_line, self.config.max_query_chars);
        (!query.is_empty()).then_some(query)
    }
}

fn site_filter(sites: &[String]) -> String {
    sites
        .iter()
        .map(|site| format!("site:{}", site))
        .collect::<Vec<_>>()
        .join(" OR ")
}

pub(crate) fn truncate_chars(text: &str, max_chars: usize) -> String {
    text.chars().take(max_chars).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use autoverifier_core::EvidenceItem;

    fn assessment(id: &str, score: f64) -> TrustAssessment {
        TrustAssessment {
            evidence_id: id.to_string(),
            trust_score: score,
            reasoning: String::new(),
        }
    }

    fn refinement() -> RefinementNode {
        RefinementNode::new(None, RefinementConfig::default())
    }

    #[tokio::test]
    async fn test_verifier_node_reasoning_format() {
        let state = AgentState::with_evidence(
            "Did public figure X resign?",
            vec![EvidenceItem::new(
                "Reporter",
                "Official spokesperson announced that X happened today.",
            )
            .with_id("e1")
            .with_url("https://example.com/news/1")],
            1,
        );

        let results = VerifierNode::heuristic().run(&state).await;
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].evidence_id, "e1");
        assert_eq!(results[0].trust_score, 0.55);
        assert_eq!(
            results[0].reasoning,
            "domain=example.com; cred=0.5. stance=assertion; fallacies=none. len=54. computed_trust=0.55"
        );
    }

    #[tokio::test]
    async fn test_verifier_node_skips_analyzed_evidence() {
        let mut state = AgentState::with_evidence(
            "claim",
            vec![
                EvidenceItem::new("bbc.com", "short one").with_id("e1"),
                EvidenceItem::new("reuters.com", "short two").with_id("e2"),
            ],
            1,
        );
        state.extend_analysis([assessment("e1", 0.9)]);

        let results = VerifierNode::heuristic().run(&state).await;
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].evidence_id, "e2");
        // reuters.com 0.92, short text is speculation
        assert_eq!(results[0].trust_score, 0.87);
    }

    #[tokio::test]
    async fn test_refinement_without_results_targets_primary_sites() {
        let state = AgentState::new("Did X resign?", 1);
        let query = refinement().run(&state).await;
        assert_eq!(
            query,
            "Did X resign? site:reuters.com OR site:apnews.com \"official statement\""
        );
    }

    #[tokio::test]
    async fn test_refinement_sufficient_evidence() {
        let mut state = AgentState::new("Did X resign?", 1);
        state.extend_analysis([assessment("e1", 0.9), assessment("e2", 0.8)]);
        assert_eq!(refinement().run(&state).await, "");
    }

    #[tokio::test]
    async fn test_refinement_conflict_uses_fallback() {
        let mut state = AgentState::new("Did X resign?", 1);
        state.extend_analysis([
            assessment("e1", 0.9),
            assessment("e2", 0.8),
            assessment("e3", 0.2),
        ]);

        let query = refinement().run(&state).await;
        assert_eq!(
            query,
            "Did X resign? site:reuters.com OR site:apnews.com OR site:bbc.com \"official statement\""
        );
    }

    #[tokio::test]
    async fn test_refinement_fallback_truncated() {
        let mut state = AgentState::new("q".repeat(200), 1);
        state.extend_analysis([assessment("e1", 0.5)]);

        let query = refinement().run(&state).await;
        assert_eq!(query.chars().count(), 140);
        assert!(query.chars().all(|c| c == 'q'));
    }

    #[test]
    fn test_sufficiency_thresholds() {
        let node = refinement();
        assert!(!node.is_sufficient(&[assessment("a", 0.75)]));
        assert!(node.is_sufficient(&[assessment("a", 0.75), assessment("b", 0.75)]));
        // Items between the thresholds do not block sufficiency
        assert!(node.is_sufficient(&[
            assessment("a", 0.8),
            assessment("b", 0.8),
            assessment("c", 0.5)
        ]));
        assert!(!node.is_sufficient(&[
            assessment("a", 0.8),
            assessment("b", 0.8),
            assessment("c", 0.39)
        ]));
    }
}
