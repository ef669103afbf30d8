use crate::types::{EvidenceItem, TrustAssessment};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use uuid::Uuid;

/// Current step in the verification workflow
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WorkflowStep {
    Initialize,
    Verifying,
    Refining,
    Searching,
    Complete,
}

impl fmt::Display for WorkflowStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            WorkflowStep::Initialize => "initialize",
            WorkflowStep::Verifying => "verifying",
            WorkflowStep::Refining => "refining",
            WorkflowStep::Searching => "searching",
            WorkflowStep::Complete => "complete",
        };
        f.write_str(name)
    }
}

/// State carried between the verifier and refinement nodes
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentState {
    pub task_id: Uuid,
    pub initial_query: String,
    pub evidence: Vec<EvidenceItem>,
    pub analysis_results: Vec<TrustAssessment>,
    /// Follow-up search query; empty once the evidence is sufficient
    pub next_query: String,
    pub iterations: u32,
    pub max_iterations: u32,
    pub final_conclusion: String,
    pub step: WorkflowStep,
    pub confidence_threshold: f64,
    pub require_multiple_sources: bool,
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
}

impl AgentState {
    pub fn new(claim: impl Into<String>, max_iterations: u32) -> Self {
        Self {
            task_id: Uuid::new_v4(),
            initial_query: claim.into(),
            evidence: Vec::new(),
            analysis_results: Vec::new(),
            next_query: String::new(),
            iterations: 0,
            max_iterations,
            final_conclusion: String::new(),
            step: WorkflowStep::Initialize,
            confidence_threshold: 0.7,
            require_multiple_sources: true,
            errors: Vec::new(),
            warnings: Vec::new(),
        }
    }

    pub fn with_evidence(
        claim: impl Into<String>,
        evidence: Vec<EvidenceItem>,
        max_iterations: u32,
    ) -> Self {
        let mut state = Self::new(claim, max_iterations);
        for item in evidence {
            state.add_evidence(item);
        }
        state
    }

    /// Append an evidence item. Returns false if its id is already present.
    pub fn add_evidence(&mut self, item: EvidenceItem) -> bool {
        if self
            .evidence
            .iter()
            .any(|existing| existing.evidence_id == item.evidence_id)
        {
            return false;
        }
        self.evidence.push(item);
        true
    }

    /// Merge node output into the accumulated results
    pub fn extend_analysis(&mut self, results: impl IntoIterator<Item = TrustAssessment>) {
        self.analysis_results.extend(results);
    }

    pub fn advance(&mut self, step: WorkflowStep) {
        self.step = step;
        self.iterations += 1;
    }

    pub fn analyzed_ids(&self) -> HashSet<&str> {
        self.analysis_results
            .iter()
            .map(|r| r.evidence_id.as_str())
            .collect()
    }

    /// Evidence items that have no assessment yet
    pub fn pending_evidence(&self) -> Vec<&EvidenceItem> {
        let analyzed = self.analyzed_ids();
        self.evidence
            .iter()
            .filter(|ev| !analyzed.contains(ev.evidence_id.as_str()))
            .collect()
    }
}
