use crate::error::{Result, VerifierError};
use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Verification outcome for a claim
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Label {
    /// Evidence clearly confirms the claim is true
    Supported,
    /// Evidence clearly shows the claim is false
    Refuted,
    /// Evidence is insufficient, contradictory, or doesn't address the claim
    NotEnoughEvidence,
}

impl Label {
    pub const ALL: [Label; 3] = [Label::Supported, Label::Refuted, Label::NotEnoughEvidence];

    pub fn as_str(&self) -> &'static str {
        match self {
            Label::Supported => "SUPPORTED",
            Label::Refuted => "REFUTED",
            Label::NotEnoughEvidence => "NOT_ENOUGH_EVIDENCE",
        }
    }
}

impl fmt::Display for Label {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Label {
    type Err = VerifierError;

    fn from_str(s: &str) -> Result<Self> {
        Label::ALL
            .into_iter()
            .find(|label| label.as_str() == s)
            .ok_or_else(|| VerifierError::InvalidLabel(s.to_string()))
    }
}

pub fn new_evidence_id() -> String {
    Uuid::new_v4().to_string()
}

fn default_source_type() -> String {
    "web_page".to_string()
}

/// A piece of evidence for claim verification
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvidenceItem {
    /// Stable identifier; generated when the input omits it
    #[serde(default = "new_evidence_id")]
    pub evidence_id: String,

    /// Source of the evidence (e.g. "Wikipedia", "BBC News")
    #[serde(default)]
    pub source: String,

    #[serde(default = "default_source_type")]
    pub source_type: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,

    /// The actual evidence text
    pub content: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<DateTime<Utc>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,

    /// Relevance score (0-1), when the retriever provides one
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub relevance_score: Option<f32>,
}

impl EvidenceItem {
    pub fn new(source: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            evidence_id: new_evidence_id(),
            source: source.into(),
            source_type: default_source_type(),
            url: None,
            content: content.into(),
            timestamp: None,
            author: None,
            relevance_score: None,
        }
    }

    pub fn with_id(mut self, evidence_id: impl Into<String>) -> Self {
        self.evidence_id = evidence_id.into();
        self
    }

    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.url = Some(url.into());
        self
    }

    /// URL when present, otherwise the source name
    pub fn locator(&self) -> &str {
        self.url.as_deref().unwrap_or(&self.source)
    }

    /// Content length in characters
    pub fn content_len(&self) -> usize {
        self.content.chars().count()
    }
}

impl fmt::Display for EvidenceItem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let preview: String = self.content.chars().take(50).collect();
        write!(
            f,
            "EvidenceItem(source='{}', content='{}...')",
            self.source, preview
        )
    }
}

/// A claim verification request
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VerificationRequest {
    pub claim: String,

    #[serde(default)]
    pub evidence: Vec<EvidenceItem>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub context: Option<serde_json::Value>,
}

impl VerificationRequest {
    pub fn new(claim: impl Into<String>, evidence: Vec<EvidenceItem>) -> Self {
        Self {
            claim: claim.into(),
            evidence,
            context: None,
        }
    }
}

/// Structured output of a claim verification
#[derive(Debug, Clone, PartialEq, Serialize, JsonSchema)]
pub struct VerificationResult {
    /// Verification label: SUPPORTED, REFUTED, or NOT_ENOUGH_EVIDENCE
    pub label: Label,
    /// Confidence score between 0 and 1
    pub confidence: f64,
    /// Detailed explanation of the verification decision
    pub explanation: String,
}

impl VerificationResult {
    pub fn new(label: Label, confidence: f64, explanation: impl Into<String>) -> Result<Self> {
        if !confidence.is_finite() || !(0.0..=1.0).contains(&confidence) {
            return Err(VerifierError::InvalidConfidence(confidence));
        }

        Ok(Self {
            label,
            confidence,
            explanation: explanation.into(),
        })
    }

    /// Parse the label from its wire name, then validate like [`VerificationResult::new`]
    pub fn from_parts(label: &str, confidence: f64, explanation: impl Into<String>) -> Result<Self> {
        Self::new(label.parse()?, confidence, explanation)
    }

    /// Fallback used whenever verification cannot produce a trustworthy answer.
    /// The confidence is a constant inside [0, 1].
    pub fn not_enough_evidence(confidence: f64, explanation: impl Into<String>) -> Self {
        Self {
            label: Label::NotEnoughEvidence,
            confidence: confidence.clamp(0.0, 1.0),
            explanation: explanation.into(),
        }
    }

    /// JSON schema of the result, rendered for prompt format instructions
    pub fn json_schema() -> serde_json::Value {
        serde_json::to_value(schemars::schema_for!(VerificationResult))
            .unwrap_or(serde_json::Value::Null)
    }
}

#[derive(Deserialize)]
struct VerificationResultRepr {
    label: String,
    confidence: f64,
    explanation: String,
}

impl<'de> Deserialize<'de> for VerificationResult {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let repr = VerificationResultRepr::deserialize(deserializer)?;
        VerificationResult::from_parts(&repr.label, repr.confidence, repr.explanation)
            .map_err(serde::de::Error::custom)
    }
}

/// Per-evidence output of the verifier node
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrustAssessment {
    pub evidence_id: String,
    pub trust_score: f64,
    pub reasoning: String,
}

/// Example evidence items for demos and tests
pub fn sample_evidence() -> Vec<EvidenceItem> {
    vec![
        EvidenceItem::new(
            "Wikipedia",
            "The Eiffel Tower is a wrought-iron lattice tower on the Champ de Mars in Paris, France.",
        )
        .with_url("https://en.wikipedia.org/wiki/Eiffel_Tower"),
        EvidenceItem::new(
            "Britannica",
            "Eiffel Tower, structure in Paris that serves as the city's most recognizable landmark.",
        )
        .with_url("https://www.britannica.com/topic/Eiffel-Tower-Paris-France"),
    ]
}
