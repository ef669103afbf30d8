use crate::prompts::build_claim_analysis_prompt;
use crate::response_parser::find_json_object;
use autoverifier_ai::{GenerationConfig, LLMProvider};
use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::sync::Arc;
use tracing::debug;

/// Texts shorter than this are treated as speculation without asking the LLM
pub const MIN_ANALYZABLE_CHARS: usize = 40;
const LLM_CORE_CLAIM_CHARS: usize = 200;
const HEURISTIC_CORE_CLAIM_CHARS: usize = 250;

// Cues match whole words only. Substring matching would read "announced" as
// the negation "no" and "restated" as "stated".
lazy_static! {
    static ref ASSERTION_CUES: Regex =
        Regex::new(r"(?i)\b(confirmed|announced|stated|said)\b").expect("assertion cue pattern");
    static ref NEGATION_CUES: Regex =
        Regex::new(r"(?i)\b(not|no|never|deny|denied)\b").expect("negation cue pattern");
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Stance {
    Assertion,
    Speculation,
    Opinion,
    Question,
}

impl Stance {
    /// Unrecognized values count as opinion, which carries no scoring weight
    pub fn from_label(label: &str) -> Self {
        match label.trim().to_lowercase().as_str() {
            "assertion" => Stance::Assertion,
            "speculation" => Stance::Speculation,
            "question" => Stance::Question,
            _ => Stance::Opinion,
        }
    }
}

impl fmt::Display for Stance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stance::Assertion => "assertion",
            Stance::Speculation => "speculation",
            Stance::Opinion => "opinion",
            Stance::Question => "question",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Sentiment {
    Pos,
    Neg,
    Neutral,
}

impl Sentiment {
    pub fn from_label(label: &str) -> Self {
        match label.trim().to_lowercase().as_str() {
            "pos" | "positive" => Sentiment::Pos,
            "neg" | "negative" => Sentiment::Neg,
            _ => Sentiment::Neutral,
        }
    }
}

/// Core claim plus meta-signals extracted from an evidence text
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClaimAnalysis {
    pub core_claim: String,
    pub stance: Stance,
    pub sentiment: Sentiment,
    pub fallacies: Vec<String>,
    pub supporting_facts: Vec<String>,
}

/// Extracts claim signals, through the LLM when one is configured and by
/// keyword heuristics otherwise
#[derive(Clone, Default)]
pub struct ClaimAnalyzer {
    provider: Option<Arc<dyn LLMProvider>>,
}

impl ClaimAnalyzer {
    pub fn new(provider: Option<Arc<dyn LLMProvider>>) -> Self {
        Self { provider }
    }

    pub fn heuristic_only() -> Self {
        Self { provider: None }
    }

    /// Analyze an evidence text. Never fails.
    pub async fn analyze(&self, text: &str) -> ClaimAnalysis {
        let text = text.trim();
        if text.chars().count() < MIN_ANALYZABLE_CHARS {
            return ClaimAnalysis {
                core_claim: text.to_string(),
                stance: Stance::Speculation,
                sentiment: Sentiment::Neutral,
                fallacies: Vec::new(),
                supporting_facts: Vec::new(),
            };
        }

        if let Some(provider) = &self.provider {
            if let Some(analysis) = self.analyze_with_llm(provider.as_ref(), text).await {
                return analysis;
            }
        }

        heuristic_analysis(text)
    }

    async fn analyze_with_llm(&self, provider: &dyn LLMProvider, text: &str) -> Option<ClaimAnalysis> {
        let prompt = build_claim_analysis_prompt(text);
        let config = GenerationConfig::default().json();

        let response = match provider.generate_with_config(&prompt, &config).await {
            Ok(response) => response,
            Err(e) => {
                debug!(error = %e, "Claim analysis LLM call failed, using heuristics");
                return None;
            }
        };

        let parsed = find_json_object(&response.content)?;

        Some(ClaimAnalysis {
            core_claim: parsed
                .get("core_claim")
                .and_then(Value::as_str)
                .map(|c| c.chars().take(LLM_CORE_CLAIM_CHARS).collect())
                .unwrap_or_default(),
            stance: parsed
                .get("stance")
                .and_then(Value::as_str)
                .map(Stance::from_label)
                .unwrap_or(Stance::Speculation),
            sentiment: parsed
                .get("sentiment")
                .and_then(Value::as_str)
                .map(Sentiment::from_label)
                .unwrap_or(Sentiment::Neutral),
            fallacies: string_list(parsed.get("fallacies")),
            supporting_facts: string_list(parsed.get("supporting_facts")),
        })
    }
}

/// Keyword fallback used when no LLM answer is available
pub fn heuristic_analysis(text: &str) -> ClaimAnalysis {
    let stance = if ASSERTION_CUES.is_match(text) {
        Stance::Assertion
    } else {
        Stance::Speculation
    };

    let sentiment = if NEGATION_CUES.is_match(text) {
        Sentiment::Neg
    } else {
        Sentiment::Neutral
    };

    ClaimAnalysis {
        core_claim: text.chars().take(HEURISTIC_CORE_CLAIM_CHARS).collect(),
        stance,
        sentiment,
        fallacies: Vec::new(),
        supporting_facts: Vec::new(),
    }
}

fn string_list(value: Option<&Value>) -> Vec<String> {
    match value {
        Some(Value::Array(items)) => items
            .iter()
            .filter_map(|item| match item {
                Value::String(s) if !s.trim().is_empty() => Some(s.clone()),
                Value::String(_) | Value::Null => None,
                other => Some(other.to_string()),
            })
            .collect(),
        Some(Value::String(s)) if !s.trim().is_empty() => vec![s.clone()],
        _ => Vec::new(),
    }
}
