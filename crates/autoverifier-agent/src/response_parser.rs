use autoverifier_core::{Label, VerificationResult};
use lazy_static::lazy_static;
use regex::Regex;
use serde_json::{json, Map, Value};
use tracing::debug;

pub const PARSE_FAILURE_CONFIDENCE: f64 = 0.1;
pub const DEFAULT_CONFIDENCE: f64 = 0.5;
pub const DEFAULT_EXPLANATION: &str = "Unable to generate proper explanation.";

lazy_static! {
    // Greedy: from the first '{' to the last '}', across newlines
    static ref JSON_OBJECT_REGEX: Regex =
        Regex::new(r"(?s)\{.*\}").expect("JSON object pattern is valid");
}

/// Locate and parse the outermost `{...}` span of an LLM response
pub fn find_json_object(response: &str) -> Option<Map<String, Value>> {
    let candidate = JSON_OBJECT_REGEX.find(response)?;
    match serde_json::from_str::<Value>(candidate.as_str()) {
        Ok(Value::Object(map)) => Some(map),
        _ => None,
    }
}

/// Extract a JSON object from an LLM response.
///
/// Tries the embedded `{...}` span first, then the whole trimmed response.
/// Falls back to a NOT_ENOUGH_EVIDENCE object quoting the first 200
/// characters of the response, so this never fails.
pub fn extract_json_from_response(response: &str) -> Map<String, Value> {
    if let Some(map) = find_json_object(response) {
        return map;
    }

    if let Ok(Value::Object(map)) = serde_json::from_str::<Value>(response.trim()) {
        return map;
    }

    debug!("LLM response contained no JSON object, using fallback");
    let preview: String = response.chars().take(200).collect();
    let fallback = json!({
        "label": Label::NotEnoughEvidence.as_str(),
        "confidence": PARSE_FAILURE_CONFIDENCE,
        "explanation": format!("Failed to parse LLM response: {}...", preview),
    });

    match fallback {
        Value::Object(map) => map,
        _ => Map::new(),
    }
}

/// Coerce an extracted JSON object into a valid result.
///
/// Unknown labels become NOT_ENOUGH_EVIDENCE, unusable confidences become
/// 0.5 and a missing explanation gets a placeholder.
pub fn validate_and_fix_result(result: &Map<String, Value>) -> VerificationResult {
    let label = result
        .get("label")
        .and_then(Value::as_str)
        .and_then(|s| s.parse::<Label>().ok())
        .unwrap_or(Label::NotEnoughEvidence);

    let confidence = result
        .get("confidence")
        .and_then(Value::as_f64)
        .filter(|c| c.is_finite() && (0.0..=1.0).contains(c))
        .unwrap_or(DEFAULT_CONFIDENCE);

    let explanation = result
        .get("explanation")
        .and_then(Value::as_str)
        .filter(|e| !e.is_empty())
        .unwrap_or(DEFAULT_EXPLANATION);

    VerificationResult {
        label,
        confidence,
        explanation: explanation.to_string(),
    }
}
