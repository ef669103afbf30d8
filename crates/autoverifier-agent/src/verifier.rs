use crate::prompts::build_verification_prompt;
use crate::response_parser::{extract_json_from_response, validate_and_fix_result};
use anyhow::{Context, Result};
use autoverifier_ai::{GenerationConfig, LLMProvider, LLMProviderFactory};
use autoverifier_core::{
    AutoVerifierConfig, EvidenceItem, VerificationRequest, VerificationResult,
};
use futures::stream::{self, StreamExt};
use std::sync::Arc;
use tracing::{debug, error, info, instrument};

pub const DEFAULT_MAX_CONCURRENCY: usize = 4;
const ERROR_CONFIDENCE: f64 = 0.1;

/// LLM-backed fact checker for a claim against a set of evidence items.
///
/// Verification never fails: provider or parsing errors are folded into a
/// `NOT_ENOUGH_EVIDENCE` result whose explanation carries the error.
#[derive(Clone)]
pub struct ClaimVerifier {
    provider: Arc<dyn LLMProvider>,
    generation: GenerationConfig,
    max_concurrency: usize,
    format_instructions: String,
}

impl ClaimVerifier {
    pub fn new(provider: Arc<dyn LLMProvider>) -> Self {
        let generation = GenerationConfig {
            temperature: 0.1,
            ..GenerationConfig::default()
        }
        .json();

        let format_instructions = serde_json::to_string_pretty(&VerificationResult::json_schema())
            .unwrap_or_default();

        Self {
            provider,
            generation,
            max_concurrency: DEFAULT_MAX_CONCURRENCY,
            format_instructions,
        }
    }

    /// JSON output stays requested whatever the caller passes
    pub fn with_generation_config(mut self, generation: GenerationConfig) -> Self {
        self.generation = generation.json();
        self
    }

    pub fn with_max_concurrency(mut self, max_concurrency: usize) -> Self {
        self.max_concurrency = max_concurrency.max(1);
        self
    }

    /// Build the provider from the `[llm]` section and apply verifier limits
    pub fn from_config(config: &AutoVerifierConfig) -> Result<Self> {
        let provider = LLMProviderFactory::create_from_config(&config.llm)
            .context("Failed to create LLM provider for claim verification")?;

        info!(
            provider = provider.provider_name(),
            model = provider.model_name(),
            "Claim verifier initialized"
        );

        Ok(Self::new(provider)
            .with_generation_config(GenerationConfig {
                temperature: config.llm.temperature,
                max_tokens: Some(config.llm.max_tokens),
                ..GenerationConfig::default()
            })
            .with_max_concurrency(config.verifier.max_concurrent_requests))
    }

    pub fn provider(&self) -> &Arc<dyn LLMProvider> {
        &self.provider
    }

    /// Render evidence items as numbered blocks for the prompt
    pub fn format_evidence(evidence: &[EvidenceItem]) -> String {
        if evidence.is_empty() {
            return "No evidence provided.".to_string();
        }

        evidence
            .iter()
            .enumerate()
            .map(|(i, item)| {
                let mut block = format!("Evidence {}:\n", i + 1);
                if !item.source.is_empty() {
                    block.push_str(&format!("Source: {}\n", item.source));
                }
                if let Some(url) = item.url.as_deref().filter(|u| !u.is_empty()) {
                    block.push_str(&format!("URL: {}\n", url));
                }
                if !item.content.is_empty() {
                    block.push_str(&format!("Content: {}\n", item.content));
                }
                block
            })
            .collect::<Vec<_>>()
            .join("\n")
    }

    pub fn build_prompt(&self, claim: &str, evidence_text: &str) -> String {
        build_verification_prompt(claim, evidence_text, &self.format_instructions)
    }

    /// Verify a single claim
    #[instrument(skip(self, evidence), fields(evidence = evidence.len()))]
    pub async fn verify_claim(&self, claim: &str, evidence: &[EvidenceItem]) -> VerificationResult {
        match self.try_verify(claim, evidence).await {
            Ok(result) => {
                debug!(label = %result.label, confidence = result.confidence, "Claim verified");
                result
            }
            Err(e) => {
                error!("Error during claim verification: {:#}", e);
                VerificationResult::not_enough_evidence(
                    ERROR_CONFIDENCE,
                    format!("Error during verification: {:#}", e),
                )
            }
        }
    }

    async fn try_verify(&self, claim: &str, evidence: &[EvidenceItem]) -> Result<VerificationResult> {
        let evidence_text = Self::format_evidence(evidence);
        let prompt = self.build_prompt(claim, &evidence_text);

        let response = self
            .provider
            .generate_with_config(&prompt, &self.generation)
            .await
            .with_context(|| format!("{} request failed", self.provider.provider_name()))?;

        let raw = extract_json_from_response(&response.content);
        Ok(validate_and_fix_result(&raw))
    }

    pub async fn verify_request(&self, request: &VerificationRequest) -> VerificationResult {
        self.verify_claim(&request.claim, &request.evidence).await
    }

    /// Verify several claims; results come back in input order
    pub async fn verify_claim_batch(
        &self,
        claims: &[(String, Vec<EvidenceItem>)],
    ) -> Vec<VerificationResult> {
        info!(
            count = claims.len(),
            concurrency = self.max_concurrency,
            "Verifying claim batch"
        );

        stream::iter(claims)
            .map(|(claim, evidence)| self.verify_claim(claim, evidence))
            .buffered(self.max_concurrency)
            .collect()
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_evidence_empty() {
        assert_eq!(ClaimVerifier::format_evidence(&[]), "No evidence provided.");
    }

    #[test]
    fn test_format_evidence_blocks() {
        let evidence = vec![
            EvidenceItem::new("Wikipedia", "The Eiffel Tower is in Paris.")
                .with_url("https://en.wikipedia.org/wiki/Eiffel_Tower"),
            EvidenceItem::new("", "Unattributed note."),
        ];

        let text = ClaimVerifier::format_evidence(&evidence);
        assert_eq!(
            text,
            "Evidence 1:\nSource: Wikipedia\nURL: https://en.wikipedia.org/wiki/Eiffel_Tower\n\
             Content: The Eiffel Tower is in Paris.\n\n\
             Evidence 2:\nContent: Unattributed note.\n"
        );
    }

    #[test]
    fn test_format_evidence_skips_empty_content() {
        let text = ClaimVerifier::format_evidence(&[EvidenceItem::new("Blog", "")]);
        assert_eq!(text, "Evidence 1:\nSource: Blog\n");
    }
}
