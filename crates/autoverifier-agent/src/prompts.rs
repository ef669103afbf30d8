//! Prompts sent to the LLM by the verifier, the claim analyzer and the
//! refinement node. Every prompt asks for a single machine-readable answer so
//! the response parser can recover it from surrounding chatter.

/// Build the fact-checking prompt for a claim and its formatted evidence
pub fn build_verification_prompt(
    claim: &str,
    evidence_text: &str,
    format_instructions: &str,
) -> String {
    format!(
        "You are a professional fact-checker tasked with verifying claims based on provided evidence.\n\n\
        CLAIM TO VERIFY: {claim}\n\n\
        EVIDENCE PROVIDED:\n{evidence_text}\n\n\
        INSTRUCTIONS:\n\
        1. Carefully analyze the claim against the provided evidence\n\
        2. Determine if the evidence SUPPORTS, REFUTES, or provides NOT_ENOUGH_EVIDENCE for the claim\n\
        3. Provide a confidence score (0.0 to 1.0) based on:\n   \
           - Quality and reliability of evidence sources\n   \
           - Strength of connection between evidence and claim\n   \
           - Consistency across multiple evidence pieces\n\
        4. Explain your reasoning clearly and concisely\n\n\
        CLASSIFICATION RULES:\n\
        - SUPPORTED: Evidence clearly confirms the claim is true\n\
        - REFUTED: Evidence clearly shows the claim is false\n\
        - NOT_ENOUGH_EVIDENCE: Evidence is insufficient, contradictory, or doesn't address the claim\n\n\
        RESPONSE FORMAT:\n\
        You must respond with valid JSON matching this exact structure:\n\
        {{\n    \
            \"label\": \"SUPPORTED\" | \"REFUTED\" | \"NOT_ENOUGH_EVIDENCE\",\n    \
            \"confidence\": <float between 0.0 and 1.0>,\n    \
            \"explanation\": \"<detailed explanation of your reasoning>\"\n\
        }}\n\n\
        The output must conform to this JSON schema:\n{format_instructions}\n\n\
        IMPORTANT: Your response must be valid JSON only, no additional text."
    )
}

/// Build the structured extraction prompt for a single evidence text
pub fn build_claim_analysis_prompt(text: &str) -> String {
    format!(
        "Extract a JSON with keys: core_claim, stance (one of assertion/speculation/opinion/question), \
        sentiment (pos/neg/neutral), fallacies (list), supporting_facts (list). Respond only JSON.\n\n\
        TEXT:\n{text}"
    )
}

/// Build the follow-up search query prompt
pub fn build_refinement_prompt(initial_query: &str, trust_summary: &str, max_chars: usize) -> String {
    format!(
        "Initial query: {initial_query}\n\
        Trust summary: {trust_summary}\n\
        Return a single precise search query (<={max_chars} chars) that would find decisive primary \
        sources or reputable fact-checks."
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_verification_prompt_layout() {
        let prompt = build_verification_prompt(
            "The Eiffel Tower is located in Paris, France",
            "Evidence 1:\nSource: Wikipedia\n",
            "{}",
        );
        assert!(prompt.contains("CLAIM TO VERIFY: The Eiffel Tower is located in Paris, France"));
        assert!(prompt.contains("EVIDENCE PROVIDED:\nEvidence 1:"));
        assert!(prompt.contains("\"label\": \"SUPPORTED\" | \"REFUTED\" | \"NOT_ENOUGH_EVIDENCE\""));
        assert!(prompt.ends_with("no additional text."));
    }

    #[test]
    fn test_refinement_prompt_mentions_limit() {
        let prompt = build_refinement_prompt("Did X resign?", "e1=0.5", 140);
        assert!(prompt.starts_with("Initial query: Did X resign?\nTrust summary: e1=0.5\n"));
        assert!(prompt.contains("(<=140 chars)"));
    }
}
