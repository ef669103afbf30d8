mod common;

use autoverifier_agent::ClaimVerifier;
use autoverifier_core::{sample_evidence, EvidenceItem, Label, VerificationRequest};
use common::{RuleProvider, ScriptedProvider};

#[tokio::test]
async fn test_verify_supported_claim() {
    let provider = ScriptedProvider::replying(&[
        r#"{"label": "SUPPORTED", "confidence": 0.95, "explanation": "Both sources place the tower in Paris."}"#,
    ]);
    let verifier = ClaimVerifier::new(provider.clone());

    let result = verifier
        .verify_claim("The Eiffel Tower is located in Paris, France", &sample_evidence())
        .await;

    assert_eq!(result.label, Label::Supported);
    assert_eq!(result.confidence, 0.95);
    assert_eq!(result.explanation, "Both sources place the tower in Paris.");

    let prompts = provider.prompts();
    assert_eq!(prompts.len(), 1);
    assert!(prompts[0].contains("CLAIM TO VERIFY: The Eiffel Tower is located in Paris, France"));
    assert!(prompts[0].contains("Evidence 1:\nSource: Wikipedia"));
    assert!(prompts[0].contains("\"confidence\""));
    assert_eq!(provider.json_requests(), vec![true]);
}

#[tokio::test]
async fn test_verify_without_evidence_mentions_it_in_prompt() {
    let provider = ScriptedProvider::replying(&[
        r#"{"label": "NOT_ENOUGH_EVIDENCE", "confidence": 0.2, "explanation": "Nothing to go on."}"#,
    ]);
    let verifier = ClaimVerifier::new(provider.clone());

    let result = verifier.verify_claim("Aliens built the pyramids", &[]).await;
    assert_eq!(result.label, Label::NotEnoughEvidence);
    assert!(provider.prompts()[0].contains("EVIDENCE PROVIDED:\nNo evidence provided."));
}

#[tokio::test]
async fn test_unparsable_response_falls_back() {
    let provider = ScriptedProvider::replying(&["I think it is probably true."]);
    let verifier = ClaimVerifier::new(provider);

    let result = verifier.verify_claim("Water boils at 100C", &[]).await;
    assert_eq!(result.label, Label::NotEnoughEvidence);
    assert_eq!(result.confidence, 0.1);
    assert_eq!(
        result.explanation,
        "Failed to parse LLM response: I think it is probably true...."
    );
}

#[tokio::test]
async fn test_invalid_fields_are_repaired() {
    let provider = ScriptedProvider::replying(&[
        "Sure! {\"label\": \"MOSTLY_TRUE\", \"confidence\": 7, \"explanation\": \"Close enough\"}",
    ]);
    let verifier = ClaimVerifier::new(provider);

    let result = verifier.verify_claim("claim", &[]).await;
    assert_eq!(result.label, Label::NotEnoughEvidence);
    assert_eq!(result.confidence, 0.5);
    assert_eq!(result.explanation, "Close enough");
}

#[tokio::test]
async fn test_provider_error_never_propagates() {
    let provider = ScriptedProvider::new([Err("quota exceeded".to_string())]);
    let verifier = ClaimVerifier::new(provider);

    let result = verifier.verify_claim("claim", &[]).await;
    assert_eq!(result.label, Label::NotEnoughEvidence);
    assert_eq!(result.confidence, 0.1);
    assert!(result.explanation.starts_with("Error during verification:"));
    assert!(result.explanation.contains("quota exceeded"));
}

#[tokio::test]
async fn test_batch_preserves_input_order() {
    let provider = RuleProvider::new(|prompt: &str| {
        if prompt.contains("CLAIM TO VERIFY: The Eiffel Tower is located in Paris") {
            r#"{"label": "SUPPORTED", "confidence": 0.9, "explanation": "paris"}"#.to_string()
        } else if prompt.contains("CLAIM TO VERIFY: The Eiffel Tower is located in London") {
            r#"{"label": "REFUTED", "confidence": 0.85, "explanation": "london"}"#.to_string()
        } else {
            r#"{"label": "NOT_ENOUGH_EVIDENCE", "confidence": 0.3, "explanation": "other"}"#
                .to_string()
        }
    });
    let verifier = ClaimVerifier::new(provider).with_max_concurrency(3);

    let claims = vec![
        ("The Eiffel Tower is located in London".to_string(), sample_evidence()),
        ("The Eiffel Tower is located in Paris".to_string(), sample_evidence()),
        ("The moon is made of cheese".to_string(), Vec::new()),
        ("The Eiffel Tower is located in London".to_string(), Vec::new()),
    ];

    let results = verifier.verify_claim_batch(&claims).await;
    let labels: Vec<Label> = results.iter().map(|r| r.label).collect();
    assert_eq!(
        labels,
        vec![
            Label::Refuted,
            Label::Supported,
            Label::NotEnoughEvidence,
            Label::Refuted
        ]
    );
    assert_eq!(results[2].explanation, "other");
}

#[tokio::test]
async fn test_empty_batch() {
    let verifier = ClaimVerifier::new(ScriptedProvider::replying(&[]));
    assert!(verifier.verify_claim_batch(&[]).await.is_empty());
}

#[tokio::test]
async fn test_verify_request() {
    let provider = ScriptedProvider::replying(&[
        r#"{"label": "REFUTED", "confidence": 0.8, "explanation": "Guide says Paris."}"#,
    ]);
    let verifier = ClaimVerifier::new(provider.clone());
    let request = VerificationRequest::new(
        "The Eiffel Tower is in London",
        vec![EvidenceItem::new("Tourism Guide", "The Eiffel Tower is a famous landmark in Paris.")],
    );

    let result = verifier.verify_request(&request).await;
    assert_eq!(result.label, Label::Refuted);
    assert!(provider.prompts()[0].contains("Source: Tourism Guide"));
}
