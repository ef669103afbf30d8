use autoverifier_core::{EvidenceItem, VerificationResult};

pub struct DemoCase {
    pub name: &'static str,
    pub claim: &'static str,
    pub evidence: Vec<EvidenceItem>,
}

/// Canonical cases: supported, refuted, insufficient and no evidence
pub fn demo_cases() -> Vec<DemoCase> {
    let wikipedia = EvidenceItem::new(
        "Wikipedia",
        "The Eiffel Tower is a wrought-iron lattice tower located in Paris, France.",
    );

    vec![
        DemoCase {
            name: "SUPPORTED Case - Eiffel Tower Location",
            claim: "The Eiffel Tower is located in Paris, France",
            evidence: vec![
                wikipedia.clone(),
                EvidenceItem::new(
                    "Britannica Encyclopedia",
                    "Eiffel Tower, structure in Paris that serves as the city's most iconic landmark.",
                ),
            ],
        },
        DemoCase {
            name: "REFUTED Case - Wrong Location",
            claim: "The Eiffel Tower is located in London, England",
            evidence: vec![
                wikipedia.with_id(autoverifier_core::new_evidence_id()),
                EvidenceItem::new(
                    "Tourism Guide",
                    "Visit the Eiffel Tower in the heart of Paris, the capital of France.",
                ),
            ],
        },
        DemoCase {
            name: "NOT_ENOUGH_EVIDENCE Case - Specific Detail",
            claim: "The Eiffel Tower was painted bright purple in 2024",
            evidence: vec![EvidenceItem::new(
                "General Travel Blog",
                "The Eiffel Tower is a beautiful monument that attracts millions of visitors.",
            )],
        },
        DemoCase {
            name: "NO EVIDENCE Case",
            claim: "Aliens visited Earth in 2023",
            evidence: Vec::new(),
        },
    ]
}

/// Structural checks every result must pass
pub fn validate_structure(result: &VerificationResult) -> Result<(), String> {
    if !(0.0..=1.0).contains(&result.confidence) {
        return Err(format!("Invalid confidence: {}", result.confidence));
    }
    if result.explanation.trim().is_empty() {
        return Err("Explanation cannot be empty".to_string());
    }
    Ok(())
}
