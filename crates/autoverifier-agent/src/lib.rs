pub mod claim_analysis;
pub mod credibility;
pub mod nodes;
pub mod prompts;
pub mod response_parser;
pub mod scoring;
pub mod verifier;
pub mod workflow;

pub use claim_analysis::{ClaimAnalysis, ClaimAnalyzer, Sentiment, Stance};
pub use credibility::{CredibilityReport, SourceCredibility};
pub use nodes::{RefinementNode, VerifierNode};
pub use response_parser::{extract_json_from_response, validate_and_fix_result};
pub use scoring::compute_trust_score;
pub use verifier::ClaimVerifier;
pub use workflow::{
    EvidenceSource, NoEvidenceSource, StaticEvidenceSource, TrustSummary, VerifierWorkflow,
};
