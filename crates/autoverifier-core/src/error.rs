use thiserror::Error;

#[derive(Error, Debug)]
pub enum VerifierError {
    #[error("Label must be one of [\"SUPPORTED\", \"REFUTED\", \"NOT_ENOUGH_EVIDENCE\"], got: {0}")]
    InvalidLabel(String),

    #[error("Confidence must be between 0 and 1, got: {0}")]
    InvalidConfidence(f64),
}

pub type Result<T> = std::result::Result<T, VerifierError>;
