use thiserror::Error;

use crate::domain::{DecodeError, EncodingError, EntryId, ValidationErrors};

/// Failures of a ledger write.
#[derive(Error, Debug)]
pub enum SubmissionError {
    #[error("Ledger unavailable: {0}")]
    Unavailable(String),

    #[error("Ledger rejected entry {entry_id}: {reason}")]
    Rejected { entry_id: EntryId, reason: String },

    #[error("Failed to encode market data: {0}")]
    MarketData(#[from] EncodingError),
}

impl SubmissionError {
    /// Transient failures are worth retrying; the rest will fail the same way again.
    pub fn is_transient(&self) -> bool {
        matches!(self, SubmissionError::Unavailable(_))
    }
}

#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("Failed to encrypt sensitive data: {0}")]
    Encoding(#[from] EncodingError),

    #[error("Failed to decrypt data: {0}")]
    Decode(#[from] DecodeError),

    #[error("Submission failed: {0}")]
    Submission(#[from] SubmissionError),

    #[error("Invalid input: {0}")]
    Validation(#[from] ValidationErrors),
}

impl PipelineError {
    /// Malformed input never becomes valid on retry; only transient
    /// submission failures do.
    pub fn is_retryable(&self) -> bool {
        match self {
            PipelineError::Submission(err) => err.is_transient(),
            _ => false,
        }
    }
}
