use thiserror::Error;

use crate::llm_client::backoff::BackoffError;
use crate::llm_client::LlmError;

/// Application-level error type.
/// Everything the pipeline can fail with bubbles up as one of these; the
/// binary edge decides how to print it.
#[derive(Debug, Error)]
pub enum AppError {
    /// Degenerate input, e.g. a job description with no tokens.
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Unsupported document format: {0}")]
    UnsupportedFormat(String),

    #[error("Completion service still rate limited after {attempts} attempts")]
    RetriesExhausted { attempts: u32 },

    #[error("LLM error: {0}")]
    Llm(String),

    #[error("Operation cancelled")]
    Cancelled,

    #[error("Operation timed out after {0}s")]
    TimedOut(u64),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl From<BackoffError> for AppError {
    fn from(err: BackoffError) -> Self {
        match err {
            BackoffError::RetriesExhausted { attempts } => AppError::RetriesExhausted { attempts },
            BackoffError::Cancelled => AppError::Cancelled,
            BackoffError::Fatal(e) => AppError::from(e),
        }
    }
}

impl From<LlmError> for AppError {
    fn from(err: LlmError) -> Self {
        AppError::Llm(err.to_string())
    }
}
