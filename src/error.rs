use thiserror::Error;

use crate::store::StoreError;

/// Failure taxonomy for the exam session lifecycle. Configuration and
/// availability problems carry actionable detail; transport failures wrap
/// the store error so callers can offer a retry.
#[derive(Debug, Error)]
pub enum ExamError {
    #[error("authentication required")]
    AuthenticationRequired,

    #[error("insufficient questions: requested {requested}, only {available} available")]
    InsufficientQuestions { requested: usize, available: usize },

    #[error("{what} index {index} out of range (limit {limit})")]
    InvalidIndex { what: &'static str, index: usize, limit: usize },

    #[error("exam session not found: {0}")]
    SessionNotFound(String),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("invalid payload: {0}")]
    Validation(#[from] validator::ValidationErrors),

    #[error("invariant violation: {0}")]
    InvariantViolation(String),
}
