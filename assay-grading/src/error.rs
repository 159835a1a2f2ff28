//! Error types for grading operations.

use thiserror::Error;

use assay_core::{QuestionId, QuestionKind, SubmissionId};
use assay_genai::GenAiError;

use crate::executor::ExecutionError;

/// Error type for grading operations.
///
/// Most grading failures never escape the engine: a failed strategy becomes a
/// zero-score placeholder result, and a failed submission becomes a batch
/// error record. These variants are what those paths catch.
#[derive(Debug, Error)]
pub enum GradingError {
    /// A submission answered the same question more than once.
    #[error("Submission {submission} has multiple responses for question {question}")]
    DuplicateResponse {
        submission: SubmissionId,
        question: QuestionId,
    },

    /// The response value's shape does not fit the question type.
    #[error("Response shape does not match a {kind} question")]
    ResponseShape { kind: QuestionKind },

    /// A port call failed.
    #[error("Content port error: {0}")]
    Port(#[from] GenAiError),

    /// Code execution failed before producing test outcomes.
    #[error("Code execution error: {0}")]
    Execution(#[from] ExecutionError),
}

/// Result type alias for grading operations.
pub type Result<T> = std::result::Result<T, GradingError>;
