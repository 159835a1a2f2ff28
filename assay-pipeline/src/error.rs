//! Error types for pipeline operations.

use thiserror::Error;

use assay_core::ValidationError;
use assay_genai::GenAiError;

use crate::progress::StepName;

/// Error type for pipeline operations.
///
/// Input problems surface before any port call is spent. Failures inside a
/// generation step come back wrapped in [`PipelineError::StepFailed`] so the
/// caller knows where the run died.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// The generation input failed validation.
    #[error("Invalid assessment input: {0}")]
    InvalidInput(#[from] ValidationError),

    /// The input asked for more questions than the pipeline allows.
    #[error("Requested {requested} questions, the configured maximum is {limit}")]
    TooManyQuestions { requested: usize, limit: usize },

    /// A port call failed after exhausting its retries.
    #[error("Content port error: {0}")]
    Port(#[from] GenAiError),

    /// Generation produced no question that survived validation.
    #[error("No valid questions were generated")]
    NoValidQuestions,

    /// A generation step failed and the run was abandoned.
    #[error("Generation step '{step}' failed: {source}")]
    StepFailed {
        step: StepName,
        #[source]
        source: Box<PipelineError>,
    },

    /// A configuration file could not be read or parsed.
    #[error("Config error: {0}")]
    Config(String),
}

/// Result type alias for pipeline operations.
pub type Result<T> = std::result::Result<T, PipelineError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = PipelineError::TooManyQuestions {
            requested: 80,
            limit: 50,
        };
        assert_eq!(
            err.to_string(),
            "Requested 80 questions, the configured maximum is 50"
        );
    }

    #[test]
    fn test_step_failures_name_the_step() {
        let err = PipelineError::StepFailed {
            step: StepName::Questions,
            source: Box::new(PipelineError::Port(GenAiError::Timeout(30))),
        };
        assert_eq!(
            err.to_string(),
            "Generation step 'questions' failed: Content port error: port call timed out after 30 seconds"
        );
    }

    #[test]
    fn test_validation_errors_convert() {
        let err: PipelineError = ValidationError::EmptyTopic.into();
        assert!(matches!(err, PipelineError::InvalidInput(_)));
    }
}
