//! Error types for port calls.

use thiserror::Error;

/// Error type for content generation operations.
#[derive(Debug, Error)]
pub enum GenAiError {
    /// A template referenced a variable that was never provided.
    #[error("template '{template}' has no value for '{variable}'")]
    MissingVariable { template: String, variable: String },

    /// A template could not be rendered.
    #[error("template '{template}' is malformed: {message}")]
    Template { template: String, message: String },

    /// The backing service failed to produce content.
    #[error("content generation failed: {0}")]
    Generation(String),

    /// The backing service failed to grade a response.
    #[error("grading call failed: {0}")]
    Grading(String),

    /// Generated content did not match the expected schema.
    #[error("failed to decode generated content: {0}")]
    Decode(String),

    /// The call exceeded its time budget.
    #[error("port call timed out after {0} seconds")]
    Timeout(u32),
}

/// Result type alias for port operations.
pub type Result<T> = std::result::Result<T, GenAiError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = GenAiError::MissingVariable {
            template: "question-batch".into(),
            variable: "topic".into(),
        };
        assert_eq!(
            err.to_string(),
            "template 'question-batch' has no value for 'topic'"
        );
    }

    #[test]
    fn test_timeout_display() {
        assert_eq!(
            GenAiError::Timeout(30).to_string(),
            "port call timed out after 30 seconds"
        );
    }
}
