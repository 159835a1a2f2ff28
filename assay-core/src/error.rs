//! Validation errors for the assay data model.

use thiserror::Error;

use crate::ids::QuestionId;

/// A domain object violated a model invariant.
///
/// Validation runs before any generation or grading work, so these errors
/// surface immediately rather than after port calls have been spent.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// Question text is missing or blank
    #[error("Question {question} has no text")]
    EmptyText { question: QuestionId },

    /// Questions must be worth at least one point
    #[error("Question {question} has zero points")]
    ZeroPoints { question: QuestionId },

    /// Multiple-choice questions need at least two options
    #[error("Question {question} has {count} options, need at least 2")]
    TooFewOptions { question: QuestionId, count: usize },

    /// The stored correct answer is not one of the options
    #[error("Question {question}: correct answer is not among the options")]
    MissingCorrectOption { question: QuestionId },

    /// Fill-in-blank questions need at least one accepted answer
    #[error("Question {question} has no accepted answers")]
    NoAcceptedAnswers { question: QuestionId },

    /// Short-answer questions need a sample answer for the grader
    #[error("Question {question} has no sample answer")]
    EmptySampleAnswer { question: QuestionId },

    /// An essay rubric must be worth exactly the question's points
    #[error(
        "Question {question}: rubric totals {rubric_total} points but the question is worth {points}"
    )]
    EssayPointsMismatch {
        question: QuestionId,
        rubric_total: u32,
        points: u32,
    },

    /// Coding challenges must name a language
    #[error("Question {question} has no language")]
    NoLanguage { question: QuestionId },

    /// Coding challenges need at least one test case
    #[error("Question {question} has no test cases")]
    NoTestCases { question: QuestionId },

    /// Matching questions need at least two pairs
    #[error("Question {question} has {count} pairs, need at least 2")]
    TooFewPairs { question: QuestionId, count: usize },

    /// Ordering questions need at least two items
    #[error("Question {question} has {count} items, need at least 2")]
    TooFewItems { question: QuestionId, count: usize },

    /// The correct order must be a permutation of the item indices
    #[error("Question {question}: correct order is not a permutation of the items")]
    InvalidOrdering { question: QuestionId },

    /// Case studies need at least one sub-question
    #[error("Question {question} has no sub-questions")]
    NoSubQuestions { question: QuestionId },

    /// Sub-question ids must be unique within the case study
    #[error("Question {question} repeats sub-question id '{sub_id}'")]
    DuplicateSubQuestion { question: QuestionId, sub_id: String },

    /// Sub-question points must sum to the question's points
    #[error("Question {question}: sub-questions total {actual} points, expected {expected}")]
    SubQuestionPointsMismatch {
        question: QuestionId,
        expected: u32,
        actual: u32,
    },

    /// Rubrics need at least one criterion
    #[error("Rubric has no criteria")]
    EmptyRubric,

    /// Criterion points must sum to the rubric total
    #[error("Rubric criteria total {actual} points, expected {expected}")]
    RubricPointsMismatch { expected: u32, actual: u32 },

    /// Every rubric criterion needs a name
    #[error("Rubric criterion has no name")]
    UnnamedCriterion,

    /// Criterion names must be unique within a rubric
    #[error("Rubric repeats criterion '{name}'")]
    DuplicateCriterion { name: String },

    /// Level scores must strictly increase from weakest to strongest
    #[error("Rubric criterion '{criterion}' has level scores out of order")]
    RubricLevelOrder { criterion: String },

    /// No level may be worth more than its criterion
    #[error(
        "Rubric criterion '{criterion}' has a level worth {level_score}, above its {points} points"
    )]
    RubricLevelCap {
        criterion: String,
        level_score: u32,
        points: u32,
    },

    /// The strongest level must be worth the full criterion points
    #[error(
        "Rubric criterion '{criterion}' tops out at {level_score} of its {points} points"
    )]
    RubricLevelTop {
        criterion: String,
        level_score: u32,
        points: u32,
    },

    /// Question ids must be unique within an assessment
    #[error("Assessment repeats question id {question}")]
    DuplicateQuestionId { question: QuestionId },

    /// Metadata total must match the question points
    #[error("Assessment metadata totals {actual} points but the questions total {expected}")]
    MetadataPointsMismatch { expected: u32, actual: u32 },

    /// Generation input must name a topic
    #[error("Assessment input has no topic")]
    EmptyTopic,

    /// Generation input must name an audience
    #[error("Assessment input has no audience")]
    EmptyAudience,

    /// Generation input must request at least one question
    #[error("Assessment input requests zero questions")]
    NoQuestionsRequested,

    /// Generation input must state at least one learning objective
    #[error("Assessment input has no learning objectives")]
    NoLearningObjectives,

    /// Per-kind counts must sum to the requested total
    #[error("Per-kind question counts total {actual}, expected {expected}")]
    KindCountMismatch { expected: usize, actual: usize },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = ValidationError::TooFewOptions {
            question: QuestionId::from("q1"),
            count: 1,
        };
        assert_eq!(err.to_string(), "Question q1 has 1 options, need at least 2");
    }

    #[test]
    fn test_errors_are_comparable() {
        assert_eq!(ValidationError::EmptyTopic, ValidationError::EmptyTopic);
        assert_ne!(
            ValidationError::EmptyTopic,
            ValidationError::NoQuestionsRequested
        );
    }
}
