//! Shared data model for the assay assessment toolkit.
//!
//! Everything that crosses a crate boundary lives here: questions and their
//! nine typed bodies, rubrics, student submissions, grading results, and the
//! validation rules that keep them internally consistent.
//!
//! ```text
//! AssessmentInput ──▶ Assessment ──▶ StudentSubmission ──▶ AssessmentResult
//!      (request)       (questions)       (responses)        (graded + analytics)
//! ```
//!
//! The downstream crates (`assay-genai`, `assay-grading`, `assay-analytics`,
//! `assay-pipeline`) depend on this one and never on each other's internals.

pub mod assessment;
pub mod error;
pub mod ids;
pub mod input;
pub mod question;
pub mod result;
pub mod rubric;
pub mod submission;

pub use assessment::{Assessment, AssessmentConfig, AssessmentKind, AssessmentMetadata};
pub use error::ValidationError;
pub use ids::{AssessmentId, QuestionId, RequestId, StudentId, SubmissionId};
pub use input::{AssessmentInput, QuestionCounts};
pub use question::{
    BloomsLevel, CaseStudyBody, CodingChallengeBody, Difficulty, EssayBody, FillInBlankBody,
    MatchingBody, MatchingPair, MultipleChoiceBody, OrderingBody, Question, QuestionBody,
    QuestionKind, ShortAnswerBody, SubQuestion, TestCase, TrueFalseBody,
};
pub use result::{
    AssessmentResult, GRADING_ERROR_FEEDBACK, GradingResult, LearningAnalytics,
    NO_RESPONSE_FEEDBACK, RubricScore,
};
pub use rubric::{Rubric, RubricCriterion, RubricLevel};
pub use submission::{ResponseValue, StudentResponse, StudentSubmission};
