//! Grading outcomes, from a single question up to a whole submission.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::ids::{AssessmentId, QuestionId, StudentId, SubmissionId};
use crate::question::{BloomsLevel, Difficulty};

/// Feedback text used for questions the student never answered. Analytics
/// relies on this marker to compute completion rates, so grading writes it
/// through [`GradingResult::no_response`] rather than ad hoc strings.
pub const NO_RESPONSE_FEEDBACK: &str = "No response provided";

/// Feedback text used when a grading strategy failed and a zero-score
/// placeholder was recorded instead.
pub const GRADING_ERROR_FEEDBACK: &str = "An error occurred during grading";

/// Score awarded on one rubric criterion.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RubricScore {
    pub criterion: String,
    pub score: f64,
    pub max_score: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
}

/// Outcome of grading one question.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GradingResult {
    pub question_id: QuestionId,
    pub score: f64,
    pub max_score: f64,
    pub is_correct: bool,
    /// Fraction of credit awarded when the response was close but not
    /// correct; absent for all-or-nothing outcomes.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub partial_credit: Option<f64>,
    pub feedback: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub detailed_feedback: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rubric_scores: Option<Vec<RubricScore>>,
    #[serde(default)]
    pub requires_manual_review: bool,
}

impl GradingResult {
    /// Full-or-partial credit result with plain feedback.
    #[must_use]
    pub fn scored(
        question_id: QuestionId,
        score: f64,
        max_score: f64,
        is_correct: bool,
        feedback: impl Into<String>,
    ) -> Self {
        Self {
            question_id,
            score,
            max_score,
            is_correct,
            partial_credit: None,
            feedback: feedback.into(),
            detailed_feedback: None,
            rubric_scores: None,
            requires_manual_review: false,
        }
    }

    /// Zero-score result for a question the student did not answer.
    #[must_use]
    pub fn no_response(question_id: QuestionId, max_score: f64) -> Self {
        Self::scored(question_id, 0.0, max_score, false, NO_RESPONSE_FEEDBACK)
    }

    /// Zero-score result standing in for a failed grading attempt.
    #[must_use]
    pub fn grading_error(question_id: QuestionId, max_score: f64) -> Self {
        let mut result =
            Self::scored(question_id, 0.0, max_score, false, GRADING_ERROR_FEEDBACK);
        result.requires_manual_review = true;
        result
    }

    /// Zero-score placeholder for answers that need a human grader.
    #[must_use]
    pub fn manual_review(
        question_id: QuestionId,
        max_score: f64,
        feedback: impl Into<String>,
    ) -> Self {
        let mut result = Self::scored(question_id, 0.0, max_score, false, feedback);
        result.requires_manual_review = true;
        result
    }

    #[must_use]
    pub fn with_partial_credit(mut self, fraction: f64) -> Self {
        self.partial_credit = Some(fraction);
        self
    }

    #[must_use]
    pub fn with_detailed_feedback(mut self, detail: impl Into<String>) -> Self {
        self.detailed_feedback = Some(detail.into());
        self
    }

    /// True when this result records an unanswered question.
    #[must_use]
    pub fn is_unanswered(&self) -> bool {
        self.score == 0.0 && self.feedback == NO_RESPONSE_FEEDBACK
    }

    /// Percentage score for this question, 0 when no points were available.
    #[must_use]
    pub fn percentage(&self) -> f64 {
        if self.max_score > 0.0 {
            self.score / self.max_score * 100.0
        } else {
            0.0
        }
    }
}

/// Per-student insight derived from one graded submission.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LearningAnalytics {
    pub strengths: Vec<String>,
    pub weaknesses: Vec<String>,
    pub recommendations: Vec<String>,
    /// Mean percentage score per Bloom's level, over the levels present.
    pub blooms_performance: BTreeMap<BloomsLevel, f64>,
    /// Mean percentage score per difficulty band, over the bands present.
    pub difficulty_performance: BTreeMap<Difficulty, f64>,
}

/// A fully graded submission.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssessmentResult {
    pub submission_id: SubmissionId,
    pub student_id: StudentId,
    pub assessment_id: AssessmentId,
    /// One entry per assessment question, in assessment order.
    pub question_results: Vec<GradingResult>,
    pub overall_score: f64,
    pub max_score: f64,
    /// `overall_score / max_score * 100`, or 0 when no points were available.
    pub percentage: f64,
    pub passed: bool,
    pub analytics: LearningAnalytics,
    pub graded_at: DateTime<Utc>,
}

impl AssessmentResult {
    /// Assemble a result from per-question outcomes, computing the aggregate
    /// fields so they cannot drift from the underlying scores.
    #[must_use]
    pub fn from_question_results(
        submission_id: SubmissionId,
        student_id: StudentId,
        assessment_id: AssessmentId,
        question_results: Vec<GradingResult>,
        passing_threshold_pct: f64,
        analytics: LearningAnalytics,
    ) -> Self {
        let overall_score: f64 = question_results.iter().map(|r| r.score).sum();
        let max_score: f64 = question_results.iter().map(|r| r.max_score).sum();
        let percentage = if max_score > 0.0 {
            overall_score / max_score * 100.0
        } else {
            0.0
        };
        Self {
            submission_id,
            student_id,
            assessment_id,
            question_results,
            overall_score,
            max_score,
            percentage,
            passed: percentage >= passing_threshold_pct,
            analytics,
            graded_at: Utc::now(),
        }
    }

    /// Number of questions the student actually answered.
    #[must_use]
    pub fn answered_count(&self) -> usize {
        self.question_results
            .iter()
            .filter(|r| !r.is_unanswered())
            .count()
    }
}
