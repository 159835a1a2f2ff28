//! Report types and the deterministic aggregation behind them.
//!
//! Everything in [`ReportSummary`] and [`QuestionAnalytics`] is a pure
//! function of the graded results; the narrative [`ReportInsights`] parts
//! are filled in by the engine, best-effort.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use assay_core::{AssessmentId, AssessmentResult, Question, QuestionId};

use crate::config::AnalyticsConfig;

fn default_true() -> bool {
    true
}

/// What to analyze and which narrative extras to include.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalyticsRequest {
    pub assessment_id: AssessmentId,
    pub questions: Vec<Question>,
    pub results: Vec<AssessmentResult>,
    #[serde(default = "default_true")]
    pub include_recommendations: bool,
    #[serde(default)]
    pub include_predictive: bool,
}

impl AnalyticsRequest {
    /// Request with recommendations on and predictive outcomes off.
    #[must_use]
    pub fn new(
        assessment_id: AssessmentId,
        questions: Vec<Question>,
        results: Vec<AssessmentResult>,
    ) -> Self {
        Self {
            assessment_id,
            questions,
            results,
            include_recommendations: true,
            include_predictive: false,
        }
    }

    #[must_use]
    pub fn with_recommendations(mut self, include: bool) -> Self {
        self.include_recommendations = include;
        self
    }

    #[must_use]
    pub fn with_predictive(mut self, include: bool) -> Self {
        self.include_predictive = include;
        self
    }
}

/// Cohort-level score aggregates. All score fields are percentages.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportSummary {
    pub total_submissions: usize,
    pub average_score: f64,
    pub median_score: f64,
    pub highest_score: f64,
    pub lowest_score: f64,
    /// Percentage of submissions that passed.
    pub pass_rate: f64,
    /// Mean percentage of assessment questions answered per submission.
    pub completion_rate: f64,
}

impl ReportSummary {
    /// Aggregate the graded results. An empty slice yields a zeroed summary.
    #[must_use]
    pub fn for_results(results: &[AssessmentResult]) -> Self {
        if results.is_empty() {
            return Self {
                total_submissions: 0,
                average_score: 0.0,
                median_score: 0.0,
                highest_score: 0.0,
                lowest_score: 0.0,
                pass_rate: 0.0,
                completion_rate: 0.0,
            };
        }

        let total = results.len();
        let mut percentages: Vec<f64> = results.iter().map(|r| r.percentage).collect();
        percentages.sort_by(f64::total_cmp);

        let passed = results.iter().filter(|r| r.passed).count();
        let completion_sum: f64 = results.iter().map(completion_of).sum();

        Self {
            total_submissions: total,
            average_score: percentages.iter().sum::<f64>() / total as f64,
            median_score: median_of_sorted(&percentages),
            highest_score: percentages.last().copied().unwrap_or(0.0),
            lowest_score: percentages.first().copied().unwrap_or(0.0),
            pass_rate: passed as f64 / total as f64 * 100.0,
            completion_rate: completion_sum / total as f64,
        }
    }
}

fn completion_of(result: &AssessmentResult) -> f64 {
    let total = result.question_results.len();
    if total == 0 {
        return 0.0;
    }
    result.answered_count() as f64 / total as f64 * 100.0
}

fn median_of_sorted(sorted: &[f64]) -> f64 {
    let n = sorted.len();
    if n == 0 {
        0.0
    } else if n % 2 == 1 {
        sorted[n / 2]
    } else {
        (sorted[n / 2 - 1] + sorted[n / 2]) / 2.0
    }
}

/// Why a question was flagged for review.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QuestionFlag {
    /// Difficulty index below the hard threshold.
    TooHard,
    /// Difficulty index above the easy threshold.
    TooEasy,
}

impl QuestionFlag {
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            QuestionFlag::TooHard => "too_hard",
            QuestionFlag::TooEasy => "too_easy",
        }
    }
}

impl fmt::Display for QuestionFlag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Per-question statistics across all graded submissions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuestionAnalytics {
    pub question_id: QuestionId,
    /// Submissions that answered this question.
    pub attempts: usize,
    pub correct_count: usize,
    /// Proportion of attempts answered correctly, 0 to 1. Zero when nobody
    /// attempted the question.
    pub difficulty_index: f64,
    /// Mean percentage score over attempts.
    pub average_score_pct: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub flag: Option<QuestionFlag>,
}

impl QuestionAnalytics {
    /// Statistics for one question over the graded results. Unanswered
    /// entries count toward neither attempts nor the averages, and a
    /// question nobody attempted is never flagged.
    #[must_use]
    pub fn for_question(
        question: &Question,
        results: &[AssessmentResult],
        config: &AnalyticsConfig,
    ) -> Self {
        let mut attempts = 0usize;
        let mut correct_count = 0usize;
        let mut score_sum = 0.0;
        for result in results {
            let Some(entry) = result
                .question_results
                .iter()
                .find(|r| r.question_id == question.id)
            else {
                continue;
            };
            if entry.is_unanswered() {
                continue;
            }
            attempts += 1;
            if entry.is_correct {
                correct_count += 1;
            }
            score_sum += entry.percentage();
        }

        let difficulty_index = if attempts > 0 {
            correct_count as f64 / attempts as f64
        } else {
            0.0
        };
        let average_score_pct = if attempts > 0 {
            score_sum / attempts as f64
        } else {
            0.0
        };
        let flag = if attempts == 0 {
            None
        } else if difficulty_index < config.hard_question_threshold {
            Some(QuestionFlag::TooHard)
        } else if difficulty_index > config.easy_question_threshold {
            Some(QuestionFlag::TooEasy)
        } else {
            None
        };

        Self {
            question_id: question.id.clone(),
            attempts,
            correct_count,
            difficulty_index,
            average_score_pct,
            flag,
        }
    }
}

/// Narrative extras attached to a report. Best-effort: failures leave
/// documented fallbacks or absence, never an error.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ReportInsights {
    pub recommendations: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub predicted_outcomes: Option<String>,
}

/// The full analytics report for one assessment.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalyticsReport {
    pub assessment_id: AssessmentId,
    pub summary: ReportSummary,
    /// One entry per assessment question, in assessment order.
    pub question_analytics: Vec<QuestionAnalytics>,
    pub insights: ReportInsights,
    pub generated_at: DateTime<Utc>,
}

impl AnalyticsReport {
    /// Analytics entry for one question, when the report covers it.
    #[must_use]
    pub fn analytics_for(&self, question_id: &QuestionId) -> Option<&QuestionAnalytics> {
        self.question_analytics
            .iter()
            .find(|qa| &qa.question_id == question_id)
    }

    /// Entries flagged as too hard or too easy.
    pub fn flagged(&self) -> impl Iterator<Item = &QuestionAnalytics> {
        self.question_analytics.iter().filter(|qa| qa.flag.is_some())
    }
}
