//! Executor-backed strategy for coding challenges.

use assay_core::{CodingChallengeBody, GradingResult, Question, QuestionKind, ResponseValue};

use crate::error::{GradingError, Result};

use super::StrategyContext;

/// Runs the submitted code against the challenge's test cases and awards
/// credit proportional to the pass rate, rounded to a whole point.
pub(super) async fn grade_coding(
    ctx: &StrategyContext<'_>,
    question: &Question,
    body: &CodingChallengeBody,
    response: &ResponseValue,
) -> Result<GradingResult> {
    let Some(code) = response.as_text() else {
        return Err(GradingError::ResponseShape {
            kind: QuestionKind::CodingChallenge,
        });
    };
    let report = ctx.executor.execute(body, code).await?;

    let max = f64::from(question.points);
    let passed = report.passed_count();
    let total = report.total();
    let ratio = if total > 0 {
        passed as f64 / total as f64
    } else {
        0.0
    };
    let mut feedback = if total > 0 && report.all_passed() {
        format!("All {total} test cases passed")
    } else {
        format!("{passed} of {total} test cases passed")
    };
    if report.is_simulated() {
        feedback.push_str(" (simulated run)");
    }

    let mut result = GradingResult::scored(
        question.id.clone(),
        (max * ratio).round(),
        max,
        total > 0 && report.all_passed(),
        feedback,
    );
    if passed > 0 && passed < total {
        result.partial_credit = Some(ratio);
    }
    Ok(result)
}
