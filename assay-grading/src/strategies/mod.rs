//! Per-kind grading strategies.
//!
//! [`grade`] dispatches on the question body to exactly one strategy:
//!
//! - multiple choice, true/false, fill-in-blank: deterministic comparison,
//!   no port calls ([`objective`])
//! - short answer, essay, case study: scored through the content port
//!   ([`subjective`])
//! - coding challenge: scored from executor test outcomes ([`coding`])
//! - matching and ordering: zero-score placeholder flagged for manual
//!   grading
//!
//! Strategies return `Err` only for failures worth surfacing (port errors,
//! executor errors, response-shape mismatches); the engine converts those
//! into zero-score placeholder results so one bad question never sinks a
//! submission.

mod coding;
mod objective;
mod subjective;

use assay_core::{GradingResult, Question, QuestionBody, ResponseValue};
use assay_genai::ContentGenerator;

use crate::config::{GradingConfig, GradingOptions};
use crate::error::Result;
use crate::executor::CodeExecutor;

/// Shared dependencies passed to every strategy.
pub(crate) struct StrategyContext<'a> {
    pub generator: &'a dyn ContentGenerator,
    pub executor: &'a dyn CodeExecutor,
    pub config: &'a GradingConfig,
    pub options: &'a GradingOptions,
}

/// Grade one response with the strategy for its question kind.
pub(crate) async fn grade(
    ctx: &StrategyContext<'_>,
    question: &Question,
    response: &ResponseValue,
) -> Result<GradingResult> {
    match &question.body {
        QuestionBody::MultipleChoice(body) => {
            Ok(objective::grade_multiple_choice(question, body, response))
        }
        QuestionBody::TrueFalse(body) => Ok(objective::grade_true_false(question, body, response)),
        QuestionBody::FillInBlank(body) => Ok(objective::grade_fill_in_blank(
            question,
            body,
            response,
            ctx.options,
        )),
        QuestionBody::ShortAnswer(body) => {
            subjective::grade_short_answer(ctx, question, body, response).await
        }
        QuestionBody::Essay(body) => subjective::grade_essay(ctx, question, body, response).await,
        QuestionBody::CodingChallenge(body) => {
            coding::grade_coding(ctx, question, body, response).await
        }
        QuestionBody::Matching(_) | QuestionBody::Ordering(_) => {
            Ok(manual_review_placeholder(question))
        }
        QuestionBody::CaseStudy(body) => {
            subjective::grade_case_study(ctx, question, body, response).await
        }
    }
}

fn manual_review_placeholder(question: &Question) -> GradingResult {
    GradingResult::manual_review(
        question.id.clone(),
        f64::from(question.points),
        format!(
            "Automated grading is not supported for {} questions; this response requires manual grading",
            question.kind()
        ),
    )
}
