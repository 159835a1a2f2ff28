//! Deterministic strategies: exact comparison plus similarity-based partial
//! credit. These never touch the port, so the same response always earns the
//! same score.

use assay_core::{
    FillInBlankBody, GradingResult, MultipleChoiceBody, Question, ResponseValue, TrueFalseBody,
};

use crate::config::GradingOptions;
use crate::similarity;

pub(super) fn grade_multiple_choice(
    question: &Question,
    body: &MultipleChoiceBody,
    response: &ResponseValue,
) -> GradingResult {
    let correct = response.as_text() == Some(body.correct_answer.as_str());
    graded(question, correct, body.explanation.as_deref())
}

pub(super) fn grade_true_false(
    question: &Question,
    body: &TrueFalseBody,
    response: &ResponseValue,
) -> GradingResult {
    let correct = response.as_bool() == Some(body.correct_answer);
    graded(question, correct, body.explanation.as_deref())
}

fn graded(question: &Question, correct: bool, explanation: Option<&str>) -> GradingResult {
    let max = f64::from(question.points);
    let mut feedback = String::from(if correct { "Correct" } else { "Incorrect" });
    if let Some(explanation) = explanation {
        feedback.push_str(". ");
        feedback.push_str(explanation);
    }
    GradingResult::scored(
        question.id.clone(),
        if correct { max } else { 0.0 },
        max,
        correct,
        feedback,
    )
}

pub(super) fn grade_fill_in_blank(
    question: &Question,
    body: &FillInBlankBody,
    response: &ResponseValue,
    options: &GradingOptions,
) -> GradingResult {
    let max = f64::from(question.points);
    let Some(answer) = response.as_text() else {
        return GradingResult::scored(question.id.clone(), 0.0, max, false, "Incorrect");
    };

    let matched = body.correct_answers.iter().any(|accepted| {
        if body.case_sensitive {
            accepted == answer
        } else {
            accepted.to_lowercase() == answer.to_lowercase()
        }
    });
    if matched {
        return GradingResult::scored(question.id.clone(), max, max, true, "Correct");
    }

    if options.allow_partial_credit && body.allow_partial_credit {
        let ratio = body
            .correct_answers
            .iter()
            .map(|accepted| {
                if body.case_sensitive {
                    similarity::char_ratio(answer, accepted)
                } else {
                    similarity::char_ratio(&answer.to_lowercase(), &accepted.to_lowercase())
                }
            })
            .fold(0.0_f64, f64::max);
        let score = (max * ratio).floor();
        if score > 0.0 {
            return GradingResult::scored(
                question.id.clone(),
                score,
                max,
                false,
                "Partially correct",
            )
            .with_partial_credit(ratio);
        }
    }

    GradingResult::scored(question.id.clone(), 0.0, max, false, "Incorrect")
}
