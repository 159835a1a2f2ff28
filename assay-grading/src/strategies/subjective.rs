//! Port-backed strategies for short answers, essays, and case studies.

use assay_core::{
    CaseStudyBody, EssayBody, GradingResult, Question, QuestionKind, ResponseValue, RubricCriterion,
    RubricScore, ShortAnswerBody,
};
use assay_genai::{GradeRequest, GradedResponse, with_timeout};

use crate::error::{GradingError, Result};

use super::StrategyContext;

/// Feedback used when the caller turned off AI grading for subjective kinds.
pub(crate) const AI_DISABLED_FEEDBACK: &str =
    "AI grading is disabled; this response requires manual grading";

pub(super) async fn grade_short_answer(
    ctx: &StrategyContext<'_>,
    question: &Question,
    body: &ShortAnswerBody,
    response: &ResponseValue,
) -> Result<GradingResult> {
    if !ctx.options.ai_grading_for_subjective {
        return Ok(manual_review(question));
    }
    let mut request = GradeRequest::new(
        question.kind().as_str(),
        question.text.clone(),
        response.to_text_lossy(),
        f64::from(question.points),
    )
    .with_sample_answer(body.sample_answer.clone());
    if !body.key_points.is_empty() {
        request = request.with_context(format!(
            "Key points to look for: {}",
            body.key_points.join("; ")
        ));
    }
    let graded = port_grade(ctx, request).await?;
    Ok(from_port_grade(question, graded))
}

pub(super) async fn grade_essay(
    ctx: &StrategyContext<'_>,
    question: &Question,
    body: &EssayBody,
    response: &ResponseValue,
) -> Result<GradingResult> {
    if !ctx.options.ai_grading_for_subjective {
        return Ok(manual_review(question));
    }
    let answer = response.to_text_lossy();

    let Some(rubric) = &body.rubric else {
        // Holistic grade when no rubric was attached.
        let mut request = GradeRequest::new(
            question.kind().as_str(),
            question.text.clone(),
            answer,
            f64::from(question.points),
        );
        if let Some(sample) = &body.sample_answer {
            request = request.with_sample_answer(sample.clone());
        }
        let graded = port_grade(ctx, request).await?;
        return Ok(from_port_grade(question, graded));
    };

    let mut rubric_scores = Vec::with_capacity(rubric.criteria.len());
    let mut total = 0.0;
    for criterion in &rubric.criteria {
        let criterion_max = f64::from(criterion.points);
        let mut request = GradeRequest::new(
            question.kind().as_str(),
            question.text.clone(),
            answer.clone(),
            criterion_max,
        )
        .with_context(criterion_context(criterion));
        if let Some(sample) = &body.sample_answer {
            request = request.with_sample_answer(sample.clone());
        }
        let graded = port_grade(ctx, request).await?;
        let score = graded.score.clamp(0.0, criterion_max);
        total += score;
        rubric_scores.push(RubricScore {
            criterion: criterion.name.clone(),
            score,
            max_score: criterion_max,
            comment: Some(graded.feedback),
        });
    }

    let max = f64::from(question.points);
    let rubric_total = f64::from(rubric.total_points);
    let ratio = if rubric_total > 0.0 {
        total / rubric_total
    } else {
        0.0
    };
    let detail = rubric_scores
        .iter()
        .map(|s| format!("{}: {}/{}", s.criterion, s.score, s.max_score))
        .collect::<Vec<_>>()
        .join("; ");
    let mut result = GradingResult::scored(
        question.id.clone(),
        total.min(max),
        max,
        ratio >= ctx.config.essay_pass_ratio,
        format!(
            "Scored {total} of {rubric_total} rubric points across {} criteria",
            rubric.criteria.len()
        ),
    );
    if ratio > 0.0 && ratio < 1.0 {
        result.partial_credit = Some(ratio);
    }
    result.detailed_feedback = Some(detail);
    result.rubric_scores = Some(rubric_scores);
    Ok(result)
}

pub(super) async fn grade_case_study(
    ctx: &StrategyContext<'_>,
    question: &Question,
    body: &CaseStudyBody,
    response: &ResponseValue,
) -> Result<GradingResult> {
    if !ctx.options.ai_grading_for_subjective {
        return Ok(manual_review(question));
    }
    let Some(answers) = response.as_sub_answers() else {
        return Err(GradingError::ResponseShape {
            kind: QuestionKind::CaseStudy,
        });
    };

    let mut total = 0.0;
    let mut parts = Vec::with_capacity(body.sub_questions.len());
    for sub in &body.sub_questions {
        let sub_max = f64::from(sub.points);
        match answers.get(&sub.id) {
            None => parts.push(format!("{}: 0/{} (no response)", sub.id, sub.points)),
            Some(answer) => {
                let request = GradeRequest::new(
                    question.kind().as_str(),
                    sub.text.clone(),
                    answer.clone(),
                    sub_max,
                )
                .with_sample_answer(sub.sample_answer.clone())
                .with_context(format!("Scenario: {}", body.scenario));
                let graded = port_grade(ctx, request).await?;
                let score = graded.score.clamp(0.0, sub_max);
                total += score;
                parts.push(format!("{}: {}/{}", sub.id, score, sub.points));
            }
        }
    }

    let max = f64::from(question.points);
    let score = total.min(max);
    let ratio = if max > 0.0 { score / max } else { 0.0 };
    let mut result = GradingResult::scored(
        question.id.clone(),
        score,
        max,
        ratio >= ctx.config.essay_pass_ratio,
        format!(
            "Scored {score} of {max} across {} sub-questions",
            body.sub_questions.len()
        ),
    );
    if ratio > 0.0 && ratio < 1.0 {
        result.partial_credit = Some(ratio);
    }
    result.detailed_feedback = Some(parts.join("; "));
    Ok(result)
}

async fn port_grade(ctx: &StrategyContext<'_>, request: GradeRequest) -> Result<GradedResponse> {
    let graded = with_timeout(
        ctx.config.port_timeout_seconds,
        ctx.generator.grade_response(request),
    )
    .await?;
    Ok(graded)
}

fn from_port_grade(question: &Question, graded: GradedResponse) -> GradingResult {
    let max = f64::from(question.points);
    let mut result = GradingResult::scored(
        question.id.clone(),
        graded.score.clamp(0.0, max),
        max,
        graded.is_correct,
        graded.feedback,
    );
    if let Some(partial) = graded.partial_credit {
        result.partial_credit = Some(partial.clamp(0.0, 1.0));
    }
    if let Some(improvement) = graded.improvement {
        result.detailed_feedback = Some(improvement);
    }
    result
}

fn manual_review(question: &Question) -> GradingResult {
    GradingResult::manual_review(
        question.id.clone(),
        f64::from(question.points),
        AI_DISABLED_FEEDBACK,
    )
}

fn criterion_context(criterion: &RubricCriterion) -> String {
    let mut context = format!("Criterion: {}. {}", criterion.name, criterion.description);
    if !criterion.levels.is_empty() {
        let levels = criterion
            .levels
            .iter()
            .map(|level| format!("{} = {}", level.score, level.description))
            .collect::<Vec<_>>()
            .join(", ");
        context.push_str(&format!(" Levels: {levels}"));
    }
    context
}
