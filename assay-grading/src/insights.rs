//! Per-student learning analytics derived from one graded submission.
//!
//! Performance breakdowns are computed locally from the graded results.
//! The narrative parts (strengths, weaknesses, recommendations) come from
//! the content port; when that call fails the analytics fall back to
//! neutral placeholder text rather than failing the whole grading run.

use std::collections::BTreeMap;
use std::fmt::Display;

use assay_core::{GradingResult, LearningAnalytics, Question, StudentId};
use assay_genai::{
    ContentGenerator, ContentGeneratorExt, GenerationRequest, PromptTemplate, VariableMap,
    with_timeout,
};
use serde::Deserialize;
use tracing::warn;

use crate::config::GradingConfig;

/// Strength recorded when the insight call fails.
pub const FALLBACK_STRENGTH: &str = "Completed the assessment";

/// Weakness recorded when the insight call fails.
pub const FALLBACK_WEAKNESS: &str = "Detailed analysis unavailable";

/// Recommendation recorded when the insight call fails.
pub const FALLBACK_RECOMMENDATION: &str = "Review the material for the questions you missed";

const INSIGHTS_TEMPLATE: &str = "\
You are reviewing one student's graded assessment.

Performance by Bloom's level: {{blooms}}
Performance by difficulty: {{difficulty}}
Questions answered: {{answered}} of {{total}}

Reply with a JSON object holding three string arrays: \"strengths\",
\"weaknesses\", and \"recommendations\". List at most three entries each,
phrased directly to the student.";

#[derive(Debug, Deserialize)]
struct InsightReply {
    #[serde(default)]
    strengths: Vec<String>,
    #[serde(default)]
    weaknesses: Vec<String>,
    #[serde(default)]
    recommendations: Vec<String>,
}

/// Build the [`LearningAnalytics`] for one graded submission.
pub(crate) async fn learning_analytics(
    generator: &dyn ContentGenerator,
    config: &GradingConfig,
    questions: &[Question],
    results: &[GradingResult],
    student_id: &StudentId,
) -> LearningAnalytics {
    let (blooms_performance, difficulty_performance) = performance_profile(questions, results);
    let answered = results.iter().filter(|r| !r.is_unanswered()).count();

    let variables = VariableMap::new()
        .with("blooms", format_performance(&blooms_performance))
        .with("difficulty", format_performance(&difficulty_performance))
        .with("answered", answered)
        .with("total", results.len());
    let request = GenerationRequest::new(PromptTemplate::new(
        "learning-insights",
        INSIGHTS_TEMPLATE,
    ))
    .with_variables(variables);

    match with_timeout(
        config.port_timeout_seconds,
        generator.generate_as::<InsightReply>(request),
    )
    .await
    {
        Ok(reply) => LearningAnalytics {
            strengths: reply.strengths,
            weaknesses: reply.weaknesses,
            recommendations: reply.recommendations,
            blooms_performance,
            difficulty_performance,
        },
        Err(error) => {
            warn!(
                student_id = %student_id,
                error = %error,
                "learning insights unavailable, using fallback text"
            );
            LearningAnalytics {
                strengths: vec![FALLBACK_STRENGTH.to_string()],
                weaknesses: vec![FALLBACK_WEAKNESS.to_string()],
                recommendations: vec![FALLBACK_RECOMMENDATION.to_string()],
                blooms_performance,
                difficulty_performance,
            }
        }
    }
}

/// Mean percentage score per Bloom's level and per difficulty band, over
/// the levels and bands actually present in the assessment.
fn performance_profile(
    questions: &[Question],
    results: &[GradingResult],
) -> (
    BTreeMap<assay_core::BloomsLevel, f64>,
    BTreeMap<assay_core::Difficulty, f64>,
) {
    let mut blooms: BTreeMap<assay_core::BloomsLevel, (f64, usize)> = BTreeMap::new();
    let mut difficulty: BTreeMap<assay_core::Difficulty, (f64, usize)> = BTreeMap::new();
    for result in results {
        let Some(question) = questions.iter().find(|q| q.id == result.question_id) else {
            continue;
        };
        let pct = result.percentage();
        let blooms_entry = blooms.entry(question.blooms_level).or_insert((0.0, 0));
        blooms_entry.0 += pct;
        blooms_entry.1 += 1;
        let difficulty_entry = difficulty.entry(question.difficulty).or_insert((0.0, 0));
        difficulty_entry.0 += pct;
        difficulty_entry.1 += 1;
    }
    (mean_of(blooms), mean_of(difficulty))
}

fn mean_of<K: Ord>(sums: BTreeMap<K, (f64, usize)>) -> BTreeMap<K, f64> {
    sums.into_iter()
        .map(|(key, (sum, count))| (key, sum / count as f64))
        .collect()
}

fn format_performance<K: Display>(performance: &BTreeMap<K, f64>) -> String {
    if performance.is_empty() {
        return "no data".to_string();
    }
    performance
        .iter()
        .map(|(key, pct)| format!("{key}: {pct:.0}%"))
        .collect::<Vec<_>>()
        .join(", ")
}
