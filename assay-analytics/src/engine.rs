//! The analytics engine.
//!
//! [`AnalyticsEngine::generate_report`] is infallible: the aggregates are
//! pure functions of the graded results, and the narrative parts degrade
//! to documented fallbacks when the port is unavailable.

use std::sync::Arc;

use chrono::Utc;
use serde::Deserialize;
use tracing::{info, warn};

use assay_core::Question;
use assay_genai::{
    ContentGenerator, ContentGeneratorExt, GenerationRequest, PromptTemplate, VariableMap,
    with_timeout,
};

use crate::config::AnalyticsConfig;
use crate::optimize::OptimizationSuggestion;
use crate::report::{
    AnalyticsReport, AnalyticsRequest, QuestionAnalytics, ReportInsights, ReportSummary,
};

/// Recommendation recorded when the port cannot produce one.
pub const REPORT_FALLBACK_RECOMMENDATION: &str =
    "Recommendations are unavailable; review the question analytics directly";

const RECOMMENDATIONS_TEMPLATE: &str = "\
An assessment cohort finished with these aggregates.

Submissions: {{submissions}}
Average score: {{average}}%
Median score: {{median}}%
Pass rate: {{pass_rate}}%
Completion rate: {{completion}}%
Flagged questions: {{flagged}}

Reply with a JSON object holding a \"recommendations\" array of strings:
up to four concrete changes the instructor should make next.";

const FORECAST_TEMPLATE: &str = "\
Given one cohort's aggregates, forecast how the next cohort is likely to
perform on the same assessment.

Average score: {{average}}%
Pass rate: {{pass_rate}}%
Completion rate: {{completion}}%

Reply with a JSON object holding a single \"forecast\" string of one or
two sentences.";

const OPTIMIZATION_TEMPLATE: &str = "\
A question needs revision based on cohort performance.

Question: {{text}}
Kind: {{kind}}
Points: {{points}}
Flag: {{flag}}
Proportion answered correctly: {{difficulty_index}}
Average score among attempts: {{average}}%

Reply with a JSON object holding \"priority\" (\"low\", \"medium\" or
\"high\"), \"action\" (an object whose \"kind\" is \"rewrite_text\" with
\"text\", \"adjust_points\" with \"points\", or \"retire\"), and a short
\"rationale\".";

#[derive(Debug, Deserialize)]
struct RecommendationReply {
    #[serde(default)]
    recommendations: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct ForecastReply {
    forecast: String,
}

#[derive(Debug, Deserialize)]
struct SuggestionReply {
    priority: crate::optimize::Priority,
    action: crate::optimize::OptimizationAction,
    rationale: String,
}

/// Aggregates graded results into reports and optimization suggestions.
pub struct AnalyticsEngine {
    generator: Arc<dyn ContentGenerator>,
    config: AnalyticsConfig,
}

impl AnalyticsEngine {
    #[must_use]
    pub fn new(generator: Arc<dyn ContentGenerator>, config: AnalyticsConfig) -> Self {
        Self { generator, config }
    }

    #[must_use]
    pub fn config(&self) -> &AnalyticsConfig {
        &self.config
    }

    /// Build the full report for one assessment's graded results.
    ///
    /// With no results the report is zeroed and no port call is made.
    pub async fn generate_report(&self, request: AnalyticsRequest) -> AnalyticsReport {
        info!(
            assessment_id = %request.assessment_id,
            submissions = request.results.len(),
            "generating analytics report"
        );

        let summary = ReportSummary::for_results(&request.results);
        let question_analytics: Vec<QuestionAnalytics> = request
            .questions
            .iter()
            .map(|question| QuestionAnalytics::for_question(question, &request.results, &self.config))
            .collect();

        let mut insights = ReportInsights::default();
        if !request.results.is_empty() {
            if request.include_recommendations {
                insights.recommendations =
                    self.recommendations(&summary, &question_analytics).await;
            }
            if request.include_predictive {
                insights.predicted_outcomes = self.forecast(&summary).await;
            }
        }

        AnalyticsReport {
            assessment_id: request.assessment_id,
            summary,
            question_analytics,
            insights,
            generated_at: Utc::now(),
        }
    }

    /// Ask the port for a revision of every flagged question.
    ///
    /// Best-effort: a failed or degenerate suggestion is dropped with a
    /// warning, never surfaced as an error.
    pub async fn suggest_optimizations(
        &self,
        questions: &[Question],
        report: &AnalyticsReport,
    ) -> Vec<OptimizationSuggestion> {
        let mut suggestions = Vec::new();
        for analytics in report.flagged() {
            let Some(question) = questions.iter().find(|q| q.id == analytics.question_id) else {
                continue;
            };
            match self.suggest_for(question, analytics).await {
                Ok(suggestion) if suggestion.action.is_actionable() => {
                    suggestions.push(suggestion);
                }
                Ok(_) => {
                    warn!(
                        question_id = %question.id,
                        "dropping unusable optimization suggestion"
                    );
                }
                Err(error) => {
                    warn!(
                        question_id = %question.id,
                        error = %error,
                        "optimization suggestion failed"
                    );
                }
            }
        }
        suggestions
    }

    async fn recommendations(
        &self,
        summary: &ReportSummary,
        question_analytics: &[QuestionAnalytics],
    ) -> Vec<String> {
        let variables = VariableMap::new()
            .with("submissions", summary.total_submissions)
            .with("average", format!("{:.1}", summary.average_score))
            .with("median", format!("{:.1}", summary.median_score))
            .with("pass_rate", format!("{:.1}", summary.pass_rate))
            .with("completion", format!("{:.1}", summary.completion_rate))
            .with("flagged", flagged_summary(question_analytics));
        let request = GenerationRequest::new(PromptTemplate::new(
            "analytics-recommendations",
            RECOMMENDATIONS_TEMPLATE,
        ))
        .with_variables(variables);

        match with_timeout(
            self.config.port_timeout_seconds,
            self.generator.generate_as::<RecommendationReply>(request),
        )
        .await
        {
            Ok(reply) => reply.recommendations,
            Err(error) => {
                warn!(error = %error, "report recommendations unavailable, using fallback");
                vec![REPORT_FALLBACK_RECOMMENDATION.to_string()]
            }
        }
    }

    async fn forecast(&self, summary: &ReportSummary) -> Option<String> {
        let variables = VariableMap::new()
            .with("average", format!("{:.1}", summary.average_score))
            .with("pass_rate", format!("{:.1}", summary.pass_rate))
            .with("completion", format!("{:.1}", summary.completion_rate));
        let request =
            GenerationRequest::new(PromptTemplate::new("analytics-forecast", FORECAST_TEMPLATE))
                .with_variables(variables);

        match with_timeout(
            self.config.port_timeout_seconds,
            self.generator.generate_as::<ForecastReply>(request),
        )
        .await
        {
            Ok(reply) => Some(reply.forecast),
            Err(error) => {
                warn!(error = %error, "predictive outcomes unavailable");
                None
            }
        }
    }

    async fn suggest_for(
        &self,
        question: &Question,
        analytics: &QuestionAnalytics,
    ) -> assay_genai::Result<OptimizationSuggestion> {
        let flag = analytics
            .flag
            .map_or_else(|| "none".to_string(), |f| f.to_string());
        let variables = VariableMap::new()
            .with("text", question.text.clone())
            .with("kind", question.kind().as_str())
            .with("points", question.points)
            .with("flag", flag)
            .with(
                "difficulty_index",
                format!("{:.2}", analytics.difficulty_index),
            )
            .with("average", format!("{:.1}", analytics.average_score_pct));
        let request = GenerationRequest::new(PromptTemplate::new(
            "question-optimization",
            OPTIMIZATION_TEMPLATE,
        ))
        .with_variables(variables);

        let reply: SuggestionReply = with_timeout(
            self.config.port_timeout_seconds,
            self.generator.generate_as(request),
        )
        .await?;
        Ok(OptimizationSuggestion {
            question_id: question.id.clone(),
            priority: reply.priority,
            action: reply.action,
            rationale: reply.rationale,
        })
    }
}

fn flagged_summary(question_analytics: &[QuestionAnalytics]) -> String {
    let flagged: Vec<String> = question_analytics
        .iter()
        .filter_map(|qa| {
            qa.flag.map(|flag| {
                format!(
                    "{} {} ({:.0}% correct)",
                    qa.question_id,
                    flag,
                    qa.difficulty_index * 100.0
                )
            })
        })
        .collect();
    if flagged.is_empty() {
        "none".to_string()
    } else {
        flagged.join("; ")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assay_core::{
        AssessmentId, AssessmentResult, BloomsLevel, Difficulty, GradingResult, LearningAnalytics,
        QuestionBody, QuestionId, StudentId, SubmissionId, TrueFalseBody,
    };
    use assay_genai::MockGenerator;
    use serde_json::json;

    use crate::optimize::{OptimizationAction, Priority};
    use crate::report::QuestionFlag;

    fn question(id: &str) -> Question {
        Question {
            id: QuestionId::from(id),
            text: "A cache hit avoids recomputation.".into(),
            points: 10,
            difficulty: Difficulty::Easy,
            blooms_level: BloomsLevel::Remember,
            time_estimate_minutes: 1,
            body: QuestionBody::TrueFalse(TrueFalseBody {
                correct_answer: true,
                explanation: None,
            }),
        }
    }

    fn result_of(sub: &str, entries: Vec<GradingResult>) -> AssessmentResult {
        AssessmentResult::from_question_results(
            SubmissionId::from(sub),
            StudentId::from("student-1"),
            AssessmentId::new(),
            entries,
            60.0,
            LearningAnalytics::default(),
        )
    }

    fn scored(id: &str, score: f64, max: f64) -> GradingResult {
        GradingResult::scored(QuestionId::from(id), score, max, score == max, "graded")
    }

    fn engine(generator: Arc<MockGenerator>) -> AnalyticsEngine {
        AnalyticsEngine::new(generator, AnalyticsConfig::default())
    }

    fn flagged_analytics(id: &str, flag: Option<QuestionFlag>) -> QuestionAnalytics {
        QuestionAnalytics {
            question_id: QuestionId::from(id),
            attempts: 4,
            correct_count: 1,
            difficulty_index: 0.25,
            average_score_pct: 30.0,
            flag,
        }
    }

    fn report_with(question_analytics: Vec<QuestionAnalytics>) -> AnalyticsReport {
        AnalyticsReport {
            assessment_id: AssessmentId::new(),
            summary: ReportSummary::for_results(&[]),
            question_analytics,
            insights: ReportInsights::default(),
            generated_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn report_carries_port_recommendations() {
        let generator = Arc::new(MockGenerator::new());
        generator.push_generation(json!({
            "recommendations": ["Add a worked example before q1"]
        }));
        let engine = engine(generator.clone());

        let request = AnalyticsRequest::new(
            AssessmentId::new(),
            vec![question("q1")],
            vec![
                result_of("sub-1", vec![scored("q1", 10.0, 10.0)]),
                result_of("sub-2", vec![scored("q1", 2.0, 10.0)]),
            ],
        );
        let report = engine.generate_report(request).await;

        assert_eq!(
            report.insights.recommendations,
            vec!["Add a worked example before q1"]
        );
        assert!(report.insights.predicted_outcomes.is_none());
        assert_eq!(report.summary.total_submissions, 2);
        assert_eq!(generator.generation_calls(), 1);
    }

    #[tokio::test]
    async fn recommendations_fall_back_when_the_port_fails() {
        let generator = Arc::new(MockGenerator::new());
        let engine = engine(generator);

        let request = AnalyticsRequest::new(
            AssessmentId::new(),
            vec![question("q1")],
            vec![result_of("sub-1", vec![scored("q1", 10.0, 10.0)])],
        );
        let report = engine.generate_report(request).await;

        assert_eq!(
            report.insights.recommendations,
            vec![REPORT_FALLBACK_RECOMMENDATION]
        );
    }

    #[tokio::test]
    async fn forecast_is_absent_when_the_port_fails() {
        let generator = Arc::new(MockGenerator::new());
        let engine = engine(generator.clone());

        let request = AnalyticsRequest::new(
            AssessmentId::new(),
            vec![question("q1")],
            vec![result_of("sub-1", vec![scored("q1", 10.0, 10.0)])],
        )
        .with_recommendations(false)
        .with_predictive(true);
        let report = engine.generate_report(request).await;
        assert!(report.insights.predicted_outcomes.is_none());

        generator.push_generation(json!({
            "forecast": "Scores should rise once q1 is reworded."
        }));
        let request = AnalyticsRequest::new(
            AssessmentId::new(),
            vec![question("q1")],
            vec![result_of("sub-1", vec![scored("q1", 10.0, 10.0)])],
        )
        .with_recommendations(false)
        .with_predictive(true);
        let report = engine.generate_report(request).await;
        assert_eq!(
            report.insights.predicted_outcomes.as_deref(),
            Some("Scores should rise once q1 is reworded.")
        );
    }

    #[tokio::test]
    async fn empty_results_skip_the_port_entirely() {
        let generator = Arc::new(MockGenerator::new());
        let engine = engine(generator.clone());

        let request =
            AnalyticsRequest::new(AssessmentId::new(), vec![question("q1")], vec![])
                .with_predictive(true);
        let report = engine.generate_report(request).await;

        assert_eq!(report.summary.total_submissions, 0);
        assert!(report.insights.recommendations.is_empty());
        assert!(report.insights.predicted_outcomes.is_none());
        assert_eq!(generator.generation_calls(), 0);
    }

    #[tokio::test]
    async fn recommendation_prompt_names_flagged_questions() {
        let generator = Arc::new(MockGenerator::new());
        generator.push_generation(json!({ "recommendations": [] }));
        let engine = engine(generator.clone());

        // One of four correct: q1 comes out flagged too hard.
        let results: Vec<AssessmentResult> = (0..4)
            .map(|n| {
                result_of(
                    &format!("sub-{n}"),
                    vec![scored("q1", if n == 0 { 10.0 } else { 0.0 }, 10.0)],
                )
            })
            .collect();
        let request = AnalyticsRequest::new(AssessmentId::new(), vec![question("q1")], results);
        engine.generate_report(request).await;

        let prompt = generator.last_prompt().unwrap();
        assert!(prompt.contains("q1 too_hard (25% correct)"));
    }

    #[tokio::test]
    async fn optimizations_cover_flagged_questions_only() {
        let generator = Arc::new(MockGenerator::new());
        generator.push_generation(json!({
            "priority": "high",
            "action": { "kind": "rewrite_text", "text": "Which cache level is checked first?" },
            "rationale": "Only a quarter of students parsed the original wording."
        }));
        let engine = engine(generator.clone());

        let questions = vec![question("q1"), question("q2")];
        let report = report_with(vec![
            flagged_analytics("q1", Some(QuestionFlag::TooHard)),
            flagged_analytics("q2", None),
        ]);
        let suggestions = engine.suggest_optimizations(&questions, &report).await;

        assert_eq!(suggestions.len(), 1);
        assert_eq!(suggestions[0].question_id, QuestionId::from("q1"));
        assert_eq!(suggestions[0].priority, Priority::High);
        assert!(matches!(
            suggestions[0].action,
            OptimizationAction::RewriteText { .. }
        ));
        assert_eq!(generator.generation_calls(), 1);
    }

    #[tokio::test]
    async fn failed_and_degenerate_suggestions_are_dropped() {
        let generator = Arc::new(MockGenerator::new());
        // First flagged question gets a blank rewrite; the second gets no
        // scripted reply at all.
        generator.push_generation(json!({
            "priority": "high",
            "action": { "kind": "rewrite_text", "text": "   " },
            "rationale": "Needs rewording."
        }));
        let engine = engine(generator.clone());

        let questions = vec![question("q1"), question("q2")];
        let report = report_with(vec![
            flagged_analytics("q1", Some(QuestionFlag::TooHard)),
            flagged_analytics("q2", Some(QuestionFlag::TooEasy)),
        ]);
        let suggestions = engine.suggest_optimizations(&questions, &report).await;

        assert!(suggestions.is_empty());
        assert_eq!(generator.generation_calls(), 2);
    }

    #[tokio::test]
    async fn suggestions_for_unknown_questions_are_skipped() {
        let generator = Arc::new(MockGenerator::new());
        let engine = engine(generator.clone());

        let report = report_with(vec![flagged_analytics(
            "ghost",
            Some(QuestionFlag::TooHard),
        )]);
        let suggestions = engine.suggest_optimizations(&[], &report).await;

        assert!(suggestions.is_empty());
        assert_eq!(generator.generation_calls(), 0);
    }
}
