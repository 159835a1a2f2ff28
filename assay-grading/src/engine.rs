//! The grading engine.
//!
//! [`GradingEngine`] turns submissions into [`AssessmentResult`]s. Batches
//! are graded in windows of `concurrency` submissions with a configurable
//! pause between windows, keeping port load bounded on large classes. A
//! submission that cannot be graded is recorded as a batch error; a single
//! question whose strategy fails becomes a zero-score placeholder flagged
//! for manual review. Neither aborts the batch.

use std::sync::Arc;
use std::time::Duration;

use futures::future::join_all;
use serde::{Deserialize, Serialize};
use tokio::time::{Instant, sleep};
use tracing::{info, warn};

use assay_core::{
    AssessmentId, AssessmentResult, GradingResult, Question, ResponseValue, StudentSubmission,
    SubmissionId,
};
use assay_genai::ContentGenerator;

use crate::config::{GradingConfig, GradingOptions};
use crate::error::{GradingError, Result};
use crate::executor::{CodeExecutor, SimulatedExecutor};
use crate::insights;
use crate::strategies::{self, StrategyContext};

/// A batch of submissions to grade against one assessment's questions.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchGradingRequest {
    pub assessment_id: AssessmentId,
    pub questions: Vec<Question>,
    pub submissions: Vec<StudentSubmission>,
    #[serde(default)]
    pub options: GradingOptions,
}

impl BatchGradingRequest {
    #[must_use]
    pub fn new(
        assessment_id: AssessmentId,
        questions: Vec<Question>,
        submissions: Vec<StudentSubmission>,
    ) -> Self {
        Self {
            assessment_id,
            questions,
            submissions,
            options: GradingOptions::default(),
        }
    }

    #[must_use]
    pub fn with_options(mut self, options: GradingOptions) -> Self {
        self.options = options;
        self
    }
}

/// One submission the batch could not grade.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchError {
    pub submission_id: SubmissionId,
    pub message: String,
}

/// Bookkeeping for one graded batch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchMetadata {
    pub total_submissions: usize,
    pub successfully_graded: usize,
    /// Mean wall-clock grading time per graded submission.
    pub average_grading_time_ms: f64,
    pub errors: Vec<BatchError>,
}

/// Everything a graded batch produced.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchGradingResult {
    /// One entry per successfully graded submission, in batch order.
    pub results: Vec<AssessmentResult>,
    pub metadata: BatchMetadata,
}

/// Grades submissions using per-kind strategies.
pub struct GradingEngine {
    generator: Arc<dyn ContentGenerator>,
    executor: Arc<dyn CodeExecutor>,
    config: GradingConfig,
}

impl GradingEngine {
    #[must_use]
    pub fn new(
        generator: Arc<dyn ContentGenerator>,
        executor: Arc<dyn CodeExecutor>,
        config: GradingConfig,
    ) -> Self {
        Self {
            generator,
            executor,
            config,
        }
    }

    /// Engine backed by the stand-in code executor, for deployments without
    /// a sandbox.
    #[must_use]
    pub fn with_simulated_executor(
        generator: Arc<dyn ContentGenerator>,
        config: GradingConfig,
    ) -> Self {
        Self::new(generator, Arc::new(SimulatedExecutor::default()), config)
    }

    #[must_use]
    pub fn config(&self) -> &GradingConfig {
        &self.config
    }

    /// Grade every submission in the batch.
    ///
    /// Submissions are processed `concurrency` at a time, with
    /// `window_delay_ms` of idle time between windows. Failures are
    /// collected into [`BatchMetadata::errors`] rather than aborting.
    pub async fn grade_batch(&self, request: BatchGradingRequest) -> BatchGradingResult {
        let total = request.submissions.len();
        info!(
            assessment_id = %request.assessment_id,
            submissions = total,
            "grading batch"
        );

        let window_size = self.config.concurrency.max(1);
        let window_count = total.div_ceil(window_size);
        let mut results = Vec::with_capacity(total);
        let mut errors = Vec::new();
        let mut total_time_ms = 0.0;

        for (window_index, window) in request.submissions.chunks(window_size).enumerate() {
            let graded = join_all(window.iter().map(|submission| {
                let questions = &request.questions;
                let options = &request.options;
                async move {
                    let started = Instant::now();
                    let outcome = self.grade_submission(questions, submission, options).await;
                    (submission.submission_id.clone(), started.elapsed(), outcome)
                }
            }))
            .await;

            for (submission_id, elapsed, outcome) in graded {
                match outcome {
                    Ok(result) => {
                        total_time_ms += elapsed.as_secs_f64() * 1000.0;
                        results.push(result);
                    }
                    Err(error) => {
                        warn!(
                            submission_id = %submission_id,
                            error = %error,
                            "failed to grade submission"
                        );
                        errors.push(BatchError {
                            submission_id,
                            message: error.to_string(),
                        });
                    }
                }
            }

            if window_index + 1 < window_count && self.config.window_delay_ms > 0 {
                sleep(Duration::from_millis(self.config.window_delay_ms)).await;
            }
        }

        let successfully_graded = results.len();
        let average_grading_time_ms = if successfully_graded > 0 {
            total_time_ms / successfully_graded as f64
        } else {
            0.0
        };
        BatchGradingResult {
            results,
            metadata: BatchMetadata {
                total_submissions: total,
                successfully_graded,
                average_grading_time_ms,
                errors,
            },
        }
    }

    /// Grade one submission against the assessment's questions.
    ///
    /// Every question gets a result: unanswered questions score zero with
    /// the no-response marker, and strategy failures score zero flagged for
    /// manual review.
    pub async fn grade_submission(
        &self,
        questions: &[Question],
        submission: &StudentSubmission,
        options: &GradingOptions,
    ) -> Result<AssessmentResult> {
        if let Some(question_id) = submission.duplicate_response() {
            return Err(GradingError::DuplicateResponse {
                submission: submission.submission_id.clone(),
                question: question_id.clone(),
            });
        }

        let mut question_results = Vec::with_capacity(questions.len());
        for question in questions {
            let result = match submission.response_for(&question.id) {
                Some(response) => self.grade_question(question, response, options).await,
                None => {
                    GradingResult::no_response(question.id.clone(), f64::from(question.points))
                }
            };
            question_results.push(result);
        }

        let analytics = insights::learning_analytics(
            self.generator.as_ref(),
            &self.config,
            questions,
            &question_results,
            &submission.student_id,
        )
        .await;

        Ok(AssessmentResult::from_question_results(
            submission.submission_id.clone(),
            submission.student_id.clone(),
            submission.assessment_id.clone(),
            question_results,
            self.config.passing_threshold_pct,
            analytics,
        ))
    }

    /// Grade a single response. Strategy failures are converted into a
    /// zero-score placeholder here so one bad answer never sinks a
    /// submission.
    pub async fn grade_question(
        &self,
        question: &Question,
        response: &ResponseValue,
        options: &GradingOptions,
    ) -> GradingResult {
        let ctx = StrategyContext {
            generator: self.generator.as_ref(),
            executor: self.executor.as_ref(),
            config: &self.config,
            options,
        };
        match strategies::grade(&ctx, question, response).await {
            Ok(result) => result,
            Err(error) => {
                warn!(
                    question_id = %question.id,
                    error = %error,
                    "grading strategy failed"
                );
                GradingResult::grading_error(question.id.clone(), f64::from(question.points))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assay_core::{
        BloomsLevel, CaseStudyBody, Difficulty, MultipleChoiceBody, QuestionBody, QuestionId,
        StudentId, StudentResponse, SubQuestion, TrueFalseBody, GRADING_ERROR_FEEDBACK,
    };
    use assay_genai::MockGenerator;
    use chrono::Utc;

    use crate::executor::ScriptedExecutor;

    fn mc_question(id: &str, points: u32) -> Question {
        Question {
            id: QuestionId::from(id),
            text: "What is the capital of France?".into(),
            points,
            difficulty: Difficulty::Easy,
            blooms_level: BloomsLevel::Remember,
            time_estimate_minutes: 1,
            body: QuestionBody::MultipleChoice(MultipleChoiceBody {
                options: vec!["Paris".into(), "London".into(), "Berlin".into()],
                correct_answer: "Paris".into(),
                explanation: None,
            }),
        }
    }

    fn tf_question(id: &str, points: u32) -> Question {
        Question {
            id: QuestionId::from(id),
            text: "TTL bounds how long an entry may be served.".into(),
            points,
            difficulty: Difficulty::Easy,
            blooms_level: BloomsLevel::Remember,
            time_estimate_minutes: 1,
            body: QuestionBody::TrueFalse(TrueFalseBody {
                correct_answer: true,
                explanation: None,
            }),
        }
    }

    fn submission(id: &str, responses: Vec<(&str, ResponseValue)>) -> StudentSubmission {
        StudentSubmission {
            submission_id: SubmissionId::from(id),
            student_id: StudentId::from(format!("student-{id}").as_str()),
            assessment_id: AssessmentId::new(),
            responses: responses
                .into_iter()
                .map(|(question_id, response)| StudentResponse {
                    question_id: QuestionId::from(question_id),
                    response,
                })
                .collect(),
            submitted_at: Utc::now(),
        }
    }

    fn engine_with(generator: Arc<MockGenerator>) -> GradingEngine {
        GradingEngine::new(
            generator,
            Arc::new(ScriptedExecutor::passing()),
            GradingConfig::default(),
        )
    }

    #[tokio::test]
    async fn batch_grades_every_submission() {
        let generator = Arc::new(MockGenerator::new());
        let engine = engine_with(generator.clone());
        let questions = vec![mc_question("q1", 5), tf_question("q2", 5)];
        let submissions = vec![
            submission("sub-1", vec![("q1", "Paris".into()), ("q2", true.into())]),
            submission("sub-2", vec![("q1", "London".into())]),
        ];

        let batch = engine
            .grade_batch(BatchGradingRequest::new(
                AssessmentId::new(),
                questions,
                submissions,
            ))
            .await;

        assert_eq!(batch.metadata.total_submissions, 2);
        assert_eq!(batch.metadata.successfully_graded, 2);
        assert!(batch.metadata.errors.is_empty());
        assert_eq!(batch.results.len(), 2);

        let first = &batch.results[0];
        assert_eq!(first.overall_score, 10.0);
        assert_eq!(first.percentage, 100.0);
        assert!(first.passed);

        let second = &batch.results[1];
        assert_eq!(second.overall_score, 0.0);
        assert!(!second.passed);
        assert_eq!(second.answered_count(), 1);
        assert!(second.question_results[1].is_unanswered());

        // One insight call per submission; objective grading stays local.
        assert_eq!(generator.generation_calls(), 2);
        assert_eq!(generator.grade_calls(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn batch_windows_bound_concurrency_and_pause_between_windows() {
        let generator = Arc::new(MockGenerator::new().with_latency(Duration::from_millis(200)));
        let engine = GradingEngine::new(
            generator.clone(),
            Arc::new(ScriptedExecutor::passing()),
            GradingConfig {
                concurrency: 2,
                window_delay_ms: 1_000,
                ..Default::default()
            },
        );
        let questions = vec![mc_question("q1", 5)];
        let submissions = vec![
            submission("sub-1", vec![("q1", "Paris".into())]),
            submission("sub-2", vec![("q1", "Paris".into())]),
            submission("sub-3", vec![("q1", "Paris".into())]),
        ];

        let started = Instant::now();
        let batch = engine
            .grade_batch(BatchGradingRequest::new(
                AssessmentId::new(),
                questions,
                submissions,
            ))
            .await;

        assert_eq!(batch.metadata.successfully_graded, 3);
        // Two windows: 2 submissions, pause, then 1.
        assert_eq!(generator.max_in_flight(), 2);
        assert!(started.elapsed() >= Duration::from_millis(1_400));
        assert!(batch.metadata.average_grading_time_ms >= 200.0);
    }

    #[tokio::test]
    async fn unreadable_submissions_become_batch_errors() {
        let generator = Arc::new(MockGenerator::new());
        let engine = engine_with(generator);
        let questions = vec![mc_question("q1", 5)];
        let good = submission("sub-1", vec![("q1", "Paris".into())]);
        let ambiguous = submission(
            "sub-2",
            vec![("q1", "Paris".into()), ("q1", "London".into())],
        );

        let batch = engine
            .grade_batch(BatchGradingRequest::new(
                AssessmentId::new(),
                questions,
                vec![good, ambiguous],
            ))
            .await;

        assert_eq!(batch.metadata.total_submissions, 2);
        assert_eq!(batch.metadata.successfully_graded, 1);
        assert_eq!(batch.results.len(), 1);
        assert_eq!(batch.metadata.errors.len(), 1);
        let error = &batch.metadata.errors[0];
        assert_eq!(error.submission_id, SubmissionId::from("sub-2"));
        assert!(error.message.contains("multiple responses"));
    }

    #[tokio::test]
    async fn strategy_failures_become_placeholder_results() {
        let generator = Arc::new(MockGenerator::new());
        let engine = engine_with(generator);
        let question = Question {
            id: QuestionId::from("q1"),
            text: "Read the scenario and answer.".into(),
            points: 10,
            difficulty: Difficulty::Hard,
            blooms_level: BloomsLevel::Analyze,
            time_estimate_minutes: 15,
            body: QuestionBody::CaseStudy(CaseStudyBody {
                scenario: "A queue is backing up.".into(),
                sub_questions: vec![SubQuestion {
                    id: "a".into(),
                    text: "Why?".into(),
                    sample_answer: "Consumers are too slow.".into(),
                    points: 10,
                }],
            }),
        };

        // Free text where a sub-answer map is required.
        let result = engine
            .grade_question(&question, &"not a map".into(), &GradingOptions::default())
            .await;
        assert_eq!(result.score, 0.0);
        assert_eq!(result.feedback, GRADING_ERROR_FEEDBACK);
        assert!(result.requires_manual_review);
    }

    #[tokio::test]
    async fn passing_follows_the_configured_threshold() {
        let generator = Arc::new(MockGenerator::new());
        let engine = GradingEngine::new(
            generator,
            Arc::new(ScriptedExecutor::passing()),
            GradingConfig {
                passing_threshold_pct: 50.0,
                ..Default::default()
            },
        );
        let questions = vec![mc_question("q1", 5), tf_question("q2", 5)];
        let sub = submission("sub-1", vec![("q1", "Paris".into()), ("q2", false.into())]);

        let result = engine
            .grade_submission(&questions, &sub, &GradingOptions::default())
            .await
            .unwrap();
        assert_eq!(result.percentage, 50.0);
        assert!(result.passed);
    }

    #[tokio::test]
    async fn fallback_analytics_survive_a_dead_port() {
        use crate::insights::FALLBACK_RECOMMENDATION;

        let generator = Arc::new(MockGenerator::new());
        let engine = engine_with(generator);
        let questions = vec![mc_question("q1", 5)];
        let sub = submission("sub-1", vec![("q1", "Paris".into())]);

        let result = engine
            .grade_submission(&questions, &sub, &GradingOptions::default())
            .await
            .unwrap();
        assert_eq!(
            result.analytics.recommendations,
            vec![FALLBACK_RECOMMENDATION]
        );
        assert_eq!(
            result.analytics.blooms_performance[&BloomsLevel::Remember],
            100.0
        );
    }
}
