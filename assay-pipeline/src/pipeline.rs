//! The assessment pipeline.
//!
//! [`AssessmentPipeline`] ties the workspace together: it generates
//! assessments through the port in five tracked steps, then hands graded
//! batches and analytics straight to the underlying engines.
//!
//! ```text
//! AssessmentInput ──▶ structure ▶ questions ▶ rubrics ▶ validation ▶ compilation
//!                        │            (progress recorded per step)          │
//!                        ▼                                                  ▼
//!                  ProgressStore                              AssessmentCreationResult
//! ```
//!
//! The first failing step abandons the run; completed steps are not resumed.

use std::future::Future;
use std::sync::Arc;
use std::time::Instant;

use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use tokio::sync::RwLock;
use tracing::{info, warn};

use assay_analytics::{
    AnalyticsEngine, AnalyticsReport, AnalyticsRequest, OptimizationAction, OptimizationSuggestion,
    Priority,
};
use assay_core::{
    Assessment, AssessmentConfig, AssessmentId, AssessmentInput, AssessmentMetadata,
    AssessmentResult, Question, QuestionBody, RequestId,
};
use assay_genai::{
    ContentGenerator, ContentGeneratorExt, GenerationRequest, PromptTemplate, VariableMap,
    with_timeout,
};
use assay_grading::{BatchGradingRequest, BatchGradingResult, GradingEngine};

use crate::config::PipelineConfig;
use crate::error::{PipelineError, Result};
use crate::generator::{AssessmentBlueprint, QuestionGenerator, RubricGenerator};
use crate::progress::{GenerationProgress, InMemoryProgressStore, ProgressStore, StepName};

const QUALITY_TEMPLATE: &str = "\
Rate the quality of this {{kind}} question for clarity, fairness and fit
to its stated {{difficulty}} difficulty.

{{text}}

Reply with a JSON object holding a single numeric \"rating\" from 0 to 10.";

/// Facts about one generation run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerationMetadata {
    pub questions_requested: usize,
    /// May fall below `questions_requested` when malformed or invalid
    /// questions were dropped.
    pub questions_generated: usize,
    /// Mean per-question quality rating on a 0 to 10 scale; absent when
    /// analysis is off or produced no ratings.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub quality_score: Option<f64>,
    pub duration_ms: u64,
}

/// A generated assessment plus facts about the run that produced it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssessmentCreationResult {
    pub assessment: Assessment,
    pub metadata: GenerationMetadata,
}

/// What [`AssessmentPipeline::optimize_questions`] did with each suggestion.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OptimizationOutcome {
    /// The question set with high-priority suggestions applied.
    pub questions: Vec<Question>,
    pub applied: Vec<OptimizationSuggestion>,
    /// Lower-priority suggestions, plus any whose application failed
    /// validation, reported untouched.
    pub deferred: Vec<OptimizationSuggestion>,
}

/// End-to-end orchestrator: generate, grade, analyze, optimize.
pub struct AssessmentPipeline {
    questions: QuestionGenerator,
    rubrics: RubricGenerator,
    generator: Arc<dyn ContentGenerator>,
    grading: GradingEngine,
    analytics: AnalyticsEngine,
    progress: Arc<dyn ProgressStore>,
    current_request: RwLock<Option<RequestId>>,
    config: PipelineConfig,
}

impl AssessmentPipeline {
    #[must_use]
    pub fn new(
        generator: Arc<dyn ContentGenerator>,
        grading: GradingEngine,
        analytics: AnalyticsEngine,
        progress: Arc<dyn ProgressStore>,
        config: PipelineConfig,
    ) -> Self {
        Self {
            questions: QuestionGenerator::new(generator.clone(), config.genai.clone()),
            rubrics: RubricGenerator::new(generator.clone(), config.genai.clone()),
            generator,
            grading,
            analytics,
            progress,
            current_request: RwLock::new(None),
            config,
        }
    }

    /// Wire a pipeline from one config, with the simulated code executor and
    /// the in-memory progress store.
    #[must_use]
    pub fn with_simulated_executor(
        generator: Arc<dyn ContentGenerator>,
        config: PipelineConfig,
    ) -> Self {
        let grading =
            GradingEngine::with_simulated_executor(generator.clone(), config.grading.clone());
        let analytics = AnalyticsEngine::new(generator.clone(), config.analytics.clone());
        Self::new(
            generator,
            grading,
            analytics,
            Arc::new(InMemoryProgressStore::new()),
            config,
        )
    }

    #[must_use]
    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Generate a complete assessment from a validated input.
    ///
    /// The five steps run strictly in sequence; the first failure abandons
    /// the run and comes back as [`PipelineError::StepFailed`]. While the
    /// call runs its progress is readable through
    /// [`Self::generation_progress`]; the record is discarded when the call
    /// returns, successfully or not.
    pub async fn generate_assessment(
        &self,
        input: AssessmentInput,
    ) -> Result<AssessmentCreationResult> {
        input.validate()?;
        let requested = input.question_counts.total;
        let limit = self.config.generation.max_questions;
        if requested > limit {
            return Err(PipelineError::TooManyQuestions { requested, limit });
        }

        let request_id = RequestId::new();
        let started = Instant::now();
        info!(%request_id, topic = %input.topic, requested, "generating assessment");

        let mut progress = GenerationProgress::new(request_id);
        self.record_create(&progress).await;
        *self.current_request.write().await = Some(request_id);

        let outcome = self.run_generation(&input, &mut progress).await;

        *self.current_request.write().await = None;
        self.record_discard(request_id).await;

        match outcome {
            Ok((assessment, quality_score)) => {
                let metadata = GenerationMetadata {
                    questions_requested: requested,
                    questions_generated: assessment.questions.len(),
                    quality_score,
                    duration_ms: started.elapsed().as_millis() as u64,
                };
                info!(
                    %request_id,
                    generated = metadata.questions_generated,
                    duration_ms = metadata.duration_ms,
                    "assessment generated"
                );
                Ok(AssessmentCreationResult {
                    assessment,
                    metadata,
                })
            }
            Err(error) => {
                warn!(%request_id, error = %error, "assessment generation failed");
                Err(error)
            }
        }
    }

    /// Live progress of the generation run this pipeline currently owns,
    /// `None` when idle.
    pub async fn generation_progress(&self) -> Option<GenerationProgress> {
        let request_id = (*self.current_request.read().await)?;
        match self.progress.get(request_id).await {
            Ok(progress) => progress,
            Err(error) => {
                warn!(%request_id, error = %error, "progress store read failed");
                None
            }
        }
    }

    /// Grade a batch of submissions.
    ///
    /// A thin delegation to the grading engine, usable without ever
    /// generating, e.g. for manually authored assessments.
    pub async fn grade_submissions(&self, request: BatchGradingRequest) -> BatchGradingResult {
        self.grading.grade_batch(request).await
    }

    /// Build the analytics report for a set of graded results.
    pub async fn generate_analytics(&self, request: AnalyticsRequest) -> AnalyticsReport {
        self.analytics.generate_report(request).await
    }

    /// Run the analytics report over historical results and apply what it
    /// suggests.
    ///
    /// Only high-priority suggestions are applied. Rewrites and point
    /// adjustments that would leave a question invalid are deferred instead,
    /// as are all lower-priority suggestions.
    pub async fn optimize_questions(
        &self,
        assessment_id: AssessmentId,
        questions: Vec<Question>,
        results: Vec<AssessmentResult>,
    ) -> OptimizationOutcome {
        let report_request = AnalyticsRequest::new(assessment_id, questions.clone(), results)
            .with_recommendations(false);
        let report = self.analytics.generate_report(report_request).await;
        let suggestions = self
            .analytics
            .suggest_optimizations(&questions, &report)
            .await;
        info!(
            %assessment_id,
            flagged = report.flagged().count(),
            suggestions = suggestions.len(),
            "applying optimization suggestions"
        );
        apply_suggestions(questions, suggestions)
    }

    async fn run_generation(
        &self,
        input: &AssessmentInput,
        progress: &mut GenerationProgress,
    ) -> Result<(Assessment, Option<f64>)> {
        let blueprint = self
            .run_step(
                progress,
                StepName::Structure,
                self.questions.blueprint(input),
                |blueprint| json!({ "title": blueprint.title.clone() }),
            )
            .await?;

        let draft = self
            .run_step(
                progress,
                StepName::Questions,
                self.questions.generate(input),
                |draft| json!({ "raw": draft.raw_count, "decoded": draft.questions.len() }),
            )
            .await?;

        let with_rubrics = self
            .run_step(
                progress,
                StepName::Rubrics,
                self.attach_rubrics(draft.questions),
                |questions| json!({ "questions": questions.len() }),
            )
            .await?;

        let valid = self
            .run_step(
                progress,
                StepName::Validation,
                async move { validate_questions(with_rubrics) },
                |questions| json!({ "valid": questions.len() }),
            )
            .await?;

        let assessment = self
            .run_step(
                progress,
                StepName::Compilation,
                async move { Ok::<_, PipelineError>(compile_assessment(input, &blueprint, valid)) },
                |assessment| json!({ "total_points": assessment.metadata.total_points }),
            )
            .await?;

        let quality_score = if self.config.generation.quality_analysis {
            self.quality_score(&assessment.questions).await
        } else {
            None
        };
        Ok((assessment, quality_score))
    }

    /// Run one step, recording its transitions in the progress store and
    /// wrapping any failure with the step's name.
    async fn run_step<T, E, F>(
        &self,
        progress: &mut GenerationProgress,
        step: StepName,
        work: F,
        summary: impl FnOnce(&T) -> Value,
    ) -> Result<T>
    where
        E: Into<PipelineError>,
        F: Future<Output = std::result::Result<T, E>>,
    {
        progress.start_step(step);
        self.record_update(progress).await;
        match work.await {
            Ok(value) => {
                progress.complete_step(step, Some(summary(&value)));
                self.record_update(progress).await;
                Ok(value)
            }
            Err(error) => {
                let source = Box::new(error.into());
                progress.fail_step(step, source.to_string());
                self.record_update(progress).await;
                Err(PipelineError::StepFailed { step, source })
            }
        }
    }

    /// Attach generated rubrics to essay questions that lack one.
    async fn attach_rubrics(&self, mut questions: Vec<Question>) -> Result<Vec<Question>> {
        for question in &mut questions {
            let needs_rubric =
                matches!(&question.body, QuestionBody::Essay(body) if body.rubric.is_none());
            if !needs_rubric {
                continue;
            }
            let rubric = self.rubrics.generate(question).await?;
            if let QuestionBody::Essay(body) = &mut question.body {
                body.rubric = Some(rubric);
            }
        }
        Ok(questions)
    }

    /// Mean per-question quality rating from the port, best effort.
    ///
    /// Individual failures are logged and excluded; a run where every rating
    /// failed leaves the score absent rather than failing the generation.
    async fn quality_score(&self, questions: &[Question]) -> Option<f64> {
        let mut ratings = Vec::new();
        for question in questions {
            match self.rate_question(question).await {
                Ok(rating) => ratings.push(rating.clamp(0.0, 10.0)),
                Err(error) => {
                    warn!(
                        question_id = %question.id,
                        error = %error,
                        "quality analysis failed for question"
                    );
                }
            }
        }
        if ratings.is_empty() {
            None
        } else {
            Some(ratings.iter().sum::<f64>() / ratings.len() as f64)
        }
    }

    async fn rate_question(&self, question: &Question) -> Result<f64> {
        #[derive(Deserialize)]
        struct QualityReply {
            rating: f64,
        }

        let variables = VariableMap::new()
            .with("kind", question.kind().as_str())
            .with("difficulty", question.difficulty.as_str())
            .with("text", question.text.clone());
        let request =
            GenerationRequest::new(PromptTemplate::new("question-quality", QUALITY_TEMPLATE))
                .with_variables(variables);
        let reply: QualityReply = with_timeout(
            self.config.genai.timeout_seconds,
            self.generator.generate_as(request),
        )
        .await?;
        Ok(reply.rating)
    }

    async fn record_create(&self, progress: &GenerationProgress) {
        if let Err(error) = self.progress.create(progress.clone()).await {
            warn!(
                request_id = %progress.request_id,
                error = %error,
                "progress store create failed"
            );
        }
    }

    async fn record_update(&self, progress: &GenerationProgress) {
        if let Err(error) = self.progress.update(progress.clone()).await {
            warn!(
                request_id = %progress.request_id,
                error = %error,
                "progress store update failed"
            );
        }
    }

    async fn record_discard(&self, request_id: RequestId) {
        if let Err(error) = self.progress.discard(request_id).await {
            warn!(%request_id, error = %error, "progress store discard failed");
        }
    }
}

/// Drop questions that fail model validation; error only when none survive.
fn validate_questions(questions: Vec<Question>) -> Result<Vec<Question>> {
    let mut valid = Vec::with_capacity(questions.len());
    for question in questions {
        match question.validate() {
            Ok(()) => valid.push(question),
            Err(error) => {
                warn!(
                    question_id = %question.id,
                    error = %error,
                    "dropping invalid generated question"
                );
            }
        }
    }
    if valid.is_empty() {
        return Err(PipelineError::NoValidQuestions);
    }
    Ok(valid)
}

fn compile_assessment(
    input: &AssessmentInput,
    blueprint: &AssessmentBlueprint,
    questions: Vec<Question>,
) -> Assessment {
    let title = input
        .title
        .clone()
        .unwrap_or_else(|| blueprint.title.clone());
    let config = AssessmentConfig {
        kind: input.kind,
        title,
        description: blueprint.description.clone(),
        instructions: blueprint.instructions.clone(),
        attempts_allowed: input.attempts_allowed,
        randomize_questions: input.randomize_questions,
        randomize_options: input.randomize_options,
    };
    let metadata = AssessmentMetadata::for_questions(&questions, input.learning_objectives.clone());
    Assessment {
        id: AssessmentId::new(),
        config,
        questions,
        metadata,
        created_at: Utc::now(),
    }
}

fn apply_suggestions(
    mut questions: Vec<Question>,
    suggestions: Vec<OptimizationSuggestion>,
) -> OptimizationOutcome {
    let mut applied = Vec::new();
    let mut deferred = Vec::new();
    for suggestion in suggestions {
        if suggestion.priority != Priority::High {
            deferred.push(suggestion);
            continue;
        }
        let Some(index) = questions
            .iter()
            .position(|q| q.id == suggestion.question_id)
        else {
            warn!(
                question_id = %suggestion.question_id,
                "suggestion targets an unknown question"
            );
            deferred.push(suggestion);
            continue;
        };
        let candidate = match &suggestion.action {
            OptimizationAction::Retire => {
                questions.remove(index);
                applied.push(suggestion);
                continue;
            }
            OptimizationAction::RewriteText { text } => {
                let mut candidate = questions[index].clone();
                candidate.text = text.clone();
                candidate
            }
            OptimizationAction::AdjustPoints { points } => {
                let mut candidate = questions[index].clone();
                candidate.points = *points;
                candidate
            }
        };
        match candidate.validate() {
            Ok(()) => {
                questions[index] = candidate;
                applied.push(suggestion);
            }
            Err(error) => {
                warn!(
                    question_id = %suggestion.question_id,
                    error = %error,
                    "deferring a suggestion that fails validation"
                );
                deferred.push(suggestion);
            }
        }
    }
    OptimizationOutcome {
        questions,
        applied,
        deferred,
    }
}
