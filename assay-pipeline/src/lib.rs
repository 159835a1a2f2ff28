//! End-to-end assessment pipeline.
//!
//! This crate wires the workspace into one orchestrator. An
//! [`AssessmentPipeline`] turns a validated [`AssessmentInput`] into a
//! complete assessment through five tracked generation steps, then exposes
//! grading, analytics and question optimization over the same port.
//!
//! ```text
//!                      ┌──────────────────────────────┐
//! AssessmentInput ────▶│      AssessmentPipeline      │────▶ AssessmentCreationResult
//!                      │  structure ▶ questions ▶ …   │
//! StudentSubmission ──▶│  grading ▶ analytics ▶ opt   │────▶ BatchGradingResult
//!                      └──────────────┬───────────────┘
//!                                     ▼
//!                               ProgressStore
//! ```
//!
//! Every stage reads its knobs from one [`PipelineConfig`], loadable from a
//! TOML file with per-stage sections.
//!
//! [`AssessmentInput`]: assay_core::AssessmentInput

pub mod config;
pub mod error;
pub mod generator;
pub mod pipeline;
pub mod progress;

pub use config::{GenerationConfig, PipelineConfig};
pub use error::{PipelineError, Result};
pub use generator::{AssessmentBlueprint, DraftQuestions, QuestionGenerator, RubricGenerator};
pub use pipeline::{
    AssessmentCreationResult, AssessmentPipeline, GenerationMetadata, OptimizationOutcome,
};
pub use progress::{
    GenerationProgress, GenerationStep, InMemoryProgressStore, ProgressError, ProgressStore,
    StepName, StepStatus,
};
