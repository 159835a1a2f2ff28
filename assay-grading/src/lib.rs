//! Grading engine for student submissions.
//!
//! Objective kinds (multiple choice, true/false, fill-in-blank) are graded
//! deterministically in process. Subjective kinds (short answer, essay,
//! case study) are graded through the [`assay_genai::ContentGenerator`]
//! port, and coding challenges run against a [`CodeExecutor`]. Matching and
//! ordering questions are flagged for manual review.
//!
//! ```text
//!                       +-----------------+
//!   submissions ------> |  GradingEngine  | ------> AssessmentResult
//!   (in windows)        +-----------------+         + LearningAnalytics
//!                        |       |      |
//!                  objective   port   executor
//!                  strategies  calls  runs
//! ```
//!
//! One failure never sinks a batch: a submission the engine cannot grade
//! becomes a [`BatchError`] record, and a question whose strategy fails
//! becomes a zero-score placeholder flagged for manual review.

pub mod config;
pub mod engine;
pub mod error;
pub mod executor;
mod insights;
pub mod similarity;
mod strategies;

pub use config::{GradingConfig, GradingOptions};
pub use engine::{
    BatchError, BatchGradingRequest, BatchGradingResult, BatchMetadata, GradingEngine,
};
pub use error::{GradingError, Result};
pub use executor::{
    CodeExecutor, ExecutionError, ExecutionMode, ExecutionReport, ScriptedExecutor,
    SimulatedExecutor, TestOutcome,
};
pub use insights::{FALLBACK_RECOMMENDATION, FALLBACK_STRENGTH, FALLBACK_WEAKNESS};
pub use similarity::char_ratio;
