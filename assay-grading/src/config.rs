//! Grading configuration.

use serde::{Deserialize, Serialize};

/// Tuning knobs for the grading engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GradingConfig {
    /// Submissions graded concurrently within one batch window.
    pub concurrency: usize,
    /// Pause between batch windows, in milliseconds. Spaces out port load
    /// when grading large batches.
    pub window_delay_ms: u64,
    /// Timeout for a single port call in seconds.
    pub port_timeout_seconds: u32,
    /// Overall percentage at or above which a submission passes.
    pub passing_threshold_pct: f64,
    /// Fraction of rubric points at or above which an essay counts as
    /// correct.
    pub essay_pass_ratio: f64,
}

impl Default for GradingConfig {
    fn default() -> Self {
        Self {
            concurrency: 3,
            window_delay_ms: 1_000,
            port_timeout_seconds: 30,
            passing_threshold_pct: 60.0,
            essay_pass_ratio: 0.7,
        }
    }
}

/// Per-batch grading options chosen by the caller.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GradingOptions {
    /// Allow similarity-based partial credit on fill-in-blank questions.
    pub allow_partial_credit: bool,
    /// Grade subjective questions through the port. When off they are
    /// flagged for manual grading instead.
    pub ai_grading_for_subjective: bool,
}

impl Default for GradingOptions {
    fn default() -> Self {
        Self {
            allow_partial_credit: true,
            ai_grading_for_subjective: true,
        }
    }
}
