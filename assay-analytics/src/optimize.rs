//! Question optimization suggestions.

use serde::{Deserialize, Serialize};

use assay_core::QuestionId;

/// How urgently a suggestion should be acted on. The pipeline auto-applies
/// only high-priority suggestions; the rest are reported untouched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Priority {
    Low,
    Medium,
    High,
}

/// The concrete change a suggestion proposes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum OptimizationAction {
    /// Replace the question text.
    RewriteText { text: String },
    /// Change the question's point value.
    AdjustPoints { points: u32 },
    /// Remove the question from circulation.
    Retire,
}

impl OptimizationAction {
    /// False for degenerate actions (blank rewrite, zero points) that could
    /// never be applied.
    #[must_use]
    pub fn is_actionable(&self) -> bool {
        match self {
            OptimizationAction::RewriteText { text } => !text.trim().is_empty(),
            OptimizationAction::AdjustPoints { points } => *points > 0,
            OptimizationAction::Retire => true,
        }
    }
}

/// One proposed change to one question.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OptimizationSuggestion {
    pub question_id: QuestionId,
    pub priority: Priority,
    pub action: OptimizationAction,
    pub rationale: String,
}
