//! Caller-facing description of the assessment to generate.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::assessment::AssessmentKind;
use crate::error::ValidationError;
use crate::question::{Difficulty, QuestionKind};

/// How many questions to generate, optionally broken down by kind.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuestionCounts {
    pub total: usize,
    /// When non-empty, the per-kind counts must sum to `total`.
    #[serde(default)]
    pub by_kind: BTreeMap<QuestionKind, usize>,
}

impl QuestionCounts {
    #[must_use]
    pub fn of(total: usize) -> Self {
        Self {
            total,
            by_kind: BTreeMap::new(),
        }
    }
}

/// Input to assessment generation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssessmentInput {
    pub topic: String,
    /// Who the assessment is for, e.g. "second-year CS undergraduates".
    pub audience: String,
    pub difficulty: Difficulty,
    #[serde(default)]
    pub kind: AssessmentKind,
    pub question_counts: QuestionCounts,
    pub learning_objectives: Vec<String>,
    /// Overrides the generated title when set.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default = "default_attempts")]
    pub attempts_allowed: u32,
    #[serde(default)]
    pub randomize_questions: bool,
    #[serde(default)]
    pub randomize_options: bool,
}

impl AssessmentInput {
    /// Validate the request before any generation work starts.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.topic.trim().is_empty() {
            return Err(ValidationError::EmptyTopic);
        }
        if self.audience.trim().is_empty() {
            return Err(ValidationError::EmptyAudience);
        }
        if self.question_counts.total == 0 {
            return Err(ValidationError::NoQuestionsRequested);
        }
        if self.learning_objectives.is_empty() {
            return Err(ValidationError::NoLearningObjectives);
        }
        if !self.question_counts.by_kind.is_empty() {
            let sum: usize = self.question_counts.by_kind.values().sum();
            if sum != self.question_counts.total {
                return Err(ValidationError::KindCountMismatch {
                    expected: self.question_counts.total,
                    actual: sum,
                });
            }
        }
        Ok(())
    }
}

fn default_attempts() -> u32 {
    1
}
