//! Compiled assessments and their metadata.

use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::ValidationError;
use crate::ids::AssessmentId;
use crate::question::{BloomsLevel, Difficulty, Question};

/// The kind of assessment being delivered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AssessmentKind {
    Quiz,
    Exam,
    Practice,
    Homework,
}

impl AssessmentKind {
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            AssessmentKind::Quiz => "quiz",
            AssessmentKind::Exam => "exam",
            AssessmentKind::Practice => "practice",
            AssessmentKind::Homework => "homework",
        }
    }
}

impl Default for AssessmentKind {
    fn default() -> Self {
        AssessmentKind::Quiz
    }
}

impl fmt::Display for AssessmentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Delivery settings for an assessment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssessmentConfig {
    pub kind: AssessmentKind,
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub instructions: String,
    pub attempts_allowed: u32,
    #[serde(default)]
    pub randomize_questions: bool,
    #[serde(default)]
    pub randomize_options: bool,
}

/// Derived facts about an assessment's question set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssessmentMetadata {
    pub learning_objectives: Vec<String>,
    pub total_points: u32,
    pub estimated_duration_minutes: u32,
    /// Question counts per difficulty band, only bands present included.
    pub difficulty_distribution: BTreeMap<Difficulty, usize>,
    /// Question counts per Bloom's level, only levels present included.
    pub blooms_distribution: BTreeMap<BloomsLevel, usize>,
}

impl AssessmentMetadata {
    /// Compute metadata from a question set.
    #[must_use]
    pub fn for_questions(questions: &[Question], learning_objectives: Vec<String>) -> Self {
        let mut difficulty_distribution = BTreeMap::new();
        let mut blooms_distribution = BTreeMap::new();
        for question in questions {
            *difficulty_distribution.entry(question.difficulty).or_insert(0) += 1;
            *blooms_distribution.entry(question.blooms_level).or_insert(0) += 1;
        }
        Self {
            learning_objectives,
            total_points: questions.iter().map(|q| q.points).sum(),
            estimated_duration_minutes: questions.iter().map(|q| q.time_estimate_minutes).sum(),
            difficulty_distribution,
            blooms_distribution,
        }
    }
}

/// A complete, ready-to-deliver assessment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Assessment {
    pub id: AssessmentId,
    pub config: AssessmentConfig,
    pub questions: Vec<Question>,
    pub metadata: AssessmentMetadata,
    pub created_at: DateTime<Utc>,
}

impl Assessment {
    /// Validate every question plus cross-question invariants (unique ids,
    /// metadata totals consistent with the question set).
    pub fn validate(&self) -> Result<(), ValidationError> {
        for (index, question) in self.questions.iter().enumerate() {
            question.validate()?;
            if self.questions[..index].iter().any(|q| q.id == question.id) {
                return Err(ValidationError::DuplicateQuestionId {
                    question: question.id.clone(),
                });
            }
        }
        let total: u32 = self.questions.iter().map(|q| q.points).sum();
        if total != self.metadata.total_points {
            return Err(ValidationError::MetadataPointsMismatch {
                expected: total,
                actual: self.metadata.total_points,
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ids::QuestionId;
    use crate::question::{MultipleChoiceBody, QuestionBody, TrueFalseBody};

    fn question(id: &str, points: u32, difficulty: Difficulty, level: BloomsLevel) -> Question {
        Question {
            id: QuestionId::from(id),
            text: format!("Question {id}"),
            points,
            difficulty,
            blooms_level: level,
            time_estimate_minutes: 2,
            body: QuestionBody::TrueFalse(TrueFalseBody {
                correct_answer: true,
                explanation: None,
            }),
        }
    }

    #[test]
    fn metadata_counts_distributions() {
        let questions = vec![
            question("q1", 5, Difficulty::Easy, BloomsLevel::Remember),
            question("q2", 5, Difficulty::Easy, BloomsLevel::Apply),
            question("q3", 10, Difficulty::Hard, BloomsLevel::Apply),
        ];
        let metadata =
            AssessmentMetadata::for_questions(&questions, vec!["Understand caching".into()]);
        assert_eq!(metadata.total_points, 20);
        assert_eq!(metadata.estimated_duration_minutes, 6);
        assert_eq!(metadata.difficulty_distribution[&Difficulty::Easy], 2);
        assert_eq!(metadata.difficulty_distribution[&Difficulty::Hard], 1);
        assert_eq!(metadata.blooms_distribution[&BloomsLevel::Apply], 2);
        assert!(!metadata.difficulty_distribution.contains_key(&Difficulty::Expert));
    }

    #[test]
    fn duplicate_question_ids_fail_validation() {
        let questions = vec![
            question("q1", 5, Difficulty::Easy, BloomsLevel::Remember),
            question("q1", 5, Difficulty::Easy, BloomsLevel::Remember),
        ];
        let assessment = Assessment {
            id: AssessmentId::new(),
            config: AssessmentConfig {
                kind: AssessmentKind::Quiz,
                title: "Caching basics".into(),
                description: String::new(),
                instructions: String::new(),
                attempts_allowed: 1,
                randomize_questions: false,
                randomize_options: false,
            },
            metadata: AssessmentMetadata::for_questions(&questions, vec![]),
            questions,
            created_at: Utc::now(),
        };
        assert!(matches!(
            assessment.validate(),
            Err(ValidationError::DuplicateQuestionId { .. })
        ));
    }

    #[test]
    fn invalid_member_question_fails_assessment_validation() {
        let bad = Question {
            id: QuestionId::from("q1"),
            text: "Pick one".into(),
            points: 5,
            difficulty: Difficulty::Easy,
            blooms_level: BloomsLevel::Remember,
            time_estimate_minutes: 1,
            body: QuestionBody::MultipleChoice(MultipleChoiceBody {
                options: vec!["only one".into()],
                correct_answer: "only one".into(),
                explanation: None,
            }),
        };
        let questions = vec![bad];
        let assessment = Assessment {
            id: AssessmentId::new(),
            config: AssessmentConfig {
                kind: AssessmentKind::Practice,
                title: "Broken".into(),
                description: String::new(),
                instructions: String::new(),
                attempts_allowed: 1,
                randomize_questions: false,
                randomize_options: false,
            },
            metadata: AssessmentMetadata::for_questions(&questions, vec![]),
            questions,
            created_at: Utc::now(),
        };
        assert!(matches!(
            assessment.validate(),
            Err(ValidationError::TooFewOptions { count: 1, .. })
        ));
    }
}
