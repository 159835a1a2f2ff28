//! Question data model.
//!
//! A [`Question`] pairs fields common to every question (id, text, points,
//! difficulty, Bloom's level) with a [`QuestionBody`] holding the
//! type-specific payload. The body is flattened during serialization and
//! tagged with a snake_case `type` field, so a multiple-choice question
//! serializes as:
//!
//! ```json
//! {
//!   "id": "q1",
//!   "type": "multiple_choice",
//!   "text": "...",
//!   "points": 5,
//!   "options": ["..."],
//!   "correct_answer": "..."
//! }
//! ```

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::ValidationError;
use crate::ids::QuestionId;
use crate::rubric::Rubric;

/// Difficulty band assigned to a question.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Difficulty {
    Easy,
    Medium,
    Hard,
    Expert,
}

impl Difficulty {
    pub const ALL: [Difficulty; 4] = [
        Difficulty::Easy,
        Difficulty::Medium,
        Difficulty::Hard,
        Difficulty::Expert,
    ];

    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Difficulty::Easy => "easy",
            Difficulty::Medium => "medium",
            Difficulty::Hard => "hard",
            Difficulty::Expert => "expert",
        }
    }
}

impl fmt::Display for Difficulty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Bloom's taxonomy level describing the cognitive demand of a question.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BloomsLevel {
    Remember,
    Understand,
    Apply,
    Analyze,
    Evaluate,
    Create,
}

impl BloomsLevel {
    pub const ALL: [BloomsLevel; 6] = [
        BloomsLevel::Remember,
        BloomsLevel::Understand,
        BloomsLevel::Apply,
        BloomsLevel::Analyze,
        BloomsLevel::Evaluate,
        BloomsLevel::Create,
    ];

    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            BloomsLevel::Remember => "remember",
            BloomsLevel::Understand => "understand",
            BloomsLevel::Apply => "apply",
            BloomsLevel::Analyze => "analyze",
            BloomsLevel::Evaluate => "evaluate",
            BloomsLevel::Create => "create",
        }
    }
}

impl fmt::Display for BloomsLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Discriminant for [`QuestionBody`], used for grading dispatch and
/// distribution counting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QuestionKind {
    MultipleChoice,
    TrueFalse,
    FillInBlank,
    ShortAnswer,
    Essay,
    CodingChallenge,
    Matching,
    Ordering,
    CaseStudy,
}

impl QuestionKind {
    pub const ALL: [QuestionKind; 9] = [
        QuestionKind::MultipleChoice,
        QuestionKind::TrueFalse,
        QuestionKind::FillInBlank,
        QuestionKind::ShortAnswer,
        QuestionKind::Essay,
        QuestionKind::CodingChallenge,
        QuestionKind::Matching,
        QuestionKind::Ordering,
        QuestionKind::CaseStudy,
    ];

    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            QuestionKind::MultipleChoice => "multiple_choice",
            QuestionKind::TrueFalse => "true_false",
            QuestionKind::FillInBlank => "fill_in_blank",
            QuestionKind::ShortAnswer => "short_answer",
            QuestionKind::Essay => "essay",
            QuestionKind::CodingChallenge => "coding_challenge",
            QuestionKind::Matching => "matching",
            QuestionKind::Ordering => "ordering",
            QuestionKind::CaseStudy => "case_study",
        }
    }

    /// True for the kinds graded through the content generation port rather
    /// than by a deterministic comparison.
    #[must_use]
    pub fn is_subjective(&self) -> bool {
        matches!(
            self,
            QuestionKind::ShortAnswer | QuestionKind::Essay | QuestionKind::CaseStudy
        )
    }
}

impl fmt::Display for QuestionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Payload for a multiple-choice question.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MultipleChoiceBody {
    pub options: Vec<String>,
    /// Must be one of `options`, compared verbatim at grading time.
    pub correct_answer: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub explanation: Option<String>,
}

/// Payload for a true/false question.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrueFalseBody {
    pub correct_answer: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub explanation: Option<String>,
}

/// Payload for a fill-in-the-blank question.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FillInBlankBody {
    /// Accepted answers; a response matching any of them earns full credit.
    pub correct_answers: Vec<String>,
    #[serde(default)]
    pub case_sensitive: bool,
    /// When set, near-miss responses earn similarity-scaled partial credit.
    #[serde(default = "default_true")]
    pub allow_partial_credit: bool,
}

/// Payload for a short-answer question.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShortAnswerBody {
    pub sample_answer: String,
    /// Key points the grader should look for in the response.
    #[serde(default)]
    pub key_points: Vec<String>,
}

/// Payload for an essay question.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EssayBody {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sample_answer: Option<String>,
    /// With a rubric the essay is scored criterion by criterion; without one
    /// it is graded holistically against the sample answer.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rubric: Option<Rubric>,
}

/// One test case for a coding challenge.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TestCase {
    pub input: String,
    pub expected_output: String,
    /// Hidden cases are excluded from student-visible feedback.
    #[serde(default)]
    pub hidden: bool,
}

/// Payload for a coding challenge.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CodingChallengeBody {
    pub language: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub starter_code: Option<String>,
    pub test_cases: Vec<TestCase>,
}

/// One left/right pair in a matching question.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchingPair {
    pub left: String,
    pub right: String,
}

/// Payload for a matching question.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchingBody {
    pub pairs: Vec<MatchingPair>,
}

/// Payload for an ordering question.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderingBody {
    pub items: Vec<String>,
    /// Indices into `items` giving the correct sequence; must be a
    /// permutation of `0..items.len()`.
    pub correct_order: Vec<usize>,
}

/// A sub-question nested inside a case study.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubQuestion {
    pub id: String,
    pub text: String,
    pub sample_answer: String,
    pub points: u32,
}

/// Payload for a case-study question.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CaseStudyBody {
    pub scenario: String,
    /// Graded independently; their points must sum to the question's points.
    pub sub_questions: Vec<SubQuestion>,
}

/// Type-specific payload of a question.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum QuestionBody {
    MultipleChoice(MultipleChoiceBody),
    TrueFalse(TrueFalseBody),
    FillInBlank(FillInBlankBody),
    ShortAnswer(ShortAnswerBody),
    Essay(EssayBody),
    CodingChallenge(CodingChallengeBody),
    Matching(MatchingBody),
    Ordering(OrderingBody),
    CaseStudy(CaseStudyBody),
}

impl QuestionBody {
    #[must_use]
    pub fn kind(&self) -> QuestionKind {
        match self {
            QuestionBody::MultipleChoice(_) => QuestionKind::MultipleChoice,
            QuestionBody::TrueFalse(_) => QuestionKind::TrueFalse,
            QuestionBody::FillInBlank(_) => QuestionKind::FillInBlank,
            QuestionBody::ShortAnswer(_) => QuestionKind::ShortAnswer,
            QuestionBody::Essay(_) => QuestionKind::Essay,
            QuestionBody::CodingChallenge(_) => QuestionKind::CodingChallenge,
            QuestionBody::Matching(_) => QuestionKind::Matching,
            QuestionBody::Ordering(_) => QuestionKind::Ordering,
            QuestionBody::CaseStudy(_) => QuestionKind::CaseStudy,
        }
    }
}

/// A single assessment question.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Question {
    pub id: QuestionId,
    pub text: String,
    /// Maximum score; must be positive.
    pub points: u32,
    pub difficulty: Difficulty,
    pub blooms_level: BloomsLevel,
    /// Expected time to answer, in minutes.
    pub time_estimate_minutes: u32,
    #[serde(flatten)]
    pub body: QuestionBody,
}

impl Question {
    #[must_use]
    pub fn kind(&self) -> QuestionKind {
        self.body.kind()
    }

    /// Check the question against the model invariants for its kind.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.text.trim().is_empty() {
            return Err(ValidationError::EmptyText {
                question: self.id.clone(),
            });
        }
        if self.points == 0 {
            return Err(ValidationError::ZeroPoints {
                question: self.id.clone(),
            });
        }
        match &self.body {
            QuestionBody::MultipleChoice(body) => {
                if body.options.len() < 2 {
                    return Err(ValidationError::TooFewOptions {
                        question: self.id.clone(),
                        count: body.options.len(),
                    });
                }
                if !body.options.contains(&body.correct_answer) {
                    return Err(ValidationError::MissingCorrectOption {
                        question: self.id.clone(),
                    });
                }
            }
            QuestionBody::TrueFalse(_) => {}
            QuestionBody::FillInBlank(body) => {
                if body.correct_answers.is_empty() {
                    return Err(ValidationError::NoAcceptedAnswers {
                        question: self.id.clone(),
                    });
                }
            }
            QuestionBody::ShortAnswer(body) => {
                if body.sample_answer.trim().is_empty() {
                    return Err(ValidationError::EmptySampleAnswer {
                        question: self.id.clone(),
                    });
                }
            }
            QuestionBody::Essay(body) => {
                if let Some(rubric) = &body.rubric {
                    rubric.validate()?;
                    if rubric.total_points != self.points {
                        return Err(ValidationError::EssayPointsMismatch {
                            question: self.id.clone(),
                            rubric_total: rubric.total_points,
                            points: self.points,
                        });
                    }
                }
            }
            QuestionBody::CodingChallenge(body) => {
                if body.language.trim().is_empty() {
                    return Err(ValidationError::NoLanguage {
                        question: self.id.clone(),
                    });
                }
                if body.test_cases.is_empty() {
                    return Err(ValidationError::NoTestCases {
                        question: self.id.clone(),
                    });
                }
            }
            QuestionBody::Matching(body) => {
                if body.pairs.len() < 2 {
                    return Err(ValidationError::TooFewPairs {
                        question: self.id.clone(),
                        count: body.pairs.len(),
                    });
                }
            }
            QuestionBody::Ordering(body) => {
                if body.items.len() < 2 {
                    return Err(ValidationError::TooFewItems {
                        question: self.id.clone(),
                        count: body.items.len(),
                    });
                }
                if !is_permutation(&body.correct_order, body.items.len()) {
                    return Err(ValidationError::InvalidOrdering {
                        question: self.id.clone(),
                    });
                }
            }
            QuestionBody::CaseStudy(body) => {
                if body.sub_questions.is_empty() {
                    return Err(ValidationError::NoSubQuestions {
                        question: self.id.clone(),
                    });
                }
                for (index, sub) in body.sub_questions.iter().enumerate() {
                    if body.sub_questions[..index].iter().any(|s| s.id == sub.id) {
                        return Err(ValidationError::DuplicateSubQuestion {
                            question: self.id.clone(),
                            sub_id: sub.id.clone(),
                        });
                    }
                }
                let sum: u32 = body.sub_questions.iter().map(|s| s.points).sum();
                if sum != self.points {
                    return Err(ValidationError::SubQuestionPointsMismatch {
                        question: self.id.clone(),
                        expected: self.points,
                        actual: sum,
                    });
                }
            }
        }
        Ok(())
    }
}

fn is_permutation(order: &[usize], len: usize) -> bool {
    if order.len() != len {
        return false;
    }
    let mut seen = vec![false; len];
    for &index in order {
        if index >= len || seen[index] {
            return false;
        }
        seen[index] = true;
    }
    true
}

fn default_true() -> bool {
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn multiple_choice() -> Question {
        Question {
            id: QuestionId::from("q1"),
            text: "What is the capital of France?".into(),
            points: 5,
            difficulty: Difficulty::Easy,
            blooms_level: BloomsLevel::Remember,
            time_estimate_minutes: 1,
            body: QuestionBody::MultipleChoice(MultipleChoiceBody {
                options: vec!["Paris".into(), "Lyon".into(), "Nice".into()],
                correct_answer: "Paris".into(),
                explanation: Some("Paris has been the capital since 987.".into()),
            }),
        }
    }

    #[test]
    fn body_is_flattened_with_type_tag() {
        let value = serde_json::to_value(multiple_choice()).unwrap();
        assert_eq!(value["type"], "multiple_choice");
        assert_eq!(value["id"], "q1");
        assert_eq!(value["correct_answer"], "Paris");
        assert_eq!(value["points"], 5);
        assert_eq!(value["difficulty"], "easy");
        assert_eq!(value["blooms_level"], "remember");
    }

    #[test]
    fn question_deserializes_from_tagged_json() {
        let value = json!({
            "id": "q2",
            "type": "true_false",
            "text": "The Earth is flat.",
            "points": 2,
            "difficulty": "easy",
            "blooms_level": "remember",
            "time_estimate_minutes": 1,
            "correct_answer": false
        });
        let question: Question = serde_json::from_value(value).unwrap();
        assert_eq!(question.kind(), QuestionKind::TrueFalse);
        assert!(matches!(
            question.body,
            QuestionBody::TrueFalse(TrueFalseBody {
                correct_answer: false,
                ..
            })
        ));
    }

    #[test]
    fn round_trip_preserves_question() {
        let question = multiple_choice();
        let json = serde_json::to_string(&question).unwrap();
        let back: Question = serde_json::from_str(&json).unwrap();
        assert_eq!(back, question);
    }

    #[test]
    fn fill_in_blank_defaults_apply() {
        let value = json!({
            "id": "q3",
            "type": "fill_in_blank",
            "text": "The capital of France is ___.",
            "points": 3,
            "difficulty": "easy",
            "blooms_level": "remember",
            "time_estimate_minutes": 1,
            "correct_answers": ["Paris"]
        });
        let question: Question = serde_json::from_value(value).unwrap();
        let QuestionBody::FillInBlank(body) = &question.body else {
            panic!("expected fill-in-blank body");
        };
        assert!(!body.case_sensitive);
        assert!(body.allow_partial_credit);
    }

    #[test]
    fn zero_points_fails_validation() {
        let mut question = multiple_choice();
        question.points = 0;
        assert!(matches!(
            question.validate(),
            Err(ValidationError::ZeroPoints { .. })
        ));
    }

    #[test]
    fn correct_answer_must_be_an_option() {
        let mut question = multiple_choice();
        let QuestionBody::MultipleChoice(body) = &mut question.body else {
            unreachable!();
        };
        body.correct_answer = "Marseille".into();
        assert!(matches!(
            question.validate(),
            Err(ValidationError::MissingCorrectOption { .. })
        ));
    }

    #[test]
    fn ordering_must_be_a_permutation() {
        let question = Question {
            id: QuestionId::from("q4"),
            text: "Order the planets by distance from the sun.".into(),
            points: 4,
            difficulty: Difficulty::Medium,
            blooms_level: BloomsLevel::Understand,
            time_estimate_minutes: 2,
            body: QuestionBody::Ordering(OrderingBody {
                items: vec!["Venus".into(), "Mercury".into(), "Earth".into()],
                correct_order: vec![1, 0, 0],
            }),
        };
        assert!(matches!(
            question.validate(),
            Err(ValidationError::InvalidOrdering { .. })
        ));
    }

    #[test]
    fn case_study_points_must_sum() {
        let question = Question {
            id: QuestionId::from("q5"),
            text: "Read the scenario and answer.".into(),
            points: 10,
            difficulty: Difficulty::Hard,
            blooms_level: BloomsLevel::Analyze,
            time_estimate_minutes: 15,
            body: QuestionBody::CaseStudy(CaseStudyBody {
                scenario: "A service is timing out under load.".into(),
                sub_questions: vec![
                    SubQuestion {
                        id: "a".into(),
                        text: "Identify the bottleneck.".into(),
                        sample_answer: "Connection pool exhaustion.".into(),
                        points: 4,
                    },
                    SubQuestion {
                        id: "b".into(),
                        text: "Propose a fix.".into(),
                        sample_answer: "Raise pool size and add backpressure.".into(),
                        points: 4,
                    },
                ],
            }),
        };
        assert_eq!(
            question.validate(),
            Err(ValidationError::SubQuestionPointsMismatch {
                question: QuestionId::from("q5"),
                expected: 10,
                actual: 8
            })
        );
    }

    #[test]
    fn essay_rubric_total_must_match_points() {
        use crate::rubric::RubricCriterion;

        let question = Question {
            id: QuestionId::from("q6"),
            text: "Discuss the tradeoffs of eventual consistency.".into(),
            points: 20,
            difficulty: Difficulty::Expert,
            blooms_level: BloomsLevel::Evaluate,
            time_estimate_minutes: 30,
            body: QuestionBody::Essay(EssayBody {
                sample_answer: None,
                rubric: Some(Rubric::for_criteria(vec![RubricCriterion::new(
                    "Depth",
                    "Depth of analysis",
                    15,
                )])),
            }),
        };
        assert!(matches!(
            question.validate(),
            Err(ValidationError::EssayPointsMismatch {
                rubric_total: 15,
                points: 20,
                ..
            })
        ));
    }

    #[test]
    fn every_kind_has_a_stable_tag() {
        for kind in QuestionKind::ALL {
            let tag = serde_json::to_value(kind).unwrap();
            assert_eq!(tag, kind.as_str());
        }
    }
}
