//! Student submissions and their response values.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::ids::{AssessmentId, QuestionId, StudentId, SubmissionId};

/// The answer a student gave to one question.
///
/// Serialized untagged: a JSON boolean becomes [`ResponseValue::Bool`], a
/// string becomes [`ResponseValue::Text`], and an object keyed by
/// sub-question id becomes [`ResponseValue::SubAnswers`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ResponseValue {
    Bool(bool),
    Text(String),
    SubAnswers(BTreeMap<String, String>),
}

impl ResponseValue {
    #[must_use]
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            ResponseValue::Bool(value) => Some(*value),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_text(&self) -> Option<&str> {
        match self {
            ResponseValue::Text(value) => Some(value),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_sub_answers(&self) -> Option<&BTreeMap<String, String>> {
        match self {
            ResponseValue::SubAnswers(map) => Some(map),
            _ => None,
        }
    }

    /// Render the response as plain text, whatever its shape. Used when
    /// passing answers to the content generation port.
    #[must_use]
    pub fn to_text_lossy(&self) -> String {
        match self {
            ResponseValue::Bool(value) => value.to_string(),
            ResponseValue::Text(value) => value.clone(),
            ResponseValue::SubAnswers(map) => map
                .iter()
                .map(|(id, answer)| format!("{id}: {answer}"))
                .collect::<Vec<_>>()
                .join("\n"),
        }
    }
}

impl From<bool> for ResponseValue {
    fn from(value: bool) -> Self {
        ResponseValue::Bool(value)
    }
}

impl From<&str> for ResponseValue {
    fn from(value: &str) -> Self {
        ResponseValue::Text(value.to_string())
    }
}

impl From<String> for ResponseValue {
    fn from(value: String) -> Self {
        ResponseValue::Text(value)
    }
}

impl From<BTreeMap<String, String>> for ResponseValue {
    fn from(map: BTreeMap<String, String>) -> Self {
        ResponseValue::SubAnswers(map)
    }
}

/// One question's answer inside a submission.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StudentResponse {
    pub question_id: QuestionId,
    pub response: ResponseValue,
}

/// Everything one student handed in for one assessment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StudentSubmission {
    pub submission_id: SubmissionId,
    pub student_id: StudentId,
    pub assessment_id: AssessmentId,
    pub responses: Vec<StudentResponse>,
    #[serde(default = "Utc::now")]
    pub submitted_at: DateTime<Utc>,
}

impl StudentSubmission {
    /// Find the response to a question, if the student answered it.
    #[must_use]
    pub fn response_for(&self, question_id: &QuestionId) -> Option<&ResponseValue> {
        self.responses
            .iter()
            .find(|r| &r.question_id == question_id)
            .map(|r| &r.response)
    }

    /// First question answered more than once, if any. Such submissions are
    /// ambiguous and rejected by the grading engine.
    #[must_use]
    pub fn duplicate_response(&self) -> Option<&QuestionId> {
        for (index, response) in self.responses.iter().enumerate() {
            if self.responses[..index]
                .iter()
                .any(|r| r.question_id == response.question_id)
            {
                return Some(&response.question_id);
            }
        }
        None
    }
}
