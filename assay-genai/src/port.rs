//! The content generation port.
//!
//! All model-backed work in the toolkit flows through [`ContentGenerator`]:
//! structured generation (questions, rubrics, narratives) and response
//! grading. The trait is object safe so engines can hold an
//! `Arc<dyn ContentGenerator>`; typed decoding lives in the
//! [`ContentGeneratorExt`] extension trait.

use std::future::Future;
use std::time::Duration;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{GenAiError, Result};
use crate::template::{PromptTemplate, VariableMap};

/// A structured generation call: a template plus the variables to render it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerationRequest {
    pub template: PromptTemplate,
    pub variables: VariableMap,
}

impl GenerationRequest {
    #[must_use]
    pub fn new(template: PromptTemplate) -> Self {
        Self {
            template,
            variables: VariableMap::new(),
        }
    }

    #[must_use]
    pub fn with_variables(mut self, variables: VariableMap) -> Self {
        self.variables = variables;
        self
    }

    /// Render the prompt this request will send.
    pub fn rendered_prompt(&self) -> Result<String> {
        self.template.render(&self.variables)
    }
}

/// One answer put to the port for grading.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GradeRequest {
    /// Question kind as a snake_case string, e.g. `"short_answer"`.
    pub question_kind: String,
    pub question_text: String,
    pub student_answer: String,
    /// Reference answer the grader should compare against.
    pub sample_answer: Option<String>,
    /// Extra framing: rubric criterion, case-study scenario, key points.
    pub context: Option<String>,
    /// Upper bound for the returned score.
    pub max_score: f64,
}

impl GradeRequest {
    pub fn new(
        question_kind: impl Into<String>,
        question_text: impl Into<String>,
        student_answer: impl Into<String>,
        max_score: f64,
    ) -> Self {
        Self {
            question_kind: question_kind.into(),
            question_text: question_text.into(),
            student_answer: student_answer.into(),
            sample_answer: None,
            context: None,
            max_score,
        }
    }

    /// Set the reference answer.
    #[must_use]
    pub fn with_sample_answer(mut self, answer: impl Into<String>) -> Self {
        self.sample_answer = Some(answer.into());
        self
    }

    /// Set additional grading context.
    #[must_use]
    pub fn with_context(mut self, context: impl Into<String>) -> Self {
        self.context = Some(context.into());
        self
    }
}

/// What the port said about one graded answer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GradedResponse {
    pub score: f64,
    pub max_score: f64,
    pub is_correct: bool,
    /// Fraction of credit awarded, when between zero and full credit.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub partial_credit: Option<f64>,
    pub feedback: String,
    /// How the answer could be improved.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub improvement: Option<String>,
}

/// Boundary to the external model service.
///
/// Implementations must be cheap to share; engines clone an
/// `Arc<dyn ContentGenerator>` freely. The library ships
/// [`MockGenerator`](crate::mock::MockGenerator) for tests and offline use;
/// production backends live outside this workspace.
#[async_trait]
pub trait ContentGenerator: Send + Sync {
    /// Generate structured JSON content from a rendered prompt.
    async fn generate(&self, request: GenerationRequest) -> Result<Value>;

    /// Grade one student answer.
    async fn grade_response(&self, request: GradeRequest) -> Result<GradedResponse>;
}

/// Typed decoding on top of the object-safe [`ContentGenerator`].
#[async_trait]
pub trait ContentGeneratorExt: ContentGenerator {
    /// Generate content and decode it into `T`, failing with
    /// [`GenAiError::Decode`] when the output does not match the schema.
    async fn generate_as<T>(&self, request: GenerationRequest) -> Result<T>
    where
        T: DeserializeOwned + Send,
    {
        let value = self.generate(request).await?;
        serde_json::from_value(value).map_err(|err| GenAiError::Decode(err.to_string()))
    }
}

#[async_trait]
impl<G: ContentGenerator + ?Sized> ContentGeneratorExt for G {}

/// Await a port call, converting an elapsed deadline into
/// [`GenAiError::Timeout`].
pub async fn with_timeout<T>(
    timeout_seconds: u32,
    call: impl Future<Output = Result<T>> + Send,
) -> Result<T> {
    match tokio::time::timeout(Duration::from_secs(timeout_seconds.into()), call).await {
        Ok(result) => result,
        Err(_) => Err(GenAiError::Timeout(timeout_seconds)),
    }
}
