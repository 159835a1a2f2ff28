//! Port-backed generators for the structure, question and rubric steps.
//!
//! Each generator renders a prompt, calls the port within the configured
//! timeout, and retries failed calls up to `GenAiConfig::max_retries`. The
//! typed output is the contract; the prompt wording is not.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::warn;

use assay_core::{AssessmentInput, Question, QuestionCounts, QuestionId, Rubric};
use assay_genai::{
    ContentGenerator, ContentGeneratorExt, GenAiConfig, GenAiError, GenerationRequest,
    PromptTemplate, Result, VariableMap, with_timeout,
};

const STRUCTURE_TEMPLATE: &str = "\
Design the structure of a {{kind}} for {{audience}} on \"{{topic}}\" at
{{difficulty}} difficulty. It will contain {{total}} questions addressing
these learning objectives: {{objectives}}.

Reply with a JSON object holding \"title\", \"description\",
\"instructions\" and a \"section_outline\" array of section names.";

const QUESTIONS_TEMPLATE: &str = "\
Write {{count}} assessment questions on \"{{topic}}\" for {{audience}} at
{{difficulty}} difficulty, covering these learning objectives:
{{objectives}}.

Question kind mix: {{mix}}.

Reply with a JSON object holding a \"questions\" array. Every element
carries \"id\", \"text\", \"points\", \"difficulty\", \"blooms_level\",
\"time_estimate_minutes\", a snake_case \"type\" tag and the fields of
that kind.";

const RUBRIC_TEMPLATE: &str = "\
Write a scoring rubric worth exactly {{points}} points for this essay
question:

{{text}}

Reply with a JSON object holding \"total_points\" and a \"criteria\"
array. Each criterion carries \"name\", \"description\", \"points\" and
optionally a \"levels\" array of { \"score\", \"description\" } bands
ordered weakest to strongest, the strongest worth the criterion's full
points. Criterion points must sum to the total.";

/// Assessment skeleton produced by the structure step.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssessmentBlueprint {
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub instructions: String,
    #[serde(default)]
    pub section_outline: Vec<String>,
}

/// Decoded output of the question step.
#[derive(Debug, Clone, PartialEq)]
pub struct DraftQuestions {
    /// Questions that decoded cleanly, renumbered `q1, q2, ...`.
    pub questions: Vec<Question>,
    /// Items in the port reply before malformed entries were dropped.
    pub raw_count: usize,
}

/// Generates the assessment blueprint and the question set.
pub struct QuestionGenerator {
    generator: Arc<dyn ContentGenerator>,
    config: GenAiConfig,
}

impl QuestionGenerator {
    #[must_use]
    pub fn new(generator: Arc<dyn ContentGenerator>, config: GenAiConfig) -> Self {
        Self { generator, config }
    }

    /// Ask the port for the assessment skeleton.
    pub async fn blueprint(&self, input: &AssessmentInput) -> Result<AssessmentBlueprint> {
        let request = GenerationRequest::new(PromptTemplate::new(
            "assessment-structure",
            STRUCTURE_TEMPLATE,
        ))
        .with_variables(structure_variables(input));

        let mut attempt = 0;
        loop {
            let outcome = with_timeout(
                self.config.timeout_seconds,
                self.generator.generate_as(request.clone()),
            )
            .await;
            match outcome {
                Ok(blueprint) => return Ok(blueprint),
                Err(error) if attempt < self.config.max_retries => {
                    attempt += 1;
                    warn!(attempt, error = %error, "structure generation failed, retrying");
                }
                Err(error) => return Err(error),
            }
        }
    }

    /// Generate the requested questions.
    ///
    /// Malformed entries in the reply are dropped with a warning rather than
    /// failing the batch; surviving questions are truncated to the requested
    /// total and renumbered so their ids are unique and predictable.
    pub async fn generate(&self, input: &AssessmentInput) -> Result<DraftQuestions> {
        let request =
            GenerationRequest::new(PromptTemplate::new("question-batch", QUESTIONS_TEMPLATE))
                .with_variables(question_variables(input));

        let mut attempt = 0;
        let value = loop {
            let outcome = with_timeout(
                self.config.timeout_seconds,
                self.generator.generate(request.clone()),
            )
            .await;
            match outcome {
                Ok(value) => break value,
                Err(error) if attempt < self.config.max_retries => {
                    attempt += 1;
                    warn!(attempt, error = %error, "question generation failed, retrying");
                }
                Err(error) => return Err(error),
            }
        };

        let items = question_items(value);
        let raw_count = items.len();
        let mut questions: Vec<Question> = Vec::with_capacity(raw_count);
        for (index, item) in items.into_iter().enumerate() {
            match serde_json::from_value::<Question>(item) {
                Ok(question) => questions.push(question),
                Err(error) => {
                    warn!(index, error = %error, "dropping malformed generated question");
                }
            }
        }
        questions.truncate(input.question_counts.total);
        for (index, question) in questions.iter_mut().enumerate() {
            question.id = QuestionId::from(format!("q{}", index + 1));
        }
        Ok(DraftQuestions {
            questions,
            raw_count,
        })
    }
}

/// Generates rubrics for essay questions that arrive without one.
pub struct RubricGenerator {
    generator: Arc<dyn ContentGenerator>,
    config: GenAiConfig,
}

impl RubricGenerator {
    #[must_use]
    pub fn new(generator: Arc<dyn ContentGenerator>, config: GenAiConfig) -> Self {
        Self { generator, config }
    }

    /// Generate a validated rubric worth exactly the question's points.
    ///
    /// A structurally invalid rubric, or one whose total misses the
    /// question's points, counts as a failed attempt and is retried.
    pub async fn generate(&self, question: &Question) -> Result<Rubric> {
        let variables = VariableMap::new()
            .with("text", question.text.clone())
            .with("points", question.points);
        let request = GenerationRequest::new(PromptTemplate::new("essay-rubric", RUBRIC_TEMPLATE))
            .with_variables(variables);

        let mut attempt = 0;
        loop {
            match self.generate_once(question, &request).await {
                Ok(rubric) => return Ok(rubric),
                Err(error) if attempt < self.config.max_retries => {
                    attempt += 1;
                    warn!(
                        question_id = %question.id,
                        attempt,
                        error = %error,
                        "rubric generation failed, retrying"
                    );
                }
                Err(error) => return Err(error),
            }
        }
    }

    async fn generate_once(
        &self,
        question: &Question,
        request: &GenerationRequest,
    ) -> Result<Rubric> {
        let rubric: Rubric = with_timeout(
            self.config.timeout_seconds,
            self.generator.generate_as(request.clone()),
        )
        .await?;
        rubric
            .validate()
            .map_err(|error| GenAiError::Decode(error.to_string()))?;
        if rubric.total_points != question.points {
            return Err(GenAiError::Decode(format!(
                "rubric totals {} points but the question is worth {}",
                rubric.total_points, question.points
            )));
        }
        Ok(rubric)
    }
}

fn structure_variables(input: &AssessmentInput) -> VariableMap {
    VariableMap::new()
        .with("kind", input.kind.as_str())
        .with("audience", input.audience.clone())
        .with("topic", input.topic.clone())
        .with("difficulty", input.difficulty.as_str())
        .with("total", input.question_counts.total)
        .with("objectives", input.learning_objectives.join("; "))
}

fn question_variables(input: &AssessmentInput) -> VariableMap {
    VariableMap::new()
        .with("count", input.question_counts.total)
        .with("topic", input.topic.clone())
        .with("audience", input.audience.clone())
        .with("difficulty", input.difficulty.as_str())
        .with("objectives", input.learning_objectives.join("; "))
        .with("mix", kind_mix(&input.question_counts))
}

fn kind_mix(counts: &QuestionCounts) -> String {
    if counts.by_kind.is_empty() {
        "any mix of kinds".to_string()
    } else {
        counts
            .by_kind
            .iter()
            .map(|(kind, count)| format!("{}: {count}", kind.as_str()))
            .collect::<Vec<_>>()
            .join(", ")
    }
}

/// Ports answer either `{"questions": [...]}` or a bare array; accept both.
fn question_items(value: Value) -> Vec<Value> {
    match value {
        Value::Array(items) => items,
        Value::Object(mut map) => match map.remove("questions") {
            Some(Value::Array(items)) => items,
            _ => Vec::new(),
        },
        _ => Vec::new(),
    }
}
