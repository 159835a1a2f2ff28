//! Scriptable in-memory implementation of the content generation port.
//!
//! Tests (and offline runs) script replies in advance; each call pops the
//! next one. The mock also records call counts, the last rendered prompt,
//! and the highest number of in-flight calls it ever saw, which is how the
//! grading tests assert the windowed concurrency limit.

use std::collections::VecDeque;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;

use crate::error::{GenAiError, Result};
use crate::port::{ContentGenerator, GenerationRequest, GradeRequest, GradedResponse};

/// Scriptable test double for [`ContentGenerator`].
#[derive(Debug, Default)]
pub struct MockGenerator {
    generations: Mutex<VecDeque<Result<Value>>>,
    grades: Mutex<VecDeque<Result<GradedResponse>>>,
    /// When set, unscripted grade calls succeed at this fraction of
    /// `max_score` instead of erroring.
    default_grade_ratio: Option<f64>,
    /// Artificial per-call delay, for exercising timeout and concurrency
    /// behavior under `tokio::time::pause`.
    latency: Option<Duration>,
    generation_calls: AtomicUsize,
    grade_calls: AtomicUsize,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
    last_prompt: Mutex<Option<String>>,
}

impl MockGenerator {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Make unscripted grade calls succeed at `ratio` of the requested
    /// maximum score.
    #[must_use]
    pub fn with_default_grade(mut self, ratio: f64) -> Self {
        self.default_grade_ratio = Some(ratio);
        self
    }

    /// Delay every call by `latency`.
    #[must_use]
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = Some(latency);
        self
    }

    /// Script the next generation reply.
    pub fn push_generation(&self, value: Value) {
        self.generations.lock().unwrap().push_back(Ok(value));
    }

    /// Script the next generation call to fail.
    pub fn push_generation_error(&self, error: GenAiError) {
        self.generations.lock().unwrap().push_back(Err(error));
    }

    /// Script the next grade reply.
    pub fn push_grade(&self, graded: GradedResponse) {
        self.grades.lock().unwrap().push_back(Ok(graded));
    }

    /// Script the next grade call to fail.
    pub fn push_grade_error(&self, error: GenAiError) {
        self.grades.lock().unwrap().push_back(Err(error));
    }

    #[must_use]
    pub fn generation_calls(&self) -> usize {
        self.generation_calls.load(Ordering::SeqCst)
    }

    #[must_use]
    pub fn grade_calls(&self) -> usize {
        self.grade_calls.load(Ordering::SeqCst)
    }

    /// Highest number of calls that were ever in flight at once.
    #[must_use]
    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }

    /// The prompt rendered by the most recent generation call.
    #[must_use]
    pub fn last_prompt(&self) -> Option<String> {
        self.last_prompt.lock().unwrap().clone()
    }

    async fn enter(&self) {
        let current = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(current, Ordering::SeqCst);
        if let Some(latency) = self.latency {
            tokio::time::sleep(latency).await;
        }
    }

    fn exit(&self) {
        self.in_flight.fetch_sub(1, Ordering::SeqCst);
    }
}

#[async_trait]
impl ContentGenerator for MockGenerator {
    async fn generate(&self, request: GenerationRequest) -> Result<Value> {
        self.generation_calls.fetch_add(1, Ordering::SeqCst);
        let prompt = request.rendered_prompt()?;
        *self.last_prompt.lock().unwrap() = Some(prompt);
        self.enter().await;
        self.exit();
        self.generations
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| {
                Err(GenAiError::Generation(format!(
                    "no scripted reply for template '{}'",
                    request.template.name()
                )))
            })
    }

    async fn grade_response(&self, request: GradeRequest) -> Result<GradedResponse> {
        self.grade_calls.fetch_add(1, Ordering::SeqCst);
        self.enter().await;
        self.exit();
        let scripted = self.grades.lock().unwrap().pop_front();
        match scripted {
            Some(reply) => reply,
            None => match self.default_grade_ratio {
                Some(ratio) => {
                    let score = request.max_score * ratio;
                    Ok(GradedResponse {
                        score,
                        max_score: request.max_score,
                        is_correct: ratio >= 1.0,
                        partial_credit: (ratio > 0.0 && ratio < 1.0).then_some(ratio),
                        feedback: "Covers the main points of the expected answer".into(),
                        improvement: None,
                    })
                }
                None => Err(GenAiError::Grading("no scripted grade".into())),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::template::PromptTemplate;
    use futures::future::join_all;
    use serde_json::json;
    use std::sync::Arc;

    fn request(name: &str) -> GenerationRequest {
        GenerationRequest::new(PromptTemplate::new(name, "prompt text"))
    }

    #[tokio::test]
    async fn scripted_replies_pop_in_order() {
        let mock = MockGenerator::new();
        mock.push_generation(json!({"first": 1}));
        mock.push_generation(json!({"second": 2}));

        let first = mock.generate(request("a")).await.unwrap();
        let second = mock.generate(request("b")).await.unwrap();
        assert_eq!(first["first"], 1);
        assert_eq!(second["second"], 2);
        assert_eq!(mock.generation_calls(), 2);
    }

    #[tokio::test]
    async fn unscripted_generation_fails() {
        let mock = MockGenerator::new();
        let err = mock.generate(request("outline")).await.unwrap_err();
        assert!(matches!(err, GenAiError::Generation(_)));
    }

    #[tokio::test]
    async fn default_grade_applies_when_queue_is_empty() {
        let mock = MockGenerator::new().with_default_grade(0.8);
        let graded = mock
            .grade_response(GradeRequest::new("short_answer", "Define TTL.", "answer", 10.0))
            .await
            .unwrap();
        assert_eq!(graded.score, 8.0);
        assert!(!graded.is_correct);
        assert_eq!(graded.partial_credit, Some(0.8));
    }

    #[tokio::test]
    async fn scripted_grade_takes_precedence_over_default() {
        let mock = MockGenerator::new().with_default_grade(0.8);
        mock.push_grade(GradedResponse {
            score: 10.0,
            max_score: 10.0,
            is_correct: true,
            partial_credit: None,
            feedback: "Perfect".into(),
            improvement: None,
        });
        let graded = mock
            .grade_response(GradeRequest::new("short_answer", "Define TTL.", "answer", 10.0))
            .await
            .unwrap();
        assert!(graded.is_correct);
        assert_eq!(mock.grade_calls(), 1);
    }

    #[tokio::test]
    async fn last_prompt_records_rendered_text() {
        let mock = MockGenerator::new();
        mock.push_generation(json!(null));
        mock.generate(request("outline")).await.unwrap();
        assert_eq!(mock.last_prompt().as_deref(), Some("prompt text"));
    }

    #[tokio::test(start_paused = true)]
    async fn max_in_flight_tracks_concurrency() {
        let mock = Arc::new(MockGenerator::new().with_latency(Duration::from_millis(50)));
        for _ in 0..3 {
            mock.push_generation(json!(null));
        }

        let calls = (0..3).map(|_| {
            let mock = Arc::clone(&mock);
            async move { mock.generate(request("parallel")).await }
        });
        let results = join_all(calls).await;

        assert!(results.into_iter().all(|r| r.is_ok()));
        assert_eq!(mock.max_in_flight(), 3);
    }
}
