//! Generation progress tracking.
//!
//! Each `generate_assessment` call owns one [`GenerationProgress`] record in
//! a [`ProgressStore`]. The record exists only while the call runs: it is
//! created first, rewritten after every step transition, and discarded when
//! the call returns, successfully or not.

use std::collections::HashMap;
use std::fmt;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;
use tokio::sync::RwLock;

use assay_core::RequestId;

/// The five generation steps, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StepName {
    Structure,
    Questions,
    Rubrics,
    Validation,
    Compilation,
}

impl StepName {
    /// All steps in execution order.
    pub const ALL: [StepName; 5] = [
        StepName::Structure,
        StepName::Questions,
        StepName::Rubrics,
        StepName::Validation,
        StepName::Compilation,
    ];

    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            StepName::Structure => "structure",
            StepName::Questions => "questions",
            StepName::Rubrics => "rubrics",
            StepName::Validation => "validation",
            StepName::Compilation => "compilation",
        }
    }

    /// Human-readable description shown to progress pollers.
    #[must_use]
    pub fn label(&self) -> &'static str {
        match self {
            StepName::Structure => "Planning assessment structure",
            StepName::Questions => "Generating questions",
            StepName::Rubrics => "Building rubrics",
            StepName::Validation => "Validating questions",
            StepName::Compilation => "Compiling the assessment",
        }
    }
}

impl fmt::Display for StepName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Where one step currently stands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StepStatus {
    Pending,
    Running,
    Completed,
    Failed,
}

/// One step's live state within a generation run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerationStep {
    pub name: StepName,
    pub status: StepStatus,
    /// 0 pending, 50 running, 100 completed.
    pub progress: u8,
    /// Step output worth surfacing to a poller, e.g. the blueprint title or
    /// the generated question count.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl GenerationStep {
    fn pending(name: StepName) -> Self {
        Self {
            name,
            status: StepStatus::Pending,
            progress: 0,
            result: None,
            error: None,
        }
    }
}

/// Live view of one generation run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerationProgress {
    pub request_id: RequestId,
    pub steps: [GenerationStep; 5],
    /// Index into `steps` of the currently running step.
    pub current_step: Option<usize>,
    pub started_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl GenerationProgress {
    /// Fresh record with every step pending.
    #[must_use]
    pub fn new(request_id: RequestId) -> Self {
        let now = Utc::now();
        Self {
            request_id,
            steps: StepName::ALL.map(GenerationStep::pending),
            current_step: None,
            started_at: now,
            updated_at: now,
        }
    }

    /// Overall progress as a percentage of completed steps.
    #[must_use]
    pub fn overall_progress(&self) -> u8 {
        let completed = self
            .steps
            .iter()
            .filter(|step| step.status == StepStatus::Completed)
            .count();
        (completed * 100 / self.steps.len()) as u8
    }

    pub fn start_step(&mut self, name: StepName) {
        if let Some(index) = self.index_of(name) {
            let step = &mut self.steps[index];
            step.status = StepStatus::Running;
            step.progress = 50;
            self.current_step = Some(index);
            self.updated_at = Utc::now();
        }
    }

    pub fn complete_step(&mut self, name: StepName, result: Option<Value>) {
        if let Some(index) = self.index_of(name) {
            let step = &mut self.steps[index];
            step.status = StepStatus::Completed;
            step.progress = 100;
            step.result = result;
            self.current_step = None;
            self.updated_at = Utc::now();
        }
    }

    pub fn fail_step(&mut self, name: StepName, error: impl Into<String>) {
        if let Some(index) = self.index_of(name) {
            let step = &mut self.steps[index];
            step.status = StepStatus::Failed;
            step.error = Some(error.into());
            self.current_step = None;
            self.updated_at = Utc::now();
        }
    }

    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.steps
            .iter()
            .all(|step| step.status == StepStatus::Completed)
    }

    #[must_use]
    pub fn has_failed(&self) -> bool {
        self.steps
            .iter()
            .any(|step| step.status == StepStatus::Failed)
    }

    fn index_of(&self, name: StepName) -> Option<usize> {
        self.steps.iter().position(|step| step.name == name)
    }
}

/// A progress store operation failed.
#[derive(Debug, Error)]
pub enum ProgressError {
    /// No record exists for the request.
    #[error("no progress recorded for request {0}")]
    NotFound(RequestId),

    /// The backing store failed.
    #[error("progress store failure: {0}")]
    Store(String),
}

/// Where generation progress lives while a run is in flight.
///
/// The pipeline creates one record per run, rewrites it on every step
/// transition, and discards it when the run ends.
/// [`InMemoryProgressStore`] is the shipped implementation; deployments
/// that poll progress from another process supply their own.
#[async_trait]
pub trait ProgressStore: Send + Sync {
    /// Insert a fresh record.
    async fn create(&self, progress: GenerationProgress) -> Result<(), ProgressError>;

    /// Replace the record for `progress.request_id`.
    async fn update(&self, progress: GenerationProgress) -> Result<(), ProgressError>;

    /// Fetch the record for a request, `None` once discarded.
    async fn get(
        &self,
        request_id: RequestId,
    ) -> Result<Option<GenerationProgress>, ProgressError>;

    /// Drop the record for a request. Discarding an unknown request is not
    /// an error.
    async fn discard(&self, request_id: RequestId) -> Result<(), ProgressError>;
}

/// Keeps progress in a shared map; the store for single-process use.
#[derive(Default)]
pub struct InMemoryProgressStore {
    records: RwLock<HashMap<RequestId, GenerationProgress>>,
}

impl InMemoryProgressStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ProgressStore for InMemoryProgressStore {
    async fn create(&self, progress: GenerationProgress) -> Result<(), ProgressError> {
        self.records
            .write()
            .await
            .insert(progress.request_id, progress);
        Ok(())
    }

    async fn update(&self, progress: GenerationProgress) -> Result<(), ProgressError> {
        let mut records = self.records.write().await;
        if !records.contains_key(&progress.request_id) {
            return Err(ProgressError::NotFound(progress.request_id));
        }
        records.insert(progress.request_id, progress);
        Ok(())
    }

    async fn get(
        &self,
        request_id: RequestId,
    ) -> Result<Option<GenerationProgress>, ProgressError> {
        Ok(self.records.read().await.get(&request_id).cloned())
    }

    async fn discard(&self, request_id: RequestId) -> Result<(), ProgressError> {
        self.records.write().await.remove(&request_id);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn new_progress_has_five_pending_steps() {
        let progress = GenerationProgress::new(RequestId::new());
        assert_eq!(progress.steps.len(), 5);
        assert!(
            progress
                .steps
                .iter()
                .all(|s| s.status == StepStatus::Pending && s.progress == 0)
        );
        assert_eq!(progress.steps[0].name, StepName::Structure);
        assert_eq!(progress.steps[4].name, StepName::Compilation);
        assert_eq!(progress.overall_progress(), 0);
        assert!(progress.current_step.is_none());
        assert!(!progress.is_complete());
        assert!(!progress.has_failed());
    }

    #[test]
    fn step_transitions_move_overall_progress() {
        let mut progress = GenerationProgress::new(RequestId::new());

        progress.start_step(StepName::Structure);
        assert_eq!(progress.current_step, Some(0));
        assert_eq!(progress.steps[0].status, StepStatus::Running);
        assert_eq!(progress.steps[0].progress, 50);
        assert_eq!(progress.overall_progress(), 0);

        progress.complete_step(StepName::Structure, Some(json!({ "title": "Caching" })));
        assert_eq!(progress.current_step, None);
        assert_eq!(progress.overall_progress(), 20);
        assert_eq!(progress.steps[0].result, Some(json!({ "title": "Caching" })));

        for step in [
            StepName::Questions,
            StepName::Rubrics,
            StepName::Validation,
            StepName::Compilation,
        ] {
            progress.start_step(step);
            progress.complete_step(step, None);
        }
        assert_eq!(progress.overall_progress(), 100);
        assert!(progress.is_complete());
    }

    #[test]
    fn failing_a_step_records_the_error() {
        let mut progress = GenerationProgress::new(RequestId::new());
        progress.start_step(StepName::Questions);
        progress.fail_step(StepName::Questions, "port call timed out after 30 seconds");

        assert!(progress.has_failed());
        assert!(!progress.is_complete());
        assert_eq!(progress.current_step, None);
        assert_eq!(progress.steps[1].status, StepStatus::Failed);
        assert_eq!(
            progress.steps[1].error.as_deref(),
            Some("port call timed out after 30 seconds")
        );
    }

    #[test]
    fn progress_serializes_with_snake_case_names() {
        let progress = GenerationProgress::new(RequestId::new());
        let value = serde_json::to_value(&progress).unwrap();
        assert_eq!(value["steps"][0]["name"], "structure");
        assert_eq!(value["steps"][0]["status"], "pending");
        // Empty result and error fields stay off the wire.
        assert!(value["steps"][0].get("result").is_none());
    }

    #[tokio::test]
    async fn in_memory_store_lifecycle() {
        let store = InMemoryProgressStore::new();
        let mut progress = GenerationProgress::new(RequestId::new());
        let request_id = progress.request_id;

        store.create(progress.clone()).await.unwrap();
        let fetched = store.get(request_id).await.unwrap().unwrap();
        assert_eq!(fetched.overall_progress(), 0);

        progress.start_step(StepName::Structure);
        progress.complete_step(StepName::Structure, None);
        store.update(progress.clone()).await.unwrap();
        let fetched = store.get(request_id).await.unwrap().unwrap();
        assert_eq!(fetched.overall_progress(), 20);

        store.discard(request_id).await.unwrap();
        assert!(store.get(request_id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn updating_an_unknown_request_is_an_error() {
        let store = InMemoryProgressStore::new();
        let progress = GenerationProgress::new(RequestId::new());
        let err = store.update(progress).await.unwrap_err();
        assert!(matches!(err, ProgressError::NotFound(_)));
    }

    #[tokio::test]
    async fn discarding_an_unknown_request_is_fine() {
        let store = InMemoryProgressStore::new();
        assert!(store.discard(RequestId::new()).await.is_ok());
    }
}
