//! Code execution seam for coding-challenge grading.
//!
//! Real sandboxed execution is outside this workspace; graders depend on the
//! [`CodeExecutor`] trait and the library ships two stand-ins. Both report
//! [`ExecutionMode::Simulated`] so their results are never mistaken for a
//! real run, and the grading strategy surfaces that mode in its feedback.

use std::collections::VecDeque;
use std::sync::Mutex;

use async_trait::async_trait;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use assay_core::CodingChallengeBody;

/// How the test outcomes were produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExecutionMode {
    /// Outcomes were fabricated without running the code.
    Simulated,
    /// Outcomes came from running the code in a sandbox.
    Sandboxed,
}

/// Outcome of one test case.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TestOutcome {
    pub passed: bool,
    /// What the program printed, when the executor captured it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output: Option<String>,
}

/// Result of running a submission against a challenge's test cases.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExecutionReport {
    /// One outcome per test case, in challenge order.
    pub outcomes: Vec<TestOutcome>,
    pub mode: ExecutionMode,
}

impl ExecutionReport {
    #[must_use]
    pub fn passed_count(&self) -> usize {
        self.outcomes.iter().filter(|o| o.passed).count()
    }

    #[must_use]
    pub fn total(&self) -> usize {
        self.outcomes.len()
    }

    #[must_use]
    pub fn all_passed(&self) -> bool {
        self.outcomes.iter().all(|o| o.passed)
    }

    #[must_use]
    pub fn is_simulated(&self) -> bool {
        self.mode == ExecutionMode::Simulated
    }
}

/// Error type for code execution.
#[derive(Debug, Error)]
pub enum ExecutionError {
    /// The execution environment could not be reached.
    #[error("Execution environment unavailable: {0}")]
    Unavailable(String),

    /// The submission exceeded its execution time budget.
    #[error("Execution timed out after {0} seconds")]
    Timeout(u32),
}

/// Runs a submission against a challenge's test cases.
#[async_trait]
pub trait CodeExecutor: Send + Sync {
    /// Must return exactly one outcome per test case, in order.
    async fn execute(
        &self,
        challenge: &CodingChallengeBody,
        code: &str,
    ) -> Result<ExecutionReport, ExecutionError>;
}

/// Stand-in executor that fabricates pass/fail outcomes at a configured
/// rate without running any code.
#[derive(Debug)]
pub struct SimulatedExecutor {
    pass_probability: f64,
    rng: Mutex<StdRng>,
}

impl SimulatedExecutor {
    #[must_use]
    pub fn new(pass_probability: f64) -> Self {
        Self {
            pass_probability: pass_probability.clamp(0.0, 1.0),
            rng: Mutex::new(StdRng::from_entropy()),
        }
    }

    /// Seeded variant for reproducible runs.
    #[must_use]
    pub fn with_seed(pass_probability: f64, seed: u64) -> Self {
        Self {
            pass_probability: pass_probability.clamp(0.0, 1.0),
            rng: Mutex::new(StdRng::seed_from_u64(seed)),
        }
    }
}

impl Default for SimulatedExecutor {
    fn default() -> Self {
        Self::new(0.7)
    }
}

#[async_trait]
impl CodeExecutor for SimulatedExecutor {
    async fn execute(
        &self,
        challenge: &CodingChallengeBody,
        _code: &str,
    ) -> Result<ExecutionReport, ExecutionError> {
        let mut rng = self.rng.lock().unwrap();
        let outcomes = challenge
            .test_cases
            .iter()
            .map(|_| TestOutcome {
                passed: rng.gen_bool(self.pass_probability),
                output: None,
            })
            .collect();
        Ok(ExecutionReport {
            outcomes,
            mode: ExecutionMode::Simulated,
        })
    }
}

/// Executor whose outcomes are scripted in advance, one pattern per call.
///
/// A pattern shorter than the test-case list is padded with its `fill`
/// value; with no patterns queued every case gets `fill`.
#[derive(Debug)]
pub struct ScriptedExecutor {
    patterns: Mutex<VecDeque<Vec<bool>>>,
    fill: bool,
}

impl ScriptedExecutor {
    #[must_use]
    pub fn passing() -> Self {
        Self {
            patterns: Mutex::new(VecDeque::new()),
            fill: true,
        }
    }

    #[must_use]
    pub fn failing() -> Self {
        Self {
            patterns: Mutex::new(VecDeque::new()),
            fill: false,
        }
    }

    /// Queue the pass/fail pattern for the next call.
    pub fn push_pattern(&self, pattern: Vec<bool>) {
        self.patterns.lock().unwrap().push_back(pattern);
    }
}

#[async_trait]
impl CodeExecutor for ScriptedExecutor {
    async fn execute(
        &self,
        challenge: &CodingChallengeBody,
        _code: &str,
    ) -> Result<ExecutionReport, ExecutionError> {
        let pattern = self.patterns.lock().unwrap().pop_front().unwrap_or_default();
        let outcomes = (0..challenge.test_cases.len())
            .map(|index| TestOutcome {
                passed: pattern.get(index).copied().unwrap_or(self.fill),
                output: None,
            })
            .collect();
        Ok(ExecutionReport {
            outcomes,
            mode: ExecutionMode::Simulated,
        })
    }
}
