//! Analytics configuration.

use serde::{Deserialize, Serialize};

/// Thresholds and budgets for report generation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalyticsConfig {
    /// A question whose difficulty index (proportion of attempts answered
    /// correctly) falls below this is flagged as too hard.
    pub hard_question_threshold: f64,
    /// A question whose difficulty index rises above this is flagged as too
    /// easy.
    pub easy_question_threshold: f64,
    /// Timeout for a single port call in seconds.
    pub port_timeout_seconds: u32,
}

impl Default for AnalyticsConfig {
    fn default() -> Self {
        Self {
            hard_question_threshold: 0.3,
            easy_question_threshold: 0.9,
            port_timeout_seconds: 30,
        }
    }
}
