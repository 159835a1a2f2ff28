//! Cohort analytics for graded assessments.
//!
//! Takes the graded results produced by `assay-grading` and turns them into
//! an [`AnalyticsReport`]: score aggregates, per-question difficulty
//! statistics with too-hard/too-easy flags, and narrative insights fetched
//! through the content generation port. Flagged questions can then be fed
//! back through [`AnalyticsEngine::suggest_optimizations`] for concrete
//! revision suggestions.
//!
//! ```text
//! graded results ──▶ AnalyticsEngine ──▶ AnalyticsReport ──▶ suggestions
//!                          │
//!                          └──▶ ContentGenerator (narrative sections)
//! ```
//!
//! Aggregation never fails: the numbers are pure functions of the results,
//! and the narrative sections degrade to fallbacks when the port is down.

pub mod config;
pub mod engine;
pub mod optimize;
pub mod report;

pub use config::AnalyticsConfig;
pub use engine::{AnalyticsEngine, REPORT_FALLBACK_RECOMMENDATION};
pub use optimize::{OptimizationAction, OptimizationSuggestion, Priority};
pub use report::{
    AnalyticsReport, AnalyticsRequest, QuestionAnalytics, QuestionFlag, ReportInsights,
    ReportSummary,
};
