//! Pipeline configuration.
//!
//! One [`PipelineConfig`] covers every stage, with a TOML section per crate:
//!
//! ```toml
//! [genai]
//! model = "gpt-4o"
//!
//! [grading]
//! concurrency = 3
//!
//! [analytics]
//! hard_question_threshold = 0.3
//!
//! [generation]
//! max_questions = 50
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};

use assay_analytics::AnalyticsConfig;
use assay_genai::GenAiConfig;
use assay_grading::GradingConfig;

use crate::error::{PipelineError, Result};

/// Knobs for the generation phase.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GenerationConfig {
    /// Upper bound on questions per assessment.
    pub max_questions: usize,
    /// Rate each generated question through the port after compilation.
    pub quality_analysis: bool,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            max_questions: 50,
            quality_analysis: true,
        }
    }
}

/// Top-level configuration covering every stage of the pipeline.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    pub genai: GenAiConfig,
    pub grading: GradingConfig,
    pub analytics: AnalyticsConfig,
    pub generation: GenerationConfig,
}

impl PipelineConfig {
    /// Load configuration from a TOML file, falling back to defaults when
    /// the file does not exist.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let content =
            std::fs::read_to_string(path).map_err(|e| PipelineError::Config(e.to_string()))?;
        toml::from_str(&content).map_err(|e| PipelineError::Config(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn generation_config_default_values() {
        let config = GenerationConfig::default();

        assert_eq!(config.max_questions, 50);
        assert!(config.quality_analysis);
    }

    #[test]
    fn pipeline_config_nests_every_stage() {
        let config = PipelineConfig::default();

        assert_eq!(config.genai.model, "gpt-4o");
        assert_eq!(config.grading.concurrency, 3);
        assert_eq!(config.analytics.hard_question_threshold, 0.3);
        assert_eq!(config.generation.max_questions, 50);
    }

    #[test]
    fn pipeline_config_partial_deserialize() {
        let toml_str = r#"
            [generation]
            max_questions = 10
            quality_analysis = false

            [grading]
            concurrency = 1
        "#;

        let config: PipelineConfig = toml::from_str(toml_str).expect("parse partial config");

        // Explicitly set values
        assert_eq!(config.generation.max_questions, 10);
        assert!(!config.generation.quality_analysis);
        assert_eq!(config.grading.concurrency, 1);

        // Default values for unspecified fields
        assert_eq!(config.genai.max_retries, 2);
        assert_eq!(config.analytics.easy_question_threshold, 0.9);
        assert_eq!(config.grading.passing_threshold_pct, 60.0);
    }

    #[test]
    fn pipeline_config_serialization_roundtrip() {
        let config = PipelineConfig::default();
        let toml_str = toml::to_string(&config).expect("serialize to toml");
        let parsed: PipelineConfig = toml::from_str(&toml_str).expect("parse from toml");

        assert_eq!(config, parsed);
    }

    #[test]
    fn load_falls_back_to_defaults_for_missing_files() {
        let config = PipelineConfig::load(Path::new("/nonexistent/assay.toml")).unwrap();
        assert_eq!(config, PipelineConfig::default());
    }

    #[test]
    fn load_reads_a_config_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("assay.toml");
        std::fs::write(&path, "[generation]\nmax_questions = 12\n").unwrap();

        let config = PipelineConfig::load(&path).unwrap();
        assert_eq!(config.generation.max_questions, 12);
        assert!(config.generation.quality_analysis);
    }

    #[test]
    fn load_reports_malformed_files() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("assay.toml");
        std::fs::write(&path, "generation = \"not a table\"").unwrap();

        let err = PipelineConfig::load(&path).unwrap_err();
        assert!(matches!(err, PipelineError::Config(_)));
    }
}
