//! Configuration for port calls.

use serde::{Deserialize, Serialize};

/// Settings applied to every content generation call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GenAiConfig {
    /// Model the backing service should use.
    pub model: String,
    /// Timeout for a single port call in seconds.
    pub timeout_seconds: u32,
    /// Maximum retries for failed generation calls.
    pub max_retries: u32,
}

impl Default for GenAiConfig {
    fn default() -> Self {
        Self {
            model: "gpt-4o".to_string(),
            timeout_seconds: 30,
            max_retries: 2,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn genai_config_default_values() {
        let config = GenAiConfig::default();

        assert_eq!(config.model, "gpt-4o");
        assert_eq!(config.timeout_seconds, 30);
        assert_eq!(config.max_retries, 2);
    }

    #[test]
    fn genai_config_serialization_roundtrip() {
        let config = GenAiConfig::default();
        let toml_str = toml::to_string(&config).expect("serialize to toml");
        let parsed: GenAiConfig = toml::from_str(&toml_str).expect("parse from toml");

        assert_eq!(config, parsed);
    }

    #[test]
    fn genai_config_partial_deserialize() {
        let toml_str = r#"
            timeout_seconds = 10
        "#;

        let config: GenAiConfig = toml::from_str(toml_str).expect("parse partial config");

        // Explicitly set values
        assert_eq!(config.timeout_seconds, 10);

        // Default values for unspecified fields
        assert_eq!(config.model, "gpt-4o");
        assert_eq!(config.max_retries, 2);
    }
}
