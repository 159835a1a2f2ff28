//! Prompt templates with `{{variable}}` placeholders.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{GenAiError, Result};

/// Named bag of values substituted into a template.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct VariableMap(BTreeMap<String, Value>);

impl VariableMap {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a variable, builder style.
    #[must_use]
    pub fn with(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.0.insert(name.into(), value.into());
        self
    }

    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<Value>) {
        self.0.insert(name.into(), value.into());
    }

    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.0.get(name)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// A prompt with `{{variable}}` placeholders.
///
/// Rendering is strict: every placeholder must have a value in the
/// [`VariableMap`], and stray `{{` without a closing `}}` is an error.
/// Failures surface before any port call is made.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PromptTemplate {
    name: String,
    text: String,
}

impl PromptTemplate {
    #[must_use]
    pub fn new(name: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            text: text.into(),
        }
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Substitute every placeholder with its variable value.
    ///
    /// String values are inserted verbatim; other JSON values are inserted
    /// in their compact JSON form.
    pub fn render(&self, variables: &VariableMap) -> Result<String> {
        let mut rendered = String::with_capacity(self.text.len());
        let mut rest = self.text.as_str();
        while let Some(start) = rest.find("{{") {
            rendered.push_str(&rest[..start]);
            let after = &rest[start + 2..];
            let Some(end) = after.find("}}") else {
                return Err(GenAiError::Template {
                    template: self.name.clone(),
                    message: "unclosed '{{' placeholder".into(),
                });
            };
            let variable = after[..end].trim();
            let value = variables
                .get(variable)
                .ok_or_else(|| GenAiError::MissingVariable {
                    template: self.name.clone(),
                    variable: variable.to_string(),
                })?;
            match value {
                Value::String(text) => rendered.push_str(text),
                other => rendered.push_str(&other.to_string()),
            }
            rest = &after[end + 2..];
        }
        rendered.push_str(rest);
        Ok(rendered)
    }
}
