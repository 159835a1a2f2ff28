//! Scoring rubrics for subjective questions.

use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

/// One achievement band within a rubric criterion.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RubricLevel {
    /// Points awarded when a response lands in this band.
    pub score: u32,
    pub description: String,
}

/// A single dimension along which a response is scored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RubricCriterion {
    pub name: String,
    pub description: String,
    /// Maximum points available on this criterion.
    pub points: u32,
    /// Optional achievement bands, ordered from weakest to strongest.
    #[serde(default)]
    pub levels: Vec<RubricLevel>,
}

impl RubricCriterion {
    #[must_use]
    pub fn new(name: impl Into<String>, description: impl Into<String>, points: u32) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            points,
            levels: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_levels(mut self, levels: Vec<RubricLevel>) -> Self {
        self.levels = levels;
        self
    }

    fn validate(&self) -> Result<(), ValidationError> {
        if self.name.trim().is_empty() {
            return Err(ValidationError::UnnamedCriterion);
        }
        let mut previous: Option<u32> = None;
        for level in &self.levels {
            if let Some(prev) = previous
                && level.score <= prev
            {
                return Err(ValidationError::RubricLevelOrder {
                    criterion: self.name.clone(),
                });
            }
            if level.score > self.points {
                return Err(ValidationError::RubricLevelCap {
                    criterion: self.name.clone(),
                    level_score: level.score,
                    points: self.points,
                });
            }
            previous = Some(level.score);
        }
        // The strongest band must award the full criterion points.
        if let Some(last) = self.levels.last()
            && last.score != self.points
        {
            return Err(ValidationError::RubricLevelTop {
                criterion: self.name.clone(),
                level_score: last.score,
                points: self.points,
            });
        }
        Ok(())
    }
}

/// A complete scoring rubric.
///
/// `total_points` is stored rather than derived so a rubric that arrives over
/// the wire can be checked for internal consistency; [`Rubric::validate`]
/// rejects any rubric whose criterion points do not sum to it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rubric {
    pub total_points: u32,
    pub criteria: Vec<RubricCriterion>,
}

impl Rubric {
    /// Build a rubric whose total is the sum of its criterion points.
    #[must_use]
    pub fn for_criteria(criteria: Vec<RubricCriterion>) -> Self {
        let total_points = criteria.iter().map(|c| c.points).sum();
        Self {
            total_points,
            criteria,
        }
    }

    #[must_use]
    pub fn criterion(&self, name: &str) -> Option<&RubricCriterion> {
        self.criteria.iter().find(|c| c.name == name)
    }

    /// Check structural invariants: at least one criterion, unique criterion
    /// names, points summing to `total_points`, and level scores strictly
    /// increasing up to exactly their criterion's points.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.criteria.is_empty() {
            return Err(ValidationError::EmptyRubric);
        }
        let sum: u32 = self.criteria.iter().map(|c| c.points).sum();
        if sum != self.total_points {
            return Err(ValidationError::RubricPointsMismatch {
                expected: self.total_points,
                actual: sum,
            });
        }
        for (index, criterion) in self.criteria.iter().enumerate() {
            criterion.validate()?;
            if self.criteria[..index].iter().any(|c| c.name == criterion.name) {
                return Err(ValidationError::DuplicateCriterion {
                    name: criterion.name.clone(),
                });
            }
        }
        Ok(())
    }
}
