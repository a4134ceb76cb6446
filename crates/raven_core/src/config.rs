//! Generator configuration.
//!
//! Loaded from JSON; every field is optional and falls back to
//! [`GeneratorConfig::default`].
//!
//! ```json
//! {
//!   "active_attributes": ["shape", "count"],
//!   "rule_weights": { "constant": 1.0, "progression": 1.0 },
//!   "strict_columns": false,
//!   "distractor_count": 5,
//!   "random_seed": 42
//! }
//! ```

use crate::attribute::Attribute;
use crate::error::RavenError;
use crate::rule::RuleKindTag;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;
use thiserror::Error;

/// Most layers an element may stack.
pub const MAX_LAYERS: usize = 3;

/// Knobs consumed by the composer and distractor generator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct GeneratorConfig {
    /// Attributes governed by a rule. The rest are held fixed per problem.
    pub active_attributes: BTreeSet<Attribute>,
    /// Sampling weight per rule kind. Kinds left out are never drawn.
    pub rule_weights: BTreeMap<RuleKindTag, f64>,
    /// Require every column to follow the rules as well.
    pub strict_columns: bool,
    pub distractor_count: usize,
    pub random_seed: u64,
    /// Attempt budget shared by composition and each distractor.
    pub retry_budget: usize,
    /// Primitive layers per element.
    pub layers: usize,
    /// Weight per attribute when picking the slot a distractor violates.
    /// Attributes left out weigh 1.0.
    pub distractor_weights: BTreeMap<Attribute, f64>,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            active_attributes: [Attribute::Shape, Attribute::Count, Attribute::Size]
                .into_iter()
                .collect(),
            rule_weights: RuleKindTag::ALL.into_iter().map(|t| (t, 1.0)).collect(),
            strict_columns: false,
            distractor_count: 7,
            random_seed: 0,
            retry_budget: 200,
            layers: 1,
            distractor_weights: BTreeMap::new(),
        }
    }
}

impl GeneratorConfig {
    pub fn with_seed(&self, seed: u64) -> Self {
        Self {
            random_seed: seed,
            ..self.clone()
        }
    }

    pub fn rule_weight(&self, tag: RuleKindTag) -> f64 {
        self.rule_weights.get(&tag).copied().unwrap_or(0.0)
    }

    pub fn distractor_weight(&self, attribute: Attribute) -> f64 {
        self.distractor_weights.get(&attribute).copied().unwrap_or(1.0)
    }

    /// Active attributes in canonical order.
    pub fn active(&self) -> Vec<Attribute> {
        self.active_attributes.iter().copied().collect()
    }

    /// Check that generation can succeed in principle.
    pub fn validate(&self) -> Result<(), RavenError> {
        let invalid = |msg: String| -> Result<(), RavenError> { Err(RavenError::InvalidConfig(msg)) };

        if self.active_attributes.is_empty() {
            return invalid("no active attributes".into());
        }
        if self.layers == 0 || self.layers > MAX_LAYERS {
            return invalid(format!("layers must be in 1..={}, got {}", MAX_LAYERS, self.layers));
        }
        if self.retry_budget == 0 {
            return invalid("retry_budget must be at least 1".into());
        }
        if self.distractor_count == 0 {
            return invalid("distractor_count must be at least 1".into());
        }
        for (tag, &weight) in &self.rule_weights {
            if !weight.is_finite() || weight < 0.0 {
                return invalid(format!("rule weight for {} is {}", tag, weight));
            }
        }
        for (attribute, &weight) in &self.distractor_weights {
            if !weight.is_finite() || weight < 0.0 {
                return invalid(format!("distractor weight for {} is {}", attribute, weight));
            }
        }
        for &attribute in &self.active_attributes {
            let drawable = RuleKindTag::ALL
                .iter()
                .any(|&tag| tag.applies_to(attribute) && self.rule_weight(tag) > 0.0);
            if !drawable {
                return invalid(format!("no rule kind with positive weight fits {}", attribute));
            }
        }

        // Each distractor changes one active slot to one of its other values.
        let capacity: usize = self
            .active_attributes
            .iter()
            .filter(|&&a| self.distractor_weight(a) > 0.0)
            .map(|a| (a.domain_size() as usize - 1) * self.layers)
            .sum();
        if capacity == 0 {
            return invalid("every active attribute has distractor weight 0".into());
        }
        if self.distractor_count > capacity {
            return invalid(format!(
                "distractor_count {} exceeds the {} single-slot variants available",
                self.distractor_count, capacity
            ));
        }
        Ok(())
    }

    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Read and validate a JSON config file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json_str(&text)
    }
}

/// Errors from loading a configuration file.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse config: {0}")]
    Parse(#[from] serde_json::Error),
    #[error(transparent)]
    Invalid(#[from] RavenError),
}
