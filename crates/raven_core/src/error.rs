//! Error type shared by every generation stage.

use crate::attribute::Attribute;
use thiserror::Error;

/// Errors raised while building elements, applying rules or generating problems.
///
/// `DomainOverflow` and `RuleNotApplicable` are retried inside the composer's
/// bounded loops; only the two exhaustion variants escape generation.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum RavenError {
    #[error("value {value} is outside the domain of {attribute}")]
    InvalidAttributeValue { attribute: Attribute, value: u8 },

    #[error("layer {layer} has no value for {attribute}")]
    MissingAttribute { layer: usize, attribute: Attribute },

    #[error("element has no layers")]
    EmptyElement,

    #[error("layer {layer} is missing; layer indices must be contiguous from 0")]
    MissingLayer { layer: usize },

    #[error("rule on {attribute} leaves the domain: {detail}")]
    DomainOverflow { attribute: Attribute, detail: String },

    #[error("rule cannot be applied: {0}")]
    RuleNotApplicable(String),

    #[error("no unambiguous matrix found after {attempts} attempts")]
    CompositionExhausted { attempts: usize },

    #[error("could not find distractor {index} after {attempts} draws")]
    DistractorExhausted { index: usize, attempts: usize },

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("invariant violated: {0}")]
    InvariantViolation(String),
}

impl RavenError {
    pub(crate) fn overflow(attribute: Attribute, detail: impl Into<String>) -> Self {
        RavenError::DomainOverflow {
            attribute,
            detail: detail.into(),
        }
    }

    /// True for failures the composer and distractor loops absorb and retry.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            RavenError::DomainOverflow { .. } | RavenError::RuleNotApplicable(_)
        )
    }
}

/// Result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, RavenError>;
