//! Transformation rules governing one attribute along a row or column.
//!
//! A rule is a pure pair of operations over value indices:
//! `apply` derives the next value of a line from the values already fixed,
//! `validate` checks a completed triple. For every rule and every pair the
//! rule accepts, `validate([a, b, apply([a, b])?])` holds.

use crate::attribute::{quadrant_mask, value_for_mask, Attribute, DomainKind};
use crate::error::{RavenError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Progression steps available in the catalog.
pub const PROGRESSION_STEPS: [i8; 4] = [-2, -1, 1, 2];

/// Binary operation of a `LogicalCombine` rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogicOp {
    And,
    Or,
    Xor,
    Add,
    Subtract,
}

impl LogicOp {
    pub const ALL: [LogicOp; 5] = [
        LogicOp::And,
        LogicOp::Or,
        LogicOp::Xor,
        LogicOp::Add,
        LogicOp::Subtract,
    ];

    pub fn name(self) -> &'static str {
        match self {
            LogicOp::And => "and",
            LogicOp::Or => "or",
            LogicOp::Xor => "xor",
            LogicOp::Add => "add",
            LogicOp::Subtract => "subtract",
        }
    }

    /// Set operators act on position masks, arithmetic ones on magnitudes.
    pub fn applies_to(self, kind: DomainKind) -> bool {
        match self {
            LogicOp::And | LogicOp::Or | LogicOp::Xor => kind == DomainKind::Set,
            LogicOp::Add | LogicOp::Subtract => {
                matches!(kind, DomainKind::Ordinal | DomainKind::Cyclic)
            }
        }
    }
}

/// Rule kind without parameters. Keys the configured sampling weights.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RuleKindTag {
    Constant,
    Progression,
    DistributeThree,
    LogicalCombine,
}

impl RuleKindTag {
    pub const ALL: [RuleKindTag; 4] = [
        RuleKindTag::Constant,
        RuleKindTag::Progression,
        RuleKindTag::DistributeThree,
        RuleKindTag::LogicalCombine,
    ];

    pub fn name(self) -> &'static str {
        match self {
            RuleKindTag::Constant => "constant",
            RuleKindTag::Progression => "progression",
            RuleKindTag::DistributeThree => "distribute_three",
            RuleKindTag::LogicalCombine => "logical_combine",
        }
    }

    /// Whether at least one instantiation of this tag fits `attribute`.
    pub fn applies_to(self, attribute: Attribute) -> bool {
        let kind = attribute.kind();
        match self {
            RuleKindTag::Constant => true,
            RuleKindTag::Progression => {
                matches!(kind, DomainKind::Ordinal | DomainKind::Cyclic)
            }
            RuleKindTag::DistributeThree => attribute.domain_size() >= 3,
            RuleKindTag::LogicalCombine => LogicOp::ALL.iter().any(|op| op.applies_to(kind)),
        }
    }
}

impl fmt::Display for RuleKindTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Rule kind together with its parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RuleKind {
    Constant,
    Progression { step: i8 },
    /// Line `i` starts at `values[i]` and continues through the triple cyclically.
    DistributeThree { values: [u8; 3] },
    /// The third value is `op(first, second)`.
    LogicalCombine { op: LogicOp },
}

impl RuleKind {
    pub fn tag(&self) -> RuleKindTag {
        match self {
            RuleKind::Constant => RuleKindTag::Constant,
            RuleKind::Progression { .. } => RuleKindTag::Progression,
            RuleKind::DistributeThree { .. } => RuleKindTag::DistributeThree,
            RuleKind::LogicalCombine { .. } => RuleKindTag::LogicalCombine,
        }
    }
}

/// A parameterized rule bound to one attribute.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Rule {
    pub attribute: Attribute,
    pub kind: RuleKind,
}

impl Rule {
    pub fn new(attribute: Attribute, kind: RuleKind) -> Self {
        Self { attribute, kind }
    }

    pub fn constant(attribute: Attribute) -> Self {
        Self::new(attribute, RuleKind::Constant)
    }

    pub fn progression(attribute: Attribute, step: i8) -> Self {
        Self::new(attribute, RuleKind::Progression { step })
    }

    pub fn distribute_three(attribute: Attribute, values: [u8; 3]) -> Self {
        Self::new(attribute, RuleKind::DistributeThree { values })
    }

    pub fn logical(attribute: Attribute, op: LogicOp) -> Self {
        Self::new(attribute, RuleKind::LogicalCombine { op })
    }

    pub fn tag(&self) -> RuleKindTag {
        self.kind.tag()
    }

    /// Number of leading values a line needs before the rest is determined.
    pub fn arity(&self) -> usize {
        match self.kind {
            RuleKind::LogicalCombine { .. } => 2,
            _ => 1,
        }
    }

    /// Whether the parameters make sense for the attribute's domain.
    pub fn is_applicable(&self) -> bool {
        let attribute = self.attribute;
        match self.kind {
            RuleKind::Constant => true,
            RuleKind::Progression { step } => {
                RuleKindTag::Progression.applies_to(attribute) && PROGRESSION_STEPS.contains(&step)
            }
            RuleKind::DistributeThree { values: [a, b, c] } => {
                a != b
                    && b != c
                    && a != c
                    && [a, b, c].iter().all(|&v| attribute.contains(v))
            }
            RuleKind::LogicalCombine { op } => op.applies_to(attribute.kind()),
        }
    }

    /// Derive the next value of a line from one or two known values.
    ///
    /// Two known values must themselves be consistent with the rule.
    pub fn apply(&self, known: &[u8]) -> Result<u8> {
        if !self.is_applicable() {
            return Err(RavenError::RuleNotApplicable(format!(
                "{} does not fit the domain of {}",
                self, self.attribute
            )));
        }
        if known.is_empty() || known.len() > 2 || known.len() < self.arity() {
            return Err(RavenError::RuleNotApplicable(format!(
                "{} needs {} known value(s), got {}",
                self,
                self.arity(),
                known.len()
            )));
        }
        for &value in known {
            if !self.attribute.contains(value) {
                return Err(RavenError::InvalidAttributeValue {
                    attribute: self.attribute,
                    value,
                });
            }
        }

        let last = known[known.len() - 1];
        match self.kind {
            RuleKind::Constant => {
                if known.iter().any(|&v| v != last) {
                    return Err(self.inconsistent(known));
                }
                Ok(last)
            }
            RuleKind::Progression { step } => {
                if known.len() == 2 && self.step_from(known[0], step)? != known[1] {
                    return Err(self.inconsistent(known));
                }
                self.step_from(last, step)
            }
            RuleKind::DistributeThree { values } => {
                let positions: Vec<usize> = known
                    .iter()
                    .map(|v| values.iter().position(|x| x == v))
                    .collect::<Option<_>>()
                    .ok_or_else(|| self.inconsistent(known))?;
                match positions.as_slice() {
                    [p] => Ok(values[(p + 1) % 3]),
                    [p, q] if p != q => Ok(values[3 - p - q]),
                    _ => Err(self.inconsistent(known)),
                }
            }
            RuleKind::LogicalCombine { op } => self.combine(op, known[0], known[1]),
        }
    }

    /// Whether a completed triple satisfies the rule.
    pub fn validate(&self, line: [u8; 3]) -> bool {
        if !self.is_applicable() || line.iter().any(|&v| !self.attribute.contains(v)) {
            return false;
        }
        let [a, b, c] = line;
        match self.kind {
            RuleKind::Constant => a == b && b == c,
            RuleKind::Progression { step } => {
                self.step_from(a, step).ok() == Some(b) && self.step_from(b, step).ok() == Some(c)
            }
            RuleKind::DistributeThree { values } => {
                let mut sorted_line = line;
                let mut sorted_set = values;
                sorted_line.sort_unstable();
                sorted_set.sort_unstable();
                sorted_line == sorted_set
            }
            RuleKind::LogicalCombine { op } => self.combine(op, a, b).ok() == Some(c),
        }
    }

    /// Complete a line from its leading values (at least `arity`, at most 3).
    pub fn complete_line(&self, seeds: &[u8]) -> Result<[u8; 3]> {
        if seeds.len() < self.arity() || seeds.len() > 3 {
            return Err(RavenError::RuleNotApplicable(format!(
                "{} cannot complete a line from {} value(s)",
                self,
                seeds.len()
            )));
        }
        let mut line = [0u8; 3];
        line[..seeds.len()].copy_from_slice(seeds);
        for i in seeds.len()..3 {
            line[i] = self.apply(&line[i.saturating_sub(2)..i])?;
        }
        if !self.validate(line) {
            return Err(self.inconsistent(&line));
        }
        Ok(line)
    }

    fn inconsistent(&self, known: &[u8]) -> RavenError {
        RavenError::RuleNotApplicable(format!("{:?} is inconsistent with {}", known, self))
    }

    fn step_from(&self, value: u8, step: i8) -> Result<u8> {
        let size = i16::from(self.attribute.domain_size());
        let next = i16::from(value) + i16::from(step);
        match self.attribute.kind() {
            DomainKind::Cyclic => Ok(next.rem_euclid(size) as u8),
            _ if (0..size).contains(&next) => Ok(next as u8),
            _ => Err(RavenError::overflow(
                self.attribute,
                format!("{} stepped by {} leaves 0..{}", value, step, size),
            )),
        }
    }

    fn combine(&self, op: LogicOp, a: u8, b: u8) -> Result<u8> {
        let attribute = self.attribute;
        let size = i16::from(attribute.domain_size());
        let result = match (attribute.kind(), op) {
            (DomainKind::Set, LogicOp::And) => value_for_mask(quadrant_mask(a) & quadrant_mask(b)),
            (DomainKind::Set, LogicOp::Or) => value_for_mask(quadrant_mask(a) | quadrant_mask(b)),
            (DomainKind::Set, LogicOp::Xor) => value_for_mask(quadrant_mask(a) ^ quadrant_mask(b)),
            (DomainKind::Cyclic, LogicOp::Add) => {
                Some((i16::from(a) + i16::from(b)).rem_euclid(size) as u8)
            }
            (DomainKind::Cyclic, LogicOp::Subtract) => {
                Some((i16::from(a) - i16::from(b)).rem_euclid(size) as u8)
            }
            // Ordinal magnitudes are index + 1.
            (DomainKind::Ordinal, LogicOp::Add) => {
                let index = i16::from(a) + i16::from(b) + 1;
                (index < size).then_some(index as u8)
            }
            (DomainKind::Ordinal, LogicOp::Subtract) => {
                let index = i16::from(a) - i16::from(b) - 1;
                (index >= 0).then_some(index as u8)
            }
            _ => {
                return Err(RavenError::RuleNotApplicable(format!(
                    "{} is not defined on {}",
                    op.name(),
                    attribute
                )))
            }
        };
        result.ok_or_else(|| {
            RavenError::overflow(
                attribute,
                format!("{}({}, {}) has no value in the domain", op.name(), a, b),
            )
        })
    }
}

impl fmt::Display for Rule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind {
            RuleKind::Constant => write!(f, "{}: constant", self.attribute),
            RuleKind::Progression { step } => {
                write!(f, "{}: progression({:+})", self.attribute, step)
            }
            RuleKind::DistributeThree { values } => write!(
                f,
                "{}: distribute_three({}, {}, {})",
                self.attribute,
                self.attribute.label(values[0]),
                self.attribute.label(values[1]),
                self.attribute.label(values[2])
            ),
            RuleKind::LogicalCombine { op } => write!(f, "{}: {}", self.attribute, op.name()),
        }
    }
}
