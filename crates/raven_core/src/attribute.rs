//! Visual attributes and their value domains.
//!
//! Every attribute value is stored as a small index into the attribute's
//! domain (`0..domain_size`). How rules interpret that index depends on the
//! domain kind:
//!
//! - `Categorical`: plain labels, no arithmetic (shape, color)
//! - `Ordinal`: magnitude `index + 1`, no wrapping (count, size, shading)
//! - `Cyclic`: magnitude `index`, arithmetic wraps (rotation)
//! - `Set`: quadrant bitmask `index + 1` (position)

use serde::{Deserialize, Serialize};
use std::fmt;

/// Number of attributes every primitive carries.
pub const ATTRIBUTE_COUNT: usize = 7;

/// Number of quadrants a cell is split into for `Attribute::Position`.
pub const QUADRANT_COUNT: u32 = 4;

const SHAPE_LABELS: [&str; 6] = ["circle", "square", "triangle", "diamond", "trapezoid", "tee"];
const COLOR_LABELS: [&str; 6] = ["black", "red", "green", "blue", "orange", "purple"];
const QUADRANT_LABELS: [&str; 4] = ["tl", "tr", "bl", "br"];

/// How the values of an attribute relate to each other.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DomainKind {
    /// Unordered labels.
    Categorical,
    /// Ordered magnitudes that do not wrap.
    Ordinal,
    /// Ordered values that wrap around.
    Cyclic,
    /// Non-empty subsets of the cell quadrants.
    Set,
}

/// One dimension of visual variation.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum Attribute {
    Shape,
    Count,
    Size,
    Rotation,
    Shading,
    Position,
    Color,
}

impl Attribute {
    /// All attributes in canonical order.
    pub const ALL: [Attribute; ATTRIBUTE_COUNT] = [
        Attribute::Shape,
        Attribute::Count,
        Attribute::Size,
        Attribute::Rotation,
        Attribute::Shading,
        Attribute::Position,
        Attribute::Color,
    ];

    /// Position of this attribute in `Attribute::ALL`.
    #[inline]
    pub fn index(self) -> usize {
        self as usize
    }

    pub fn name(self) -> &'static str {
        match self {
            Attribute::Shape => "shape",
            Attribute::Count => "count",
            Attribute::Size => "size",
            Attribute::Rotation => "rotation",
            Attribute::Shading => "shading",
            Attribute::Position => "position",
            Attribute::Color => "color",
        }
    }

    /// Look up an attribute by its snake_case name.
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|a| a.name() == name)
    }

    pub fn kind(self) -> DomainKind {
        match self {
            Attribute::Shape | Attribute::Color => DomainKind::Categorical,
            Attribute::Count | Attribute::Size | Attribute::Shading => DomainKind::Ordinal,
            Attribute::Rotation => DomainKind::Cyclic,
            Attribute::Position => DomainKind::Set,
        }
    }

    /// Number of values in the domain.
    pub fn domain_size(self) -> u8 {
        match self {
            Attribute::Shape => SHAPE_LABELS.len() as u8,
            Attribute::Count => 9,
            Attribute::Size => 8,
            Attribute::Rotation => 8,
            Attribute::Shading => 8,
            Attribute::Position => ((1u32 << QUADRANT_COUNT) - 1) as u8,
            Attribute::Color => COLOR_LABELS.len() as u8,
        }
    }

    #[inline]
    pub fn contains(self, value: u8) -> bool {
        value < self.domain_size()
    }

    /// Iterate over every value of the domain in index order.
    pub fn values(self) -> impl Iterator<Item = u8> {
        0..self.domain_size()
    }

    /// Human-readable label for a value.
    ///
    /// Values outside the domain render as `?<index>`.
    pub fn label(self, value: u8) -> String {
        if !self.contains(value) {
            return format!("?{}", value);
        }
        match self {
            Attribute::Shape => SHAPE_LABELS[value as usize].to_string(),
            Attribute::Color => COLOR_LABELS[value as usize].to_string(),
            Attribute::Count => (value + 1).to_string(),
            Attribute::Size => format!("{}/8", value + 1),
            Attribute::Rotation => format!("{}deg", value as u32 * 45),
            Attribute::Shading => format!("{}/7", value),
            Attribute::Position => {
                let mask = quadrant_mask(value);
                QUADRANT_LABELS
                    .iter()
                    .enumerate()
                    .filter(|(bit, _)| mask & (1 << bit) != 0)
                    .map(|(_, label)| *label)
                    .collect::<Vec<_>>()
                    .join("+")
            }
        }
    }

    /// Find the value whose label matches `label`.
    pub fn value_for_label(self, label: &str) -> Option<u8> {
        self.values().find(|&v| self.label(v) == label)
    }
}

impl fmt::Display for Attribute {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Quadrant bitmask for a `Position` value (bit 0 = top-left, 1 = top-right,
/// 2 = bottom-left, 3 = bottom-right).
#[inline]
pub fn quadrant_mask(value: u8) -> u8 {
    value + 1
}

/// Inverse of [`quadrant_mask`]; `None` for the empty set or stray bits.
#[inline]
pub fn value_for_mask(mask: u8) -> Option<u8> {
    if mask == 0 || u32::from(mask) >= (1 << QUADRANT_COUNT) {
        None
    } else {
        Some(mask - 1)
    }
}
