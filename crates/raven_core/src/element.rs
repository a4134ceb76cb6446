//! Immutable figure descriptions.
//!
//! A [`Primitive`] assigns a value to every [`Attribute`]; an [`Element`] is a
//! non-empty stack of primitives drawn bottom to top. Both are plain values:
//! changing one attribute produces a new element via [`Element::with_value`].

use crate::attribute::{Attribute, ATTRIBUTE_COUNT};
use crate::error::{RavenError, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Full assignment of attribute values for one layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(
    try_from = "BTreeMap<Attribute, u8>",
    into = "BTreeMap<Attribute, u8>"
)]
pub struct Primitive {
    values: [u8; ATTRIBUTE_COUNT],
}

impl Primitive {
    /// Build a primitive from values in `Attribute::ALL` order.
    pub fn new(values: [u8; ATTRIBUTE_COUNT]) -> Result<Self> {
        for (attribute, &value) in Attribute::ALL.iter().zip(values.iter()) {
            if !attribute.contains(value) {
                return Err(RavenError::InvalidAttributeValue {
                    attribute: *attribute,
                    value,
                });
            }
        }
        Ok(Self { values })
    }

    #[inline]
    pub fn get(&self, attribute: Attribute) -> u8 {
        self.values[attribute.index()]
    }

    /// Copy of this primitive with one attribute replaced.
    pub fn with(&self, attribute: Attribute, value: u8) -> Result<Self> {
        if !attribute.contains(value) {
            return Err(RavenError::InvalidAttributeValue { attribute, value });
        }
        let mut values = self.values;
        values[attribute.index()] = value;
        Ok(Self { values })
    }

    /// Values in `Attribute::ALL` order.
    pub fn values(&self) -> [u8; ATTRIBUTE_COUNT] {
        self.values
    }
}

impl TryFrom<BTreeMap<Attribute, u8>> for Primitive {
    type Error = RavenError;

    fn try_from(map: BTreeMap<Attribute, u8>) -> Result<Self> {
        let mut values = [0u8; ATTRIBUTE_COUNT];
        for attribute in Attribute::ALL {
            values[attribute.index()] = *map
                .get(&attribute)
                .ok_or(RavenError::MissingAttribute { layer: 0, attribute })?;
        }
        Primitive::new(values)
    }
}

impl From<Primitive> for BTreeMap<Attribute, u8> {
    fn from(primitive: Primitive) -> Self {
        Attribute::ALL
            .into_iter()
            .map(|a| (a, primitive.get(a)))
            .collect()
    }
}

/// A layered figure. Always holds at least one layer.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "Vec<Primitive>", into = "Vec<Primitive>")]
pub struct Element {
    layers: Vec<Primitive>,
}

impl Element {
    /// Wrap already validated layers.
    pub fn from_layers(layers: Vec<Primitive>) -> Result<Self> {
        if layers.is_empty() {
            return Err(RavenError::EmptyElement);
        }
        Ok(Self { layers })
    }

    pub fn layers(&self) -> &[Primitive] {
        &self.layers
    }

    pub fn layer_count(&self) -> usize {
        self.layers.len()
    }

    /// Value of `attribute` on `layer`, or `None` if the layer does not exist.
    pub fn value(&self, layer: usize, attribute: Attribute) -> Option<u8> {
        self.layers.get(layer).map(|p| p.get(attribute))
    }

    /// New element equal to this one except for a single value.
    pub fn with_value(&self, layer: usize, attribute: Attribute, value: u8) -> Result<Self> {
        let primitive = self
            .layers
            .get(layer)
            .ok_or(RavenError::MissingLayer { layer })?;
        let replaced = primitive.with(attribute, value)?;
        let mut layers = self.layers.clone();
        layers[layer] = replaced;
        Ok(Self { layers })
    }

    /// Short description restricted to `attributes`, e.g. `(circle, 3)`.
    ///
    /// Multiple layers are joined with ` / `.
    pub fn describe(&self, attributes: &[Attribute]) -> String {
        self.layers
            .iter()
            .map(|p| {
                let parts: Vec<String> = attributes.iter().map(|&a| a.label(p.get(a))).collect();
                format!("({})", parts.join(", "))
            })
            .collect::<Vec<_>>()
            .join(" / ")
    }
}

impl TryFrom<Vec<Primitive>> for Element {
    type Error = RavenError;

    fn try_from(layers: Vec<Primitive>) -> Result<Self> {
        Element::from_layers(layers)
    }
}

impl From<Element> for Vec<Primitive> {
    fn from(element: Element) -> Self {
        element.layers
    }
}

impl fmt::Display for Element {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.describe(&Attribute::ALL))
    }
}

/// Collects (layer, attribute, value) entries and validates them on `build`.
#[derive(Debug, Clone, Default)]
pub struct ElementBuilder {
    entries: BTreeMap<usize, BTreeMap<Attribute, u8>>,
}

impl ElementBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start from every value of an existing element.
    pub fn from_element(element: &Element) -> Self {
        let mut builder = Self::new();
        for (layer, primitive) in element.layers().iter().enumerate() {
            builder.entries.insert(layer, (*primitive).into());
        }
        builder
    }

    pub fn set(mut self, layer: usize, attribute: Attribute, value: u8) -> Self {
        self.entries.entry(layer).or_default().insert(attribute, value);
        self
    }

    /// Set several attributes of one layer at once.
    pub fn layer(mut self, layer: usize, values: &[(Attribute, u8)]) -> Self {
        let slot = self.entries.entry(layer).or_default();
        for &(attribute, value) in values {
            slot.insert(attribute, value);
        }
        self
    }

    pub fn build(self) -> Result<Element> {
        if self.entries.is_empty() {
            return Err(RavenError::EmptyElement);
        }
        let mut layers = Vec::with_capacity(self.entries.len());
        for (expected, (layer, map)) in self.entries.into_iter().enumerate() {
            if layer != expected {
                return Err(RavenError::MissingLayer { layer: expected });
            }
            let mut values = [0u8; ATTRIBUTE_COUNT];
            for attribute in Attribute::ALL {
                values[attribute.index()] = *map
                    .get(&attribute)
                    .ok_or(RavenError::MissingAttribute { layer, attribute })?;
            }
            layers.push(Primitive::new(values)?);
        }
        Element::from_layers(layers)
    }
}

/// An element placed in the 3x3 grid.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Panel {
    pub row: usize,
    pub column: usize,
    pub element: Element,
}

impl Panel {
    pub fn new(row: usize, column: usize, element: Element) -> Self {
        Self {
            row,
            column,
            element,
        }
    }
}
