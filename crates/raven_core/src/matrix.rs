//! The completed 3x3 grid and the rules it was built from.

use crate::attribute::Attribute;
use crate::element::{Element, Panel};
use crate::error::{RavenError, Result};
use crate::rule::Rule;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Rows and columns of a matrix.
pub const GRID: usize = 3;

/// Values of one slot over the whole grid, indexed `[row][column]`.
pub type SlotGrid = [[u8; GRID]; GRID];

/// One attribute on one layer. Every active slot carries its own rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct RuleSlot {
    pub layer: usize,
    pub attribute: Attribute,
}

impl RuleSlot {
    pub fn new(layer: usize, attribute: Attribute) -> Self {
        Self { layer, attribute }
    }
}

impl fmt::Display for RuleSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "layer {} {}", self.layer, self.attribute)
    }
}

/// Nine panels in row-major order plus their rules.
#[derive(Debug, Clone, PartialEq)]
pub struct Matrix {
    panels: Vec<Panel>,
    rules: Vec<(RuleSlot, Rule)>,
    strict_columns: bool,
}

impl Matrix {
    /// Assemble a matrix from nine row-major elements.
    ///
    /// Fails with `InvariantViolation` if any row (or column, when strict)
    /// breaks its slot's rule.
    pub fn new(
        elements: Vec<Element>,
        mut rules: Vec<(RuleSlot, Rule)>,
        strict_columns: bool,
    ) -> Result<Self> {
        if elements.len() != GRID * GRID {
            return Err(RavenError::InvariantViolation(format!(
                "a matrix needs {} panels, got {}",
                GRID * GRID,
                elements.len()
            )));
        }
        let layers = elements[0].layer_count();
        if elements.iter().any(|e| e.layer_count() != layers) {
            return Err(RavenError::InvariantViolation(
                "panels have different layer counts".into(),
            ));
        }

        rules.sort_by_key(|(slot, _)| *slot);
        if rules.windows(2).any(|w| w[0].0 == w[1].0) {
            return Err(RavenError::InvariantViolation(
                "more than one rule for a slot".into(),
            ));
        }
        for (slot, rule) in &rules {
            if slot.layer >= layers || slot.attribute != rule.attribute {
                return Err(RavenError::InvariantViolation(format!(
                    "rule {} does not belong to {}",
                    rule, slot
                )));
            }
        }

        let panels = elements
            .into_iter()
            .enumerate()
            .map(|(i, element)| Panel::new(i / GRID, i % GRID, element))
            .collect();
        let matrix = Self {
            panels,
            rules,
            strict_columns,
        };

        for (slot, rule) in &matrix.rules {
            if !grid_satisfies(rule, &matrix.values(*slot), strict_columns) {
                return Err(RavenError::InvariantViolation(format!(
                    "{} does not hold on every {}",
                    rule,
                    if strict_columns { "row and column" } else { "row" }
                )));
            }
        }
        Ok(matrix)
    }

    pub fn panel(&self, row: usize, column: usize) -> &Panel {
        &self.panels[row * GRID + column]
    }

    pub fn panels(&self) -> &[Panel] {
        &self.panels
    }

    /// The first eight panels.
    pub fn context(&self) -> &[Panel] {
        &self.panels[..GRID * GRID - 1]
    }

    /// Rules sorted by slot.
    pub fn rules(&self) -> &[(RuleSlot, Rule)] {
        &self.rules
    }

    pub fn rule(&self, slot: RuleSlot) -> Option<&Rule> {
        self.rules
            .binary_search_by_key(&slot, |(s, _)| *s)
            .ok()
            .map(|i| &self.rules[i].1)
    }

    pub fn strict_columns(&self) -> bool {
        self.strict_columns
    }

    pub fn layer_count(&self) -> usize {
        self.panels[0].element.layer_count()
    }

    /// Values of `slot` across the grid.
    pub fn values(&self, slot: RuleSlot) -> SlotGrid {
        let mut grid = [[0u8; GRID]; GRID];
        for panel in &self.panels {
            grid[panel.row][panel.column] =
                panel.element.value(slot.layer, slot.attribute).unwrap_or(0);
        }
        grid
    }

    pub fn row_values(&self, slot: RuleSlot, row: usize) -> [u8; GRID] {
        self.values(slot)[row]
    }

    pub fn column_values(&self, slot: RuleSlot, column: usize) -> [u8; GRID] {
        column_of(&self.values(slot), column)
    }

    /// The element in the bottom-right cell.
    pub fn ground_truth(&self) -> &Element {
        &self.panel(GRID - 1, GRID - 1).element
    }

    pub fn satisfies_rules(&self) -> bool {
        self.rules
            .iter()
            .all(|(slot, rule)| grid_satisfies(rule, &self.values(*slot), self.strict_columns))
    }
}

/// Column `column` of a slot grid.
pub fn column_of(grid: &SlotGrid, column: usize) -> [u8; GRID] {
    [grid[0][column], grid[1][column], grid[2][column]]
}

/// Every row, and every column when `strict`, validates `rule`.
pub fn grid_satisfies(rule: &Rule, grid: &SlotGrid, strict: bool) -> bool {
    (0..GRID).all(|i| rule.validate(grid[i]) && (!strict || rule.validate(column_of(grid, i))))
}

/// Lines a solver sees with the bottom-right cell hidden: the complete lines
/// and the two-value prefixes that end at the missing cell.
pub fn context_lines(grid: &SlotGrid, strict: bool) -> (Vec<[u8; 3]>, Vec<[u8; 2]>) {
    let mut complete = vec![grid[0], grid[1]];
    let mut partial = vec![[grid[2][0], grid[2][1]]];
    if strict {
        complete.push(column_of(grid, 0));
        complete.push(column_of(grid, 1));
        partial.push([grid[0][2], grid[1][2]]);
    }
    (complete, partial)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::element::ElementBuilder;

    fn element(shape: u8, count: u8) -> Element {
        let builder = Attribute::ALL
            .into_iter()
            .fold(ElementBuilder::new(), |b, a| b.set(0, a, 0));
        builder
            .set(0, Attribute::Shape, shape)
            .set(0, Attribute::Count, count)
            .build()
            .unwrap()
    }

    fn shape_constant_count_progression() -> Vec<(RuleSlot, Rule)> {
        vec![
            (RuleSlot::new(0, Attribute::Count), Rule::progression(Attribute::Count, 1)),
            (RuleSlot::new(0, Attribute::Shape), Rule::constant(Attribute::Shape)),
        ]
    }

    #[test]
    fn test_new_accepts_consistent_rows() {
        let elements = (0..9)
            .map(|i| element((i / 3) as u8, (i % 3) as u8))
            .collect();
        let matrix = Matrix::new(elements, shape_constant_count_progression(), false).unwrap();

        let count = RuleSlot::new(0, Attribute::Count);
        assert_eq!(matrix.row_values(count, 1), [0, 1, 2]);
        assert_eq!(matrix.column_values(count, 2), [2, 2, 2]);
        assert_eq!(matrix.ground_truth(), &element(2, 2));
        assert_eq!(matrix.panel(1, 2).row, 1);
        assert_eq!(matrix.context().len(), 8);
        // rules are sorted by slot
        assert_eq!(matrix.rules()[0].0.attribute, Attribute::Shape);
        assert!(matrix.rule(count).is_some());
        assert!(matrix.rule(RuleSlot::new(0, Attribute::Size)).is_none());
        assert!(matrix.satisfies_rules());
    }

    #[test]
    fn test_new_rejects_broken_rows() {
        let mut elements: Vec<Element> = (0..9)
            .map(|i| element((i / 3) as u8, (i % 3) as u8))
            .collect();
        elements[8] = element(2, 3);
        let err = Matrix::new(elements, shape_constant_count_progression(), false).unwrap_err();
        assert!(matches!(err, RavenError::InvariantViolation(_)));
    }

    #[test]
    fn test_strict_checks_columns() {
        // shape varies down each column, so constant shape fails column-wise
        let elements: Vec<Element> = (0..9)
            .map(|i| element((i / 3) as u8, (i % 3) as u8))
            .collect();
        assert!(Matrix::new(elements.clone(), shape_constant_count_progression(), false).is_ok());
        assert!(Matrix::new(elements, shape_constant_count_progression(), true).is_err());
    }

    #[test]
    fn test_context_lines() {
        let grid = [[1, 2, 3], [4, 5, 6], [7, 8, 9]];
        let (complete, partial) = context_lines(&grid, false);
        assert_eq!(complete, vec![[1, 2, 3], [4, 5, 6]]);
        assert_eq!(partial, vec![[7, 8]]);

        let (complete, partial) = context_lines(&grid, true);
        assert_eq!(complete.len(), 4);
        assert_eq!(complete[3], [2, 5, 8]);
        assert_eq!(partial, vec![[7, 8], [3, 6]]);
    }
}
