//! The finished puzzle: eight context panels and the answer options.

use crate::catalog::RuleCatalog;
use crate::element::{Element, Panel};
use crate::error::{RavenError, Result};
use crate::matrix::{column_of, context_lines, grid_satisfies, Matrix, RuleSlot, SlotGrid, GRID};
use crate::rule::Rule;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// A matrix with its bottom-right panel hidden among distractors.
///
/// Problems are terminal values: nothing mutates one after generation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Problem {
    seed: u64,
    strict_columns: bool,
    rules: Vec<(RuleSlot, Rule)>,
    context: Vec<Panel>,
    options: Vec<Element>,
    answer_index: usize,
}

impl Problem {
    /// Detach the ground truth of `matrix` and attach the options.
    pub(crate) fn assemble(
        seed: u64,
        matrix: &Matrix,
        options: Vec<Element>,
        answer_index: usize,
    ) -> Self {
        Self {
            seed,
            strict_columns: matrix.strict_columns(),
            rules: matrix.rules().to_vec(),
            context: matrix.context().to_vec(),
            options,
            answer_index,
        }
    }

    /// Seed the problem was generated from.
    pub fn seed(&self) -> u64 {
        self.seed
    }

    pub fn strict_columns(&self) -> bool {
        self.strict_columns
    }

    pub fn rules(&self) -> &[(RuleSlot, Rule)] {
        &self.rules
    }

    /// The eight visible panels, row-major.
    pub fn context(&self) -> &[Panel] {
        &self.context
    }

    pub fn context_panel(&self, row: usize, column: usize) -> Option<&Panel> {
        self.context
            .iter()
            .find(|p| p.row == row && p.column == column)
    }

    /// Answer options in presentation order.
    pub fn options(&self) -> &[Element] {
        &self.options
    }

    pub fn answer_index(&self) -> usize {
        self.answer_index
    }

    pub fn ground_truth(&self) -> Option<&Element> {
        self.options.get(self.answer_index)
    }

    /// Every option except the ground truth, in presentation order.
    pub fn distractors(&self) -> impl Iterator<Item = &Element> + '_ {
        self.options
            .iter()
            .enumerate()
            .filter(move |(i, _)| *i != self.answer_index)
            .map(|(_, e)| e)
    }

    /// Values of `slot` with `candidate` placed in the missing cell.
    ///
    /// `None` if the candidate or a context panel lacks the slot's layer.
    pub fn slot_grid(&self, slot: RuleSlot, candidate: &Element) -> Option<SlotGrid> {
        let mut grid = [[0u8; GRID]; GRID];
        for panel in &self.context {
            grid[panel.row][panel.column] = panel.element.value(slot.layer, slot.attribute)?;
        }
        grid[GRID - 1][GRID - 1] = candidate.value(slot.layer, slot.attribute)?;
        Some(grid)
    }

    /// Slots whose rule breaks on the last row (or last column, when strict)
    /// with `candidate` filled in.
    pub fn violated_slots(&self, candidate: &Element) -> Vec<RuleSlot> {
        self.rules
            .iter()
            .filter(|(slot, rule)| match self.slot_grid(*slot, candidate) {
                Some(grid) => {
                    !rule.validate(grid[GRID - 1])
                        || (self.strict_columns && !rule.validate(column_of(&grid, GRID - 1)))
                }
                None => true,
            })
            .map(|(slot, _)| *slot)
            .collect()
    }

    /// Check every structural invariant against the global catalog.
    pub fn check_invariants(&self) -> Result<()> {
        self.check_invariants_with(RuleCatalog::global())
    }

    /// Check rule consistency, answer uniqueness, option distinctness and
    /// single-slot distractors.
    pub fn check_invariants_with(&self, catalog: &RuleCatalog) -> Result<()> {
        let violation = |msg: String| -> Result<()> { Err(RavenError::InvariantViolation(msg)) };

        if self.context.len() != GRID * GRID - 1 {
            return violation(format!("{} context panels", self.context.len()));
        }
        for (i, panel) in self.context.iter().enumerate() {
            if (panel.row, panel.column) != (i / GRID, i % GRID) {
                return violation(format!("context panel {} sits at ({}, {})", i, panel.row, panel.column));
            }
        }
        let truth = match self.ground_truth() {
            Some(truth) => truth,
            None => {
                return violation(format!(
                    "answer index {} outside {} options",
                    self.answer_index,
                    self.options.len()
                ))
            }
        };

        for (slot, rule) in &self.rules {
            let grid = match self.slot_grid(*slot, truth) {
                Some(grid) => grid,
                None => return violation(format!("{} is missing from some panel", slot)),
            };
            if !grid_satisfies(rule, &grid, self.strict_columns) {
                return violation(format!("{} does not hold with the ground truth", rule));
            }
            let (complete, partial) = context_lines(&grid, self.strict_columns);
            let predicted = catalog.predictions(slot.attribute, &complete, &partial);
            if predicted.len() != 1 || !predicted.contains(&grid[GRID - 1][GRID - 1]) {
                return violation(format!(
                    "{} admits {} answers for the missing cell",
                    slot,
                    predicted.len()
                ));
            }
        }

        let distinct: BTreeSet<&Element> = self.options.iter().collect();
        if distinct.len() != self.options.len() {
            return violation("answer options repeat".into());
        }

        for (i, option) in self.options.iter().enumerate() {
            if i == self.answer_index {
                continue;
            }
            let violated = self.violated_slots(option);
            if violated.len() != 1 {
                return violation(format!(
                    "option {} breaks {} rules instead of one",
                    i,
                    violated.len()
                ));
            }
        }
        Ok(())
    }
}
