//! Matrix composition: pick one rule per slot, derive the grid and keep it
//! only if the hidden cell has a single catalog-consistent answer.
//!
//! Each attempt walks a small state machine:
//!
//! ```text
//! SelectingRules -> Deriving -> Validating -> Accepted
//!        ^              |            |
//!        +---- Rejected <------------+
//! ```
//!
//! Attempts are bounded by `retry_budget`; running out yields
//! `CompositionExhausted` and no partial matrix.

use crate::attribute::{Attribute, ATTRIBUTE_COUNT};
use crate::catalog::RuleCatalog;
use crate::config::GeneratorConfig;
use crate::element::{Element, Primitive};
use crate::error::{RavenError, Result};
use crate::matrix::{context_lines, grid_satisfies, Matrix, RuleSlot, SlotGrid, GRID};
use crate::rng::{choose_weighted, shuffle_with_rng, RavenRng};
use crate::rule::{Rule, RuleKind, RuleKindTag};
use std::fmt;
use tracing::{debug, info, warn};

/// Seed blocks tried per slot in strict mode before the attempt is dropped.
const STRICT_SEED_TRIES: usize = 32;

/// Rules drawn for one attempt plus the fixed values of inactive attributes.
#[derive(Debug, Clone)]
struct Selection {
    base: Vec<[u8; ATTRIBUTE_COUNT]>,
    rules: Vec<(RuleSlot, Rule)>,
}

/// A fully derived grid per slot, not yet checked for uniqueness.
#[derive(Debug, Clone)]
struct Candidate {
    base: Vec<[u8; ATTRIBUTE_COUNT]>,
    slots: Vec<(RuleSlot, Rule, SlotGrid)>,
}

#[derive(Debug)]
enum Rejection {
    /// The catalog offers nothing drawable for a slot.
    NoRule(RuleSlot),
    /// No seed let the rule complete its lines inside the domain.
    Overflow(RuleSlot, RavenError),
    /// Row-first and column-first derivations produced different grids.
    Disagreement(RuleSlot),
    /// The hidden cell is predicted by zero or several values.
    Ambiguous { slot: RuleSlot, predicted: usize },
    /// The assembled panels failed matrix construction.
    Invalid(RavenError),
}

impl fmt::Display for Rejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Rejection::NoRule(slot) => write!(f, "no drawable rule for {}", slot),
            Rejection::Overflow(slot, err) => write!(f, "{}: {}", slot, err),
            Rejection::Disagreement(slot) => {
                write!(f, "row and column derivations disagree on {}", slot)
            }
            Rejection::Ambiguous { slot, predicted } => {
                write!(f, "{} candidate values for {}", predicted, slot)
            }
            Rejection::Invalid(err) => write!(f, "{}", err),
        }
    }
}

enum AttemptState {
    SelectingRules,
    Deriving(Selection),
    Validating(Candidate),
    Accepted(Matrix),
    Rejected(Rejection),
}

/// Builds matrices for one configuration against one catalog.
pub struct MatrixComposer<'a> {
    config: &'a GeneratorConfig,
    catalog: &'a RuleCatalog,
}

impl<'a> MatrixComposer<'a> {
    pub fn new(config: &'a GeneratorConfig, catalog: &'a RuleCatalog) -> Self {
        Self { config, catalog }
    }

    /// Active slots, layer-major, attributes in canonical order.
    pub fn slots(&self) -> Vec<RuleSlot> {
        (0..self.config.layers)
            .flat_map(|layer| {
                self.config
                    .active_attributes
                    .iter()
                    .map(move |&attribute| RuleSlot::new(layer, attribute))
            })
            .collect()
    }

    /// Search for a matrix satisfying every rule with a unique answer.
    pub fn compose(&self, rng: &mut dyn RavenRng) -> Result<Matrix> {
        let budget = self.config.retry_budget;
        for attempt in 1..=budget {
            let mut state = AttemptState::SelectingRules;
            loop {
                state = match state {
                    AttemptState::SelectingRules => match self.select_rules(rng) {
                        Ok(selection) => AttemptState::Deriving(selection),
                        Err(rejection) => AttemptState::Rejected(rejection),
                    },
                    AttemptState::Deriving(selection) => match self.derive(selection, rng) {
                        Ok(candidate) => AttemptState::Validating(candidate),
                        Err(rejection) => AttemptState::Rejected(rejection),
                    },
                    AttemptState::Validating(candidate) => match self.check(candidate) {
                        Ok(matrix) => AttemptState::Accepted(matrix),
                        Err(rejection) => AttemptState::Rejected(rejection),
                    },
                    AttemptState::Accepted(matrix) => {
                        info!(attempts = attempt, "matrix accepted");
                        return Ok(matrix);
                    }
                    AttemptState::Rejected(rejection) => {
                        debug!(attempt, reason = %rejection, "matrix attempt rejected");
                        break;
                    }
                };
            }
        }
        warn!(attempts = budget, "matrix composition budget exhausted");
        Err(RavenError::CompositionExhausted { attempts: budget })
    }

    fn select_rules(&self, rng: &mut dyn RavenRng) -> std::result::Result<Selection, Rejection> {
        // Inactive attributes keep one value across all nine panels.
        let mut base = vec![[0u8; ATTRIBUTE_COUNT]; self.config.layers];
        for layer in base.iter_mut() {
            for attribute in Attribute::ALL {
                if !self.config.active_attributes.contains(&attribute) {
                    layer[attribute.index()] =
                        rng.next_usize_max(attribute.domain_size() as usize) as u8;
                }
            }
        }

        let mut rules = Vec::new();
        for slot in self.slots() {
            let rule = self.draw_rule(slot, rng).ok_or(Rejection::NoRule(slot))?;
            rules.push((slot, rule));
        }
        Ok(Selection { base, rules })
    }

    /// Tag by configured weight, then an instantiation of that tag uniformly.
    fn draw_rule(&self, slot: RuleSlot, rng: &mut dyn RavenRng) -> Option<Rule> {
        let attribute = slot.attribute;
        let weights: Vec<f64> = RuleKindTag::ALL
            .iter()
            .map(|&tag| {
                if self.catalog.rules_of(attribute, tag).next().is_some() {
                    self.config.rule_weight(tag)
                } else {
                    0.0
                }
            })
            .collect();
        let tag = RuleKindTag::ALL[choose_weighted(&weights, rng)?];
        let choices: Vec<&Rule> = self.catalog.rules_of(attribute, tag).collect();
        let mut rule = *choices[rng.next_usize_max(choices.len())];
        if let RuleKind::DistributeThree { mut values } = rule.kind {
            shuffle_with_rng(&mut values, rng);
            rule.kind = RuleKind::DistributeThree { values };
        }
        Some(rule)
    }

    fn derive(
        &self,
        selection: Selection,
        rng: &mut dyn RavenRng,
    ) -> std::result::Result<Candidate, Rejection> {
        let mut slots = Vec::with_capacity(selection.rules.len());
        for (slot, rule) in selection.rules {
            let grid = if self.config.strict_columns {
                derive_strict(&rule, rng).map_err(|e| match e {
                    StrictFailure::Disagreement => Rejection::Disagreement(slot),
                    StrictFailure::Overflow(err) => Rejection::Overflow(slot, err),
                })?
            } else {
                derive_rows(&rule, rng).map_err(|err| Rejection::Overflow(slot, err))?
            };
            slots.push((slot, rule, grid));
        }
        Ok(Candidate {
            base: selection.base,
            slots,
        })
    }

    fn check(&self, candidate: Candidate) -> std::result::Result<Matrix, Rejection> {
        let strict = self.config.strict_columns;
        for (slot, rule, grid) in &candidate.slots {
            if !grid_satisfies(rule, grid, strict) {
                return Err(Rejection::Invalid(RavenError::InvariantViolation(format!(
                    "derived grid breaks {}",
                    rule
                ))));
            }
            let (complete, partial) = context_lines(grid, strict);
            let predicted = self.catalog.predictions(slot.attribute, &complete, &partial);
            let answer = grid[GRID - 1][GRID - 1];
            if predicted.len() != 1 || !predicted.contains(&answer) {
                return Err(Rejection::Ambiguous {
                    slot: *slot,
                    predicted: predicted.len(),
                });
            }
        }

        let mut elements = Vec::with_capacity(GRID * GRID);
        for row in 0..GRID {
            for column in 0..GRID {
                let mut layers = candidate.base.clone();
                for (slot, _, grid) in &candidate.slots {
                    layers[slot.layer][slot.attribute.index()] = grid[row][column];
                }
                let primitives = layers
                    .into_iter()
                    .map(Primitive::new)
                    .collect::<Result<Vec<_>>>()
                    .map_err(Rejection::Invalid)?;
                elements.push(Element::from_layers(primitives).map_err(Rejection::Invalid)?);
            }
        }
        let rules = candidate
            .slots
            .into_iter()
            .map(|(slot, rule, _)| (slot, rule))
            .collect();
        Matrix::new(elements, rules, strict).map_err(Rejection::Invalid)
    }
}

/// Leading-value tuples a rule of this arity can start a line from.
fn seed_tuples(attribute: Attribute, arity: usize) -> Vec<Vec<u8>> {
    let mut tuples: Vec<Vec<u8>> = vec![Vec::new()];
    for _ in 0..arity {
        tuples = tuples
            .into_iter()
            .flat_map(|prefix| {
                attribute.values().map(move |v| {
                    let mut next = prefix.clone();
                    next.push(v);
                    next
                })
            })
            .collect();
    }
    tuples
}

/// Each row independently: a uniform pick among the seeds that complete.
fn derive_rows(rule: &Rule, rng: &mut dyn RavenRng) -> Result<SlotGrid> {
    let mut grid = [[0u8; GRID]; GRID];
    for (row, line) in grid.iter_mut().enumerate() {
        let seeds = match rule.kind {
            RuleKind::DistributeThree { values } => vec![vec![values[row]]],
            _ => seed_tuples(rule.attribute, rule.arity()),
        };
        let mut feasible: Vec<[u8; GRID]> = Vec::new();
        for seed in &seeds {
            match rule.complete_line(seed) {
                Ok(line) => feasible.push(line),
                Err(err) if err.is_retryable() => {}
                Err(err) => return Err(err),
            }
        }
        if feasible.is_empty() {
            return Err(RavenError::overflow(
                rule.attribute,
                format!("{} cannot complete row {}", rule, row),
            ));
        }
        *line = feasible[rng.next_usize_max(feasible.len())];
    }
    Ok(grid)
}

enum StrictFailure {
    Overflow(RavenError),
    Disagreement,
}

/// Grow the grid from a top-left seed block both ways and require agreement.
fn derive_strict(rule: &Rule, rng: &mut dyn RavenRng) -> std::result::Result<SlotGrid, StrictFailure> {
    let arity = rule.arity();
    let mut blocks: Vec<SlotGrid> = match (rule.kind, arity) {
        (RuleKind::DistributeThree { values }, _) => vec![[[values[0]; GRID]; GRID]],
        (_, 1) => rule
            .attribute
            .values()
            .map(|v| [[v; GRID]; GRID])
            .collect(),
        _ => {
            let size = rule.attribute.domain_size() as usize;
            (0..STRICT_SEED_TRIES)
                .map(|_| {
                    let mut block = [[0u8; GRID]; GRID];
                    for row in block.iter_mut().take(arity) {
                        for cell in row.iter_mut().take(arity) {
                            *cell = rng.next_usize_max(size) as u8;
                        }
                    }
                    block
                })
                .collect()
        }
    };
    shuffle_with_rng(&mut blocks, rng);

    let mut last_err = None;
    for block in blocks.iter().take(STRICT_SEED_TRIES) {
        let row_first = derive_row_first(rule, block, arity);
        let column_first = derive_row_first(rule, &transpose(block), arity).map(|g| transpose(&g));
        match (row_first, column_first) {
            (Ok(a), Ok(b)) if a == b => return Ok(a),
            // Catalog rules are symmetric in rows and columns; only a malformed
            // rule, such as a distribute_three with a repeated value, lands here.
            (Ok(_), Ok(_)) => return Err(StrictFailure::Disagreement),
            (Err(err), _) | (_, Err(err)) => last_err = Some(err),
        }
    }
    Err(StrictFailure::Overflow(last_err.unwrap_or_else(|| {
        RavenError::overflow(rule.attribute, format!("{} has no usable seed block", rule))
    })))
}

/// Complete the first `arity` columns downward, then every row across.
fn derive_row_first(rule: &Rule, block: &SlotGrid, arity: usize) -> Result<SlotGrid> {
    let mut grid = *block;
    for column in 0..arity {
        let seeds: Vec<u8> = (0..arity).map(|row| block[row][column]).collect();
        let line = rule.complete_line(&seeds)?;
        for (row, &value) in line.iter().enumerate() {
            grid[row][column] = value;
        }
    }
    for row in grid.iter_mut() {
        *row = rule.complete_line(&row[..arity])?;
    }
    Ok(grid)
}

fn transpose(grid: &SlotGrid) -> SlotGrid {
    let mut out = [[0u8; GRID]; GRID];
    for (r, row) in grid.iter().enumerate() {
        for (c, &value) in row.iter().enumerate() {
            out[c][r] = value;
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::matrix::column_of;
    use crate::rng::StdRandom;
    use crate::rule::LogicOp;

    fn unique_answer(matrix: &Matrix, catalog: &RuleCatalog) -> bool {
        matrix.rules().iter().all(|(slot, _)| {
            let grid = matrix.values(*slot);
            let (complete, partial) = context_lines(&grid, matrix.strict_columns());
            catalog
                .predictions(slot.attribute, &complete, &partial)
                .into_iter()
                .collect::<Vec<_>>()
                == vec![grid[2][2]]
        })
    }

    #[test]
    fn test_compose_default_config() {
        let config = GeneratorConfig::default();
        let catalog = RuleCatalog::global();
        let mut rng = StdRandom::from_seed(5);
        let matrix = MatrixComposer::new(&config, catalog).compose(&mut rng).unwrap();

        assert_eq!(matrix.panels().len(), 9);
        assert_eq!(matrix.rules().len(), 3);
        assert!(matrix.satisfies_rules());
        assert!(unique_answer(&matrix, catalog));

        // inactive attributes never vary
        let first = &matrix.panel(0, 0).element;
        for panel in matrix.panels() {
            for attribute in [Attribute::Rotation, Attribute::Shading, Attribute::Color] {
                assert_eq!(panel.element.value(0, attribute), first.value(0, attribute));
            }
        }
    }

    #[test]
    fn test_compose_strict_columns() {
        let config = GeneratorConfig {
            strict_columns: true,
            ..Default::default()
        };
        let catalog = RuleCatalog::global();
        for seed in 0..5 {
            let mut rng = StdRandom::from_seed(seed);
            let matrix = MatrixComposer::new(&config, catalog).compose(&mut rng).unwrap();
            assert!(matrix.satisfies_rules());
            for (slot, rule) in matrix.rules() {
                for c in 0..GRID {
                    assert!(rule.validate(column_of(&matrix.values(*slot), c)));
                }
            }
            assert!(unique_answer(&matrix, catalog));
        }
    }

    #[test]
    fn test_compose_multiple_layers() {
        let config = GeneratorConfig {
            layers: 2,
            active_attributes: [Attribute::Shape, Attribute::Size].into_iter().collect(),
            ..Default::default()
        };
        let composer = MatrixComposer::new(&config, RuleCatalog::global());
        assert_eq!(composer.slots().len(), 4);
        let mut rng = StdRandom::from_seed(9);
        let matrix = composer.compose(&mut rng).unwrap();
        assert_eq!(matrix.layer_count(), 2);
        assert_eq!(matrix.rules().len(), 4);
        assert!(matrix.satisfies_rules());
    }

    #[test]
    fn test_exhaustion_with_unusable_catalog() {
        let config = GeneratorConfig {
            active_attributes: [Attribute::Shape].into_iter().collect(),
            retry_budget: 5,
            distractor_count: 3,
            ..Default::default()
        };
        let catalog = RuleCatalog::from_rules([Rule::progression(Attribute::Shape, 1)]);
        let mut rng = StdRandom::from_seed(0);
        let err = MatrixComposer::new(&config, &catalog)
            .compose(&mut rng)
            .unwrap_err();
        assert_eq!(err, RavenError::CompositionExhausted { attempts: 5 });
    }

    #[test]
    fn test_derive_rows_distribute_three_starts() {
        let rule = Rule::distribute_three(Attribute::Shape, [3, 0, 5]);
        let mut rng = StdRandom::from_seed(1);
        let grid = derive_rows(&rule, &mut rng).unwrap();
        assert_eq!(grid, [[3, 0, 5], [0, 5, 3], [5, 3, 0]]);
    }

    #[test]
    fn test_derive_rows_rejects_impossible_rule() {
        // progression is undefined on shapes, so no row can complete
        let rule = Rule::progression(Attribute::Shape, 1);
        let mut rng = StdRandom::from_seed(1);
        assert!(derive_rows(&rule, &mut rng).is_err());
    }

    #[test]
    fn test_strict_logical_derivations_agree() {
        let rule = Rule::logical(Attribute::Count, LogicOp::Add);
        let block = [[0, 1, 0], [1, 0, 0], [0, 0, 0]];
        let row_first = derive_row_first(&rule, &block, 2).unwrap();
        let column_first = transpose(&derive_row_first(&rule, &transpose(&block), 2).unwrap());
        assert_eq!(row_first, [[0, 1, 2], [1, 0, 2], [2, 2, 5]]);
        assert_eq!(row_first, column_first);
    }

    #[test]
    fn test_strict_detects_row_column_disagreement() {
        // rows come out as [0,1,0] [1,0,0] [0,1,0]; the transpose differs
        let rule = Rule::distribute_three(Attribute::Shape, [0, 1, 0]);
        let block = [[0u8; GRID]; GRID];
        let row_first = derive_row_first(&rule, &block, 1).unwrap();
        assert_eq!(row_first, [[0, 1, 0], [1, 0, 0], [0, 1, 0]]);
        assert_ne!(row_first, transpose(&row_first));

        let mut rng = StdRandom::from_seed(4);
        assert!(matches!(
            derive_strict(&rule, &mut rng),
            Err(StrictFailure::Disagreement)
        ));
    }

    #[test]
    fn test_strict_compose_rejects_malformed_rule() {
        let config = GeneratorConfig {
            active_attributes: [Attribute::Shape].into_iter().collect(),
            strict_columns: true,
            retry_budget: 6,
            distractor_count: 1,
            ..Default::default()
        };
        let catalog = RuleCatalog::from_rules([Rule::distribute_three(Attribute::Shape, [0, 1, 0])]);
        let mut rng = StdRandom::from_seed(2);
        let err = MatrixComposer::new(&config, &catalog)
            .compose(&mut rng)
            .unwrap_err();
        assert_eq!(err, RavenError::CompositionExhausted { attempts: 6 });
    }

    #[test]
    fn test_seed_tuples() {
        assert_eq!(seed_tuples(Attribute::Shape, 1).len(), 6);
        let pairs = seed_tuples(Attribute::Count, 2);
        assert_eq!(pairs.len(), 81);
        assert_eq!(pairs[10], vec![1, 1]);
    }
}
