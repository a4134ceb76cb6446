//! Wrong answers that break exactly one rule.

use crate::config::GeneratorConfig;
use crate::element::Element;
use crate::error::{RavenError, Result};
use crate::matrix::{Matrix, GRID};
use crate::problem::Problem;
use crate::rng::{choose_weighted, RavenRng};
use std::collections::BTreeSet;
use tracing::{debug, info, warn};

/// Derives answer options from a composed matrix.
pub struct DistractorGenerator<'a> {
    config: &'a GeneratorConfig,
}

impl<'a> DistractorGenerator<'a> {
    pub fn new(config: &'a GeneratorConfig) -> Self {
        Self { config }
    }

    /// Build `distractor_count` distractors and hide the ground truth among
    /// them at a random position.
    ///
    /// Each distractor copies the ground truth and replaces one slot with a
    /// value that breaks that slot's rule. Draws that collide with an
    /// existing option, or pick a slot with no breaking value, count as
    /// failures; `retry_budget` failures for one distractor give
    /// `DistractorExhausted`.
    pub fn generate(&self, matrix: &Matrix, rng: &mut dyn RavenRng) -> Result<Problem> {
        let truth = matrix.ground_truth().clone();
        let weights: Vec<f64> = matrix
            .rules()
            .iter()
            .map(|(slot, _)| self.config.distractor_weight(slot.attribute))
            .collect();
        let budget = self.config.retry_budget;
        let count = self.config.distractor_count;

        let mut seen: BTreeSet<Element> = BTreeSet::new();
        seen.insert(truth.clone());
        let mut distractors = Vec::with_capacity(count);

        for index in 0..count {
            let mut failures = 0;
            loop {
                if failures >= budget {
                    warn!(index, attempts = failures, "distractor budget exhausted");
                    return Err(RavenError::DistractorExhausted {
                        index,
                        attempts: failures,
                    });
                }
                let pick = choose_weighted(&weights, rng).ok_or_else(|| {
                    RavenError::InvalidConfig("no rule slot has positive distractor weight".into())
                })?;
                let (slot, rule) = matrix.rules()[pick];
                let grid = matrix.values(slot);
                let answer = grid[GRID - 1][GRID - 1];
                let row = [grid[GRID - 1][0], grid[GRID - 1][1]];
                let column = [grid[0][GRID - 1], grid[1][GRID - 1]];

                let breaking: Vec<u8> = slot
                    .attribute
                    .values()
                    .filter(|&v| v != answer)
                    .filter(|&v| {
                        !rule.validate([row[0], row[1], v])
                            || (matrix.strict_columns() && !rule.validate([column[0], column[1], v]))
                    })
                    .collect();
                if breaking.is_empty() {
                    failures += 1;
                    continue;
                }

                let value = breaking[rng.next_usize_max(breaking.len())];
                let candidate = truth.with_value(slot.layer, slot.attribute, value)?;
                if seen.contains(&candidate) {
                    debug!(index, %slot, value, "distractor collides with an existing option");
                    failures += 1;
                    continue;
                }
                seen.insert(candidate.clone());
                distractors.push(candidate);
                break;
            }
        }

        let answer_index = rng.next_usize_max(count + 1);
        let mut options = distractors;
        options.insert(answer_index, truth);
        info!(distractors = count, answer_index, "problem assembled");
        Ok(Problem::assemble(
            self.config.random_seed,
            matrix,
            options,
            answer_index,
        ))
    }
}
