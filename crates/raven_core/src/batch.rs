//! Parallel generation of independent problems.
//!
//! Problem `i` of a batch uses seed `derive_seed(base, i)` and its own RNG.
//! Workers only share the read-only global catalog.

use crate::config::GeneratorConfig;
use crate::error::Result;
use crate::problem::Problem;
use crate::rng::derive_seed;
use rayon::prelude::*;

/// Outcome of one problem in a batch.
#[derive(Debug)]
pub struct BatchItem {
    pub index: usize,
    pub seed: u64,
    pub result: Result<Problem>,
}

/// Generate `count` problems in parallel.
///
/// Returns one item per index, in index order regardless of scheduling.
/// A failed problem does not stop the others.
pub fn generate_batch(config: &GeneratorConfig, count: usize) -> Vec<BatchItem> {
    (0..count)
        .into_par_iter()
        .map(|index| {
            let seed = derive_seed(config.random_seed, index as u64);
            BatchItem {
                index,
                seed,
                result: crate::generate_problem(&config.with_seed(seed)),
            }
        })
        .collect()
}
