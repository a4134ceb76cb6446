//! Generative engine for Raven-style progressive matrices.
//!
//! The pipeline runs in two stages:
//!
//! 1. [`MatrixComposer`] draws one [`Rule`] per active slot from the
//!    [`RuleCatalog`], derives the 3x3 grid and rejects it unless the hidden
//!    cell has exactly one catalog-consistent answer.
//! 2. [`DistractorGenerator`] perturbs the ground truth along one rule at a
//!    time and hides it among the results, giving a [`Problem`].
//!
//! ```
//! use raven_core::{generate_problem, GeneratorConfig};
//!
//! let config = GeneratorConfig { random_seed: 7, ..Default::default() };
//! let problem = generate_problem(&config).unwrap();
//! assert_eq!(problem.options().len(), config.distractor_count + 1);
//! problem.check_invariants().unwrap();
//! ```

pub mod attribute;
pub mod batch;
pub mod catalog;
pub mod composer;
pub mod config;
pub mod distractor;
pub mod element;
pub mod error;
pub mod matrix;
pub mod problem;
pub mod problem_io;
pub mod rng;
pub mod rule;

pub use attribute::{Attribute, DomainKind};
pub use batch::{generate_batch, BatchItem};
pub use catalog::RuleCatalog;
pub use composer::MatrixComposer;
pub use config::{ConfigError, GeneratorConfig};
pub use distractor::DistractorGenerator;
pub use element::{Element, ElementBuilder, Panel, Primitive};
pub use error::{RavenError, Result};
pub use matrix::{Matrix, RuleSlot, SlotGrid};
pub use problem::Problem;
pub use problem_io::{load_problem, save_problem, ProblemIoError};
pub use rng::{RavenRng, StdRandom};
pub use rule::{LogicOp, Rule, RuleKind, RuleKindTag};

/// Generate one problem from `config.random_seed`.
///
/// The same configuration always yields the same problem.
pub fn generate_problem(config: &GeneratorConfig) -> Result<Problem> {
    config.validate()?;
    let mut rng = StdRandom::from_seed(config.random_seed);
    let matrix = MatrixComposer::new(config, RuleCatalog::global()).compose(&mut rng)?;
    DistractorGenerator::new(config).generate(&matrix, &mut rng)
}
