//! `raven-gen`: generate Raven's Progressive Matrix problems.
//!
//! **Usage:**
//! ```text
//! raven-gen [--config <file.json>] [--count N] [--seed S] [--strict]
//!           [--out <dir>] [--format json|bin] [--png]
//! ```
//!
//! Prints one summary line per problem. Exits non-zero if any problem failed.

use std::path::{Path, PathBuf};
use std::process;

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use raven_core::{generate_batch, save_problem, GeneratorConfig, Problem};
use raven_render::{render_problem_to_png, SheetLayout};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Format {
    Json,
    Bin,
}

impl Format {
    fn extension(self) -> &'static str {
        match self {
            Format::Json => "json",
            Format::Bin => "ravenprob",
        }
    }
}

/// Generate Raven's Progressive Matrix problems.
#[derive(Parser)]
#[command(name = "raven-gen", about = "Generate Raven's Progressive Matrix problems")]
struct Args {
    /// Generator config (JSON). Defaults apply when omitted.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Number of problems to generate.
    #[arg(long, default_value_t = 1)]
    count: usize,

    /// Base seed, overriding the config's `random_seed`.
    #[arg(long)]
    seed: Option<u64>,

    /// Require column rules as well as row rules.
    #[arg(long)]
    strict: bool,

    /// Number of distractors, overriding the config.
    #[arg(long)]
    distractors: Option<usize>,

    /// Directory for problem files. Nothing is written when omitted.
    #[arg(long)]
    out: Option<PathBuf>,

    #[arg(long, value_enum, default_value_t = Format::Json)]
    format: Format,

    /// Also write a PNG sheet per problem (requires --out).
    #[arg(long)]
    png: bool,
}

fn load_config(args: &Args) -> Result<GeneratorConfig> {
    let mut config = match &args.config {
        Some(path) => GeneratorConfig::load(path)
            .with_context(|| format!("loading config {}", path.display()))?,
        None => GeneratorConfig::default(),
    };
    if let Some(seed) = args.seed {
        config.random_seed = seed;
    }
    if args.strict {
        config.strict_columns = true;
    }
    if let Some(count) = args.distractors {
        config.distractor_count = count;
    }
    config.validate().context("invalid generator config")?;
    Ok(config)
}

fn write_outputs(problem: &Problem, index: usize, dir: &Path, args: &Args) -> Result<()> {
    let path = dir.join(format!("problem_{}.{}", index, args.format.extension()));
    save_problem(problem, &path).with_context(|| format!("writing {}", path.display()))?;
    if args.png {
        let png = dir.join(format!("problem_{}.png", index));
        render_problem_to_png(problem, &SheetLayout::default(), &png)
            .with_context(|| format!("writing {}", png.display()))?;
    }
    Ok(())
}

fn summary(index: usize, seed: u64, problem: &Problem) -> String {
    let rules: Vec<String> = problem
        .rules()
        .iter()
        .map(|(slot, rule)| {
            if slot.layer == 0 {
                rule.to_string()
            } else {
                format!("[{}] {}", slot.layer, rule)
            }
        })
        .collect();
    format!(
        "#{} seed={} answer={} options={} rules: {}",
        index,
        seed,
        problem.answer_index(),
        problem.options().len(),
        rules.join("; ")
    )
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(false)
        .init();

    let args = Args::parse();
    if args.png && args.out.is_none() {
        anyhow::bail!("--png requires --out");
    }
    let config = load_config(&args)?;
    if let Some(dir) = &args.out {
        std::fs::create_dir_all(dir).with_context(|| format!("creating {}", dir.display()))?;
    }

    info!(
        count = args.count,
        seed = config.random_seed,
        strict = config.strict_columns,
        "generating problems"
    );

    let mut failed = 0usize;
    for item in generate_batch(&config, args.count) {
        let problem = match item.result {
            Ok(problem) => problem,
            Err(err) => {
                error!(index = item.index, seed = item.seed, error = %err, "generation failed");
                failed += 1;
                continue;
            }
        };
        println!("{}", summary(item.index, item.seed, &problem));
        if let Some(dir) = &args.out {
            if let Err(err) = write_outputs(&problem, item.index, dir, &args) {
                let detail = format!("{err:#}");
                error!(index = item.index, error = %detail, "write failed");
                failed += 1;
            }
        }
    }

    if failed > 0 {
        error!(failed, total = args.count, "some problems failed");
        process::exit(1);
    }
    Ok(())
}
