//! ParamLab CLI — inspect and walk strategy parameter spaces from a catalog.
//!
//! Commands:
//! - `count` — trial count per strategy, without enumerating
//! - `enumerate` — stream every trial (or one shard of them) as JSON lines
//! - `sample` — stream a seeded random subset of trials as JSON lines
//!
//! Logs go to stderr (filter with `RUST_LOG`); trial output goes to stdout.

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use serde::Serialize;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use tracing::info;
use tracing_subscriber::EnvFilter;

use paramlab_core::sampler::sample_combinations;
use paramlab_core::{
    resolve_strategy, Catalog, CombinationHash, DescriptorSource, ParameterCombination,
    SpaceDescriptor, SpaceError,
};

#[derive(Parser)]
#[command(
    name = "paramlab",
    about = "ParamLab CLI — strategy parameter-space enumeration"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the trial count of each strategy in a catalog.
    Count {
        /// Path to a TOML descriptor catalog.
        catalog: PathBuf,

        /// Only count this strategy.
        #[arg(long)]
        strategy: Option<String>,
    },
    /// Stream every trial of one strategy as JSON lines.
    Enumerate {
        /// Path to a TOML descriptor catalog.
        catalog: PathBuf,

        /// Strategy to enumerate.
        #[arg(long)]
        strategy: String,

        /// Only this shard, written as INDEX/COUNT (e.g. 0/4).
        #[arg(long, value_parser = parse_shard)]
        shard: Option<Shard>,

        /// Stop after this many trials.
        #[arg(long)]
        limit: Option<usize>,
    },
    /// Stream a seeded random sample of trials as JSON lines.
    Sample {
        /// Path to a TOML descriptor catalog.
        catalog: PathBuf,

        /// Strategy to sample from.
        #[arg(long)]
        strategy: String,

        /// Number of distinct trials to draw.
        #[arg(long)]
        n: usize,

        /// RNG seed.
        #[arg(long, default_value_t = 42)]
        seed: u64,
    },
}

#[derive(Debug, Clone, Copy)]
struct Shard {
    index: usize,
    count: usize,
}

fn parse_shard(s: &str) -> Result<Shard, String> {
    let (index, count) = s
        .split_once('/')
        .ok_or_else(|| format!("expected INDEX/COUNT, got '{s}'"))?;
    let index: usize = index.trim().parse().map_err(|e| format!("shard index: {e}"))?;
    let count: usize = count.trim().parse().map_err(|e| format!("shard count: {e}"))?;
    if count == 0 || index >= count {
        return Err(format!("shard index must be below a non-zero count, got {index}/{count}"));
    }
    Ok(Shard { index, count })
}

/// One JSON line of trial output.
#[derive(Serialize)]
struct TrialLine<'a> {
    trial: u64,
    fingerprint: CombinationHash,
    params: &'a ParameterCombination,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Count { catalog, strategy } => run_count(&catalog, strategy.as_deref()),
        Commands::Enumerate {
            catalog,
            strategy,
            shard,
            limit,
        } => run_enumerate(&catalog, &strategy, shard, limit),
        Commands::Sample {
            catalog,
            strategy,
            n,
            seed,
        } => run_sample(&catalog, &strategy, n, seed),
    }
}

fn load(path: &Path) -> Result<Catalog> {
    Catalog::from_file(path).with_context(|| format!("loading catalog {}", path.display()))
}

fn run_count(path: &Path, only: Option<&str>) -> Result<()> {
    let catalog = load(path)?;
    let names: Vec<&str> = match only {
        Some(name) => vec![name],
        None => catalog.strategy_names(),
    };
    if names.is_empty() {
        bail!("catalog {} declares no strategies", path.display());
    }

    let width = names.iter().map(|n| n.len()).max().unwrap_or(0);
    let mut overflowed = Vec::new();
    for name in names {
        let space = resolve_strategy(&catalog, name)
            .with_context(|| format!("resolving strategy '{name}'"))?;
        let axes = space.axes().len();
        match space.estimate_count() {
            Ok(count) => println!("{name:<width$}  axes={axes:<3} trials={count}"),
            Err(SpaceError::CombinationSpaceOverflow) => {
                println!("{name:<width$}  axes={axes:<3} trials=overflow (> {})", i64::MAX);
                overflowed.push(name);
            }
            Err(e) => return Err(e).with_context(|| format!("counting strategy '{name}'")),
        }
    }
    if !overflowed.is_empty() {
        bail!("trial count overflowed for: {}", overflowed.join(", "));
    }
    Ok(())
}

fn run_enumerate(
    path: &Path,
    strategy: &str,
    shard: Option<Shard>,
    limit: Option<usize>,
) -> Result<()> {
    let catalog = load(path)?;
    let space = resolve_strategy(&catalog, strategy)
        .with_context(|| format!("resolving strategy '{strategy}'"))?;

    // Refuse to start a walk whose length cannot even be counted.
    let total = space
        .estimate_count()
        .with_context(|| format!("strategy '{strategy}' is too large to enumerate"))?;

    let (part, offset) = match shard {
        Some(Shard { index, count }) => {
            let offset = space.shard_offset(index, count)?;
            match space.shard(index, count) {
                Some(part) => (part, offset),
                None => {
                    info!(strategy, index, count, "shard is empty");
                    return Ok(());
                }
            }
        }
        None => (space, 0),
    };
    info!(
        strategy,
        total,
        shard_trials = part.estimate_count()?,
        offset,
        "enumerating"
    );

    let stdout = std::io::stdout();
    let mut out = BufWriter::new(stdout.lock());
    let combinations = part.enumerate()?.take(limit.unwrap_or(usize::MAX));
    for (i, combination) in combinations.enumerate() {
        write_trial(&mut out, offset as u64 + i as u64, &combination)?;
    }
    out.flush()?;
    Ok(())
}

fn run_sample(path: &Path, strategy: &str, n: usize, seed: u64) -> Result<()> {
    let catalog = load(path)?;
    let space: SpaceDescriptor = resolve_strategy(&catalog, strategy)
        .with_context(|| format!("resolving strategy '{strategy}'"))?;
    let trials = sample_combinations(&space, n, seed)
        .with_context(|| format!("sampling strategy '{strategy}'"))?;
    info!(strategy, requested = n, drawn = trials.len(), seed, "sampled trials");

    let stdout = std::io::stdout();
    let mut out = BufWriter::new(stdout.lock());
    for trial in &trials {
        write_trial(&mut out, trial.index, &trial.combination)?;
    }
    out.flush()?;
    Ok(())
}

fn write_trial(out: &mut impl Write, trial: u64, params: &ParameterCombination) -> Result<()> {
    let line = TrialLine {
        trial,
        fingerprint: params.fingerprint(),
        params,
    };
    serde_json::to_writer(&mut *out, &line)?;
    writeln!(out)?;
    Ok(())
}
