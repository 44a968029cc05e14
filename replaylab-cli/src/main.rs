//! ReplayLab CLI: run and sweep commands.
//!
//! Commands:
//! - `run`: execute a buy-and-hold run from a TOML config file
//! - `sweep`: grid-search the volatility filter over lookbacks and thresholds
//! - `check`: load and validate a config file without running it
//!
//! Logging goes to stderr and is controlled by `RUST_LOG` (default `info`).

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use serde_json::json;
use std::path::{Path, PathBuf};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use replaylab_runner::{
    build_streams, load_config, run_from_config, run_id, BuyAndHold, FilterParams,
    FitnessMetric, ParamSweep, RunResult, VolatilityFilter,
};

#[derive(Parser)]
#[command(name = "replaylab", about = "ReplayLab CLI: deterministic bar-by-bar market replay")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run buy-and-hold over the configured data and print a JSON summary.
    Run {
        /// Path to a TOML config file.
        config: PathBuf,

        /// Symbol to buy on the first exposed bar.
        #[arg(long, default_value = "SPY")]
        symbol: String,

        /// Units to buy.
        #[arg(long, default_value_t = 100)]
        quantity: i64,

        /// Write the full result (NAV curve, fills) as JSON to this file.
        #[arg(long)]
        output: Option<PathBuf>,
    },
    /// Sweep the volatility filter and print runs ranked by a fitness metric.
    Sweep {
        /// Path to a TOML config file.
        config: PathBuf,

        #[arg(long, default_value = "SPY")]
        symbol: String,

        #[arg(long, default_value_t = 100)]
        quantity: i64,

        /// Volatility lookbacks in bars (comma separated).
        #[arg(long, value_delimiter = ',', default_value = "10,20,60")]
        lookbacks: Vec<usize>,

        /// Annualized volatility thresholds (comma separated).
        #[arg(long, value_delimiter = ',', default_value = "0.15,0.25,0.40")]
        thresholds: Vec<f64>,

        /// strategy, total_return, cagr, sharpe, sortino, calmar or max_drawdown.
        #[arg(long, default_value_t = FitnessMetric::Sharpe)]
        metric: FitnessMetric,

        /// Run serially instead of on the rayon pool.
        #[arg(long, default_value_t = false)]
        serial: bool,
    },
    /// Load and validate a config file.
    Check {
        config: PathBuf,
    },
}

fn main() -> Result<()> {
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let cli = Cli::parse();

    match cli.command {
        Commands::Run {
            config,
            symbol,
            quantity,
            output,
        } => run_cmd(&config, symbol, quantity, output.as_deref()),
        Commands::Sweep {
            config,
            symbol,
            quantity,
            lookbacks,
            thresholds,
            metric,
            serial,
        } => sweep_cmd(&config, &symbol, quantity, &lookbacks, &thresholds, metric, serial),
        Commands::Check { config } => check_cmd(&config),
    }
}

fn run_cmd(config_path: &Path, symbol: String, quantity: i64, output: Option<&Path>) -> Result<()> {
    if quantity == 0 {
        bail!("--quantity must be non-zero");
    }
    let config = load_config(config_path)?;
    let mut algorithm = BuyAndHold::new(symbol, quantity);
    let result = run_from_config(&config, &mut algorithm)?;

    println!("{}", serde_json::to_string_pretty(&summary_json(&result))?);

    if let Some(path) = output {
        let file = std::fs::File::create(path)
            .with_context(|| format!("cannot create {}", path.display()))?;
        serde_json::to_writer_pretty(file, &result)?;
        tracing::info!(path = %path.display(), "result written");
    }
    Ok(())
}

fn sweep_cmd(
    config_path: &Path,
    symbol: &str,
    quantity: i64,
    lookbacks: &[usize],
    thresholds: &[f64],
    metric: FitnessMetric,
    serial: bool,
) -> Result<()> {
    if lookbacks.is_empty() || thresholds.is_empty() {
        bail!("--lookbacks and --thresholds must not be empty");
    }

    let config = load_config(config_path)?;
    let streams = build_streams(&config.sources);
    let grid: Vec<FilterParams> = lookbacks
        .iter()
        .flat_map(|&lookback| {
            thresholds.iter().map(move |&threshold| FilterParams {
                lookback,
                threshold,
            })
        })
        .collect();

    let results = ParamSweep::new()
        .with_parallelism(!serial)
        .with_metric(metric)
        .run(&config, &streams, &grid, |p| {
            VolatilityFilter::new(symbol, quantity, *p)
        })?;

    let ranked: Vec<_> = results
        .ranked()
        .into_iter()
        .map(|e| {
            json!({
                "lookback": e.params.lookback,
                "threshold": e.params.threshold,
                "score": e.score,
                "total_return": e.result.metrics.total_return,
                "sharpe": e.result.metrics.sharpe,
                "max_drawdown": e.result.metrics.max_drawdown,
                "fills": e.result.metrics.fill_count,
            })
        })
        .collect();
    let out = json!({
        "run_id": run_id(&config),
        "metric": metric,
        "runs": ranked,
    });
    println!("{}", serde_json::to_string_pretty(&out)?);
    Ok(())
}

fn check_cmd(config_path: &Path) -> Result<()> {
    let config = load_config(config_path)?;
    let out = json!({
        "run_id": run_id(&config),
        "start": config.start,
        "warmup_start": config.warmup_start(),
        "end": config.end,
        "sources": config.sources.len(),
    });
    println!("{}", serde_json::to_string_pretty(&out)?);
    Ok(())
}

fn summary_json(result: &RunResult) -> serde_json::Value {
    json!({
        "run_id": result.run_id,
        "initial_cash": result.initial_cash,
        "final_nav": result.final_nav(),
        "cash": result.cash,
        "positions": result.positions,
        "metrics": result.metrics,
        "summary": result.summary,
        "fitness": result.fitness,
        "report": result.report,
    })
}
