//! Single-run driver: wires configuration, streams, simulation and metrics.
//!
//! Two entry points:
//! - `run_simulation()`: caller-supplied streams. Used by sweeps and tests.
//! - `run_from_config()`: validates the config and builds streams from its
//!   sources first. Used by the CLI.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use thiserror::Error;

use replaylab_core::config::{ConfigError, SimConfig};
use replaylab_core::data::DataStream;
use replaylab_core::domain::LogEntry;
use replaylab_core::engine::{Algorithm, NavPoint, RunSummary, SimError, Simulation};

use crate::config::{run_id, RunId};
use crate::data_loader::build_streams;
use crate::metrics::PerformanceMetrics;

#[derive(Debug, Error)]
pub enum RunError {
    #[error("config error: {0}")]
    Config(#[from] ConfigError),

    #[error("simulation error: {0}")]
    Simulation(#[from] SimError),
}

/// Complete result of a single run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunResult {
    pub run_id: RunId,
    pub nav_curve: Vec<NavPoint>,
    pub fills: Vec<LogEntry>,
    pub positions: BTreeMap<String, i64>,
    pub cash: f64,
    pub initial_cash: f64,
    pub summary: RunSummary,
    pub metrics: PerformanceMetrics,
    /// Score from `Algorithm::fitness`.
    pub fitness: f64,
    pub report: Option<serde_json::Value>,
}

impl RunResult {
    pub fn final_nav(&self) -> f64 {
        self.nav_curve
            .last()
            .map(|p| p.nav)
            .unwrap_or(self.initial_cash)
    }
}

/// Run one simulation over `streams` and collect metrics.
pub fn run_simulation(
    config: &SimConfig,
    streams: &[Box<dyn DataStream>],
    algorithm: &mut dyn Algorithm,
) -> Result<RunResult, RunError> {
    let id = run_id(config);
    let outcome = Simulation::new(config, streams)?.run(algorithm)?;

    let navs: Vec<f64> = outcome.nav_curve.iter().map(|p| p.nav).collect();
    let metrics = PerformanceMetrics::compute(&navs, outcome.fills.len());
    let fitness = algorithm.fitness(&outcome);
    let report = algorithm.report();

    tracing::info!(
        run_id = %&id[..12],
        total_return = metrics.total_return,
        sharpe = metrics.sharpe,
        fills = metrics.fill_count,
        "run complete"
    );

    Ok(RunResult {
        run_id: id,
        nav_curve: outcome.nav_curve,
        fills: outcome.fills,
        positions: outcome.positions,
        cash: outcome.cash,
        initial_cash: outcome.initial_cash,
        summary: outcome.summary,
        metrics,
        fitness,
        report,
    })
}

/// Validate `config`, build its streams and run.
pub fn run_from_config(config: &SimConfig, algorithm: &mut dyn Algorithm) -> Result<RunResult, RunError> {
    config.validate()?;
    let streams = build_streams(&config.sources);
    run_simulation(config, &streams, algorithm)
}
