//! ReplayLab Runner: configuration files, data sources, run orchestration.
//!
//! This crate builds on `replaylab-core` to provide:
//! - TOML run configuration with relative path resolution
//! - CSV and synthetic random-walk data streams
//! - Single-run driver with performance metrics
//! - Parallel parameter sweeps ranked by a fitness metric
//! - Reference strategies

pub mod config;
pub mod data_loader;
pub mod fitness;
pub mod metrics;
pub mod runner;
pub mod strategies;
pub mod sweep;

pub use config::{load_config, parse_config, run_id, ConfigFileError, RunId};
pub use data_loader::{build_streams, CsvStream, SyntheticStream};
pub use fitness::{FitnessMetric, UnknownMetric};
pub use metrics::PerformanceMetrics;
pub use runner::{run_from_config, run_simulation, RunError, RunResult};
pub use strategies::{BuyAndHold, FilterParams, VolatilityFilter};
pub use sweep::{ParamSweep, SweepEntry, SweepResults};

#[cfg(test)]
mod send_sync_checks {
    use super::*;

    fn assert_send<T: Send>() {}
    fn assert_sync<T: Sync>() {}

    #[test]
    fn run_result_is_send_sync() {
        assert_send::<RunResult>();
        assert_sync::<RunResult>();
    }

    #[test]
    fn streams_are_send_sync() {
        assert_send::<CsvStream>();
        assert_sync::<CsvStream>();
        assert_send::<SyntheticStream>();
        assert_sync::<SyntheticStream>();
    }

    #[test]
    fn sweep_types_are_send_sync() {
        assert_send::<ParamSweep>();
        assert_sync::<ParamSweep>();
        assert_send::<SweepResults<FilterParams>>();
        assert_sync::<SweepResults<FilterParams>>();
    }

    #[test]
    fn performance_metrics_is_send_sync() {
        assert_send::<PerformanceMetrics>();
        assert_sync::<PerformanceMetrics>();
    }
}
