//! Simulation configuration and setup-time validation.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use thiserror::Error;

use crate::data::DateWindow;
use crate::engine::CostModel;

/// Errors raised before any bar is simulated.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    #[error("no data sources configured")]
    NoSources,

    #[error("start date {start} is after end date {end}")]
    InvalidDateRange { start: NaiveDate, end: NaiveDate },

    #[error("warmup start {warmup_start} is after start date {start}")]
    WarmupAfterStart {
        warmup_start: NaiveDate,
        start: NaiveDate,
    },

    #[error("initial cash must be positive and finite, got {0}")]
    InvalidCash(f64),

    #[error("data file not found: {0}")]
    MissingPath(PathBuf),

    #[error("invalid data source: {0}")]
    InvalidSource(String),

    #[error("invalid cost model: {0}")]
    InvalidCosts(String),
}

/// Where one stream's bars come from. Streams are built by the runner.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SourceConfig {
    /// A CSV file of bar records.
    Csv {
        path: PathBuf,
        #[serde(default)]
        name: Option<String>,
    },

    /// A seeded random walk for one symbol.
    Synthetic {
        symbol: String,
        seed: u64,
        #[serde(default = "default_start_price")]
        start_price: f64,
        #[serde(default = "default_daily_volatility")]
        daily_volatility: f64,
    },
}

fn default_start_price() -> f64 {
    100.0
}

fn default_daily_volatility() -> f64 {
    0.01
}

impl SourceConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        match self {
            Self::Csv { path, .. } => {
                if !path.exists() {
                    return Err(ConfigError::MissingPath(path.clone()));
                }
            }
            Self::Synthetic {
                symbol,
                start_price,
                daily_volatility,
                ..
            } => {
                if symbol.trim().is_empty() {
                    return Err(ConfigError::InvalidSource("synthetic symbol is empty".into()));
                }
                if !(start_price.is_finite() && *start_price > 0.0) {
                    return Err(ConfigError::InvalidSource(format!(
                        "synthetic start price must be positive, got {start_price}"
                    )));
                }
                if !(daily_volatility.is_finite() && *daily_volatility >= 0.0) {
                    return Err(ConfigError::InvalidSource(format!(
                        "synthetic volatility must be non-negative, got {daily_volatility}"
                    )));
                }
            }
        }
        Ok(())
    }
}

/// Configuration for one simulation run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimConfig {
    /// First date exposed to the strategy.
    pub start: NaiveDate,
    /// First date loaded. Defaults to `start`.
    #[serde(default)]
    pub warmup_start: Option<NaiveDate>,
    /// Last date loaded and exposed (inclusive).
    pub end: NaiveDate,
    pub initial_cash: f64,
    /// Commission charged on fills. Frictionless when omitted.
    #[serde(default)]
    pub costs: CostModel,
    #[serde(default)]
    pub sources: Vec<SourceConfig>,
}

impl SimConfig {
    pub fn new(start: NaiveDate, end: NaiveDate, initial_cash: f64) -> Self {
        Self {
            start,
            warmup_start: None,
            end,
            initial_cash,
            costs: CostModel::frictionless(),
            sources: Vec::new(),
        }
    }

    pub fn with_costs(mut self, costs: CostModel) -> Self {
        self.costs = costs;
        self
    }

    pub fn with_warmup(mut self, warmup_start: NaiveDate) -> Self {
        self.warmup_start = Some(warmup_start);
        self
    }

    pub fn with_source(mut self, source: SourceConfig) -> Self {
        self.sources.push(source);
        self
    }

    pub fn warmup_start(&self) -> NaiveDate {
        self.warmup_start.unwrap_or(self.start)
    }

    /// Window streams are opened over: warmup start through end.
    pub fn load_window(&self) -> DateWindow {
        DateWindow::new(self.warmup_start(), self.end)
    }

    /// Window whose timestamps are handed to the strategy.
    pub fn exposure_window(&self) -> DateWindow {
        DateWindow::new(self.start, self.end)
    }

    /// Date range and cash checks. Sources are checked by `validate`.
    pub fn validate_window(&self) -> Result<(), ConfigError> {
        if self.start > self.end {
            return Err(ConfigError::InvalidDateRange {
                start: self.start,
                end: self.end,
            });
        }
        if self.warmup_start() > self.start {
            return Err(ConfigError::WarmupAfterStart {
                warmup_start: self.warmup_start(),
                start: self.start,
            });
        }
        if !(self.initial_cash.is_finite() && self.initial_cash > 0.0) {
            return Err(ConfigError::InvalidCash(self.initial_cash));
        }
        let CostModel {
            per_contract,
            commission_bps,
        } = self.costs;
        if !(per_contract.is_finite() && per_contract >= 0.0)
            || !(commission_bps.is_finite() && commission_bps >= 0.0)
        {
            return Err(ConfigError::InvalidCosts(format!(
                "per_contract={per_contract}, commission_bps={commission_bps}"
            )));
        }
        Ok(())
    }

    /// Full validation, including every configured source.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.validate_window()?;
        if self.sources.is_empty() {
            return Err(ConfigError::NoSources);
        }
        for source in &self.sources {
            source.validate()?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn synthetic() -> SourceConfig {
        SourceConfig::Synthetic {
            symbol: "SPY".into(),
            seed: 42,
            start_price: 100.0,
            daily_volatility: 0.01,
        }
    }

    #[test]
    fn warmup_defaults_to_start() {
        let config = SimConfig::new(date(2024, 1, 1), date(2024, 6, 30), 100_000.0);
        assert_eq!(config.warmup_start(), date(2024, 1, 1));
        assert_eq!(config.load_window(), config.exposure_window());
    }

    #[test]
    fn valid_config_passes() {
        let config = SimConfig::new(date(2024, 1, 1), date(2024, 6, 30), 100_000.0)
            .with_warmup(date(2023, 10, 1))
            .with_source(synthetic());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn rejects_inverted_dates() {
        let config = SimConfig::new(date(2024, 6, 30), date(2024, 1, 1), 100_000.0);
        assert!(matches!(
            config.validate_window(),
            Err(ConfigError::InvalidDateRange { .. })
        ));
    }

    #[test]
    fn rejects_warmup_after_start() {
        let config = SimConfig::new(date(2024, 1, 1), date(2024, 6, 30), 100_000.0)
            .with_warmup(date(2024, 2, 1));
        assert!(matches!(
            config.validate_window(),
            Err(ConfigError::WarmupAfterStart { .. })
        ));
    }

    #[test]
    fn rejects_bad_cash() {
        let config = SimConfig::new(date(2024, 1, 1), date(2024, 6, 30), f64::NAN);
        assert!(matches!(config.validate_window(), Err(ConfigError::InvalidCash(_))));
        let config = SimConfig::new(date(2024, 1, 1), date(2024, 6, 30), 0.0);
        assert!(matches!(config.validate_window(), Err(ConfigError::InvalidCash(_))));
    }

    #[test]
    fn rejects_negative_costs() {
        let config = SimConfig::new(date(2024, 1, 1), date(2024, 6, 30), 100_000.0)
            .with_costs(CostModel::new(-1.0, 0.0));
        assert!(matches!(config.validate_window(), Err(ConfigError::InvalidCosts(_))));
    }

    #[test]
    fn rejects_missing_sources_and_paths() {
        let config = SimConfig::new(date(2024, 1, 1), date(2024, 6, 30), 100_000.0);
        assert_eq!(config.validate(), Err(ConfigError::NoSources));

        let config = config.with_source(SourceConfig::Csv {
            path: PathBuf::from("/definitely/not/here.csv"),
            name: None,
        });
        assert!(matches!(config.validate(), Err(ConfigError::MissingPath(_))));
    }

    #[test]
    fn source_config_serialization() {
        let json = r#"{"type":"synthetic","symbol":"SPY","seed":7}"#;
        let source: SourceConfig = serde_json::from_str(json).unwrap();
        assert_eq!(
            source,
            SourceConfig::Synthetic {
                symbol: "SPY".into(),
                seed: 7,
                start_price: 100.0,
                daily_volatility: 0.01,
            }
        );
    }
}
