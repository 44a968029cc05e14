//! Fitness function: configurable metric selector for ranking runs.

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

use crate::runner::RunResult;

/// Which score to rank runs by.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FitnessMetric {
    /// The strategy's own `Algorithm::fitness` (total return unless overridden).
    #[default]
    Strategy,
    TotalReturn,
    Cagr,
    Sharpe,
    Sortino,
    Calmar,
    MaxDrawdown,
}

/// A metric name that is not one of `FitnessMetric::ALL`.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown metric '{0}' (expected one of: strategy, total_return, cagr, sharpe, sortino, calmar, max_drawdown)")]
pub struct UnknownMetric(pub String);

impl FitnessMetric {
    pub const ALL: [FitnessMetric; 7] = [
        Self::Strategy,
        Self::TotalReturn,
        Self::Cagr,
        Self::Sharpe,
        Self::Sortino,
        Self::Calmar,
        Self::MaxDrawdown,
    ];

    /// Snake-case name, matching the serde representation.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Strategy => "strategy",
            Self::TotalReturn => "total_return",
            Self::Cagr => "cagr",
            Self::Sharpe => "sharpe",
            Self::Sortino => "sortino",
            Self::Calmar => "calmar",
            Self::MaxDrawdown => "max_drawdown",
        }
    }

    pub fn extract(&self, result: &RunResult) -> f64 {
        let m = &result.metrics;
        match self {
            Self::Strategy => result.fitness,
            Self::TotalReturn => m.total_return,
            Self::Cagr => m.cagr,
            Self::Sharpe => m.sharpe,
            Self::Sortino => m.sortino,
            Self::Calmar => m.calmar,
            Self::MaxDrawdown => m.max_drawdown,
        }
    }

    /// Returns true if score `a` ranks above `b`.
    ///
    /// Drawdowns are negative fractions, so -0.05 > -0.20 already means the
    /// smaller drawdown wins. NaN never ranks above anything.
    pub fn is_better(&self, a: f64, b: f64) -> bool {
        self.compare(a, b) == Ordering::Greater
    }

    /// Ranking order of two scores: `Greater` means `a` ranks above `b`.
    /// NaN ranks below every number and equal to another NaN.
    pub fn compare(&self, a: f64, b: f64) -> Ordering {
        match (a.is_nan(), b.is_nan()) {
            (true, true) => Ordering::Equal,
            (true, false) => Ordering::Less,
            (false, true) => Ordering::Greater,
            (false, false) => a.partial_cmp(&b).unwrap_or(Ordering::Equal),
        }
    }
}

impl fmt::Display for FitnessMetric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for FitnessMetric {
    type Err = UnknownMetric;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        Self::ALL
            .into_iter()
            .find(|m| m.name().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| UnknownMetric(s.to_string()))
    }
}
