//! Performance metrics: pure functions over a NAV curve.
//!
//! Every metric takes the NAV sampled once per exposed bar and returns a
//! scalar. No dependencies on the runner, data streams, or engine.

use serde::{Deserialize, Serialize};

/// Bars per year used for annualization.
pub const BARS_PER_YEAR: f64 = 252.0;

/// Aggregate performance metrics for a single run.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PerformanceMetrics {
    pub total_return: f64,
    pub cagr: f64,
    pub sharpe: f64,
    pub sortino: f64,
    pub calmar: f64,
    pub max_drawdown: f64,
    /// Annualized standard deviation of bar-to-bar NAV returns.
    pub volatility: f64,
    pub fill_count: usize,
}

impl PerformanceMetrics {
    pub fn compute(nav_curve: &[f64], fill_count: usize) -> Self {
        Self {
            total_return: total_return(nav_curve),
            cagr: cagr(nav_curve),
            sharpe: sharpe_ratio(nav_curve, 0.0),
            sortino: sortino_ratio(nav_curve, 0.0),
            calmar: calmar_ratio(nav_curve),
            max_drawdown: max_drawdown(nav_curve),
            volatility: annualized_volatility(nav_curve),
            fill_count,
        }
    }
}

// ─── Individual metric functions ────────────────────────────────────

fn endpoints(nav_curve: &[f64]) -> Option<(f64, f64)> {
    match nav_curve {
        [first, .., last] => Some((*first, *last)),
        _ => None,
    }
}

/// Total return as a fraction: (final - initial) / initial.
pub fn total_return(nav_curve: &[f64]) -> f64 {
    match endpoints(nav_curve) {
        Some((initial, last)) if initial > 0.0 => (last - initial) / initial,
        _ => 0.0,
    }
}

/// Compound annual growth rate over the curve's length in bars.
pub fn cagr(nav_curve: &[f64]) -> f64 {
    let Some((initial, last)) = endpoints(nav_curve) else {
        return 0.0;
    };
    if initial <= 0.0 || last <= 0.0 {
        return 0.0;
    }
    let years = nav_curve.len() as f64 / BARS_PER_YEAR;
    (last / initial).powf(1.0 / years) - 1.0
}

/// Annualized Sharpe ratio: mean(excess) / std(excess) * sqrt(252).
///
/// 0 with fewer than two returns or zero variance.
pub fn sharpe_ratio(nav_curve: &[f64], risk_free_rate: f64) -> f64 {
    let excess = excess_returns(nav_curve, risk_free_rate);
    if excess.len() < 2 {
        return 0.0;
    }
    let std = std_dev(&excess);
    if std < 1e-15 {
        return 0.0;
    }
    mean(&excess) / std * BARS_PER_YEAR.sqrt()
}

/// Annualized Sortino ratio, penalizing downside deviation only.
pub fn sortino_ratio(nav_curve: &[f64], risk_free_rate: f64) -> f64 {
    let excess = excess_returns(nav_curve, risk_free_rate);
    if excess.len() < 2 {
        return 0.0;
    }
    let downside: f64 = excess.iter().filter(|r| **r < 0.0).map(|r| r * r).sum();
    let downside_std = (downside / excess.len() as f64).sqrt();
    if downside_std < 1e-15 {
        return 0.0;
    }
    mean(&excess) / downside_std * BARS_PER_YEAR.sqrt()
}

/// CAGR / |max drawdown|. 0 when there is no drawdown or CAGR is not positive.
pub fn calmar_ratio(nav_curve: &[f64]) -> f64 {
    let growth = cagr(nav_curve);
    let dd = max_drawdown(nav_curve);
    if dd >= 0.0 || growth <= 0.0 {
        return 0.0;
    }
    growth / dd.abs()
}

/// Maximum peak-to-trough decline as a negative fraction (-0.15 = 15%).
pub fn max_drawdown(nav_curve: &[f64]) -> f64 {
    let mut peak = f64::NEG_INFINITY;
    let mut worst = 0.0_f64;
    for &nav in nav_curve {
        peak = peak.max(nav);
        if peak > 0.0 {
            worst = worst.min((nav - peak) / peak);
        }
    }
    worst
}

pub fn annualized_volatility(nav_curve: &[f64]) -> f64 {
    let returns = bar_returns(nav_curve);
    if returns.len() < 2 {
        return 0.0;
    }
    std_dev(&returns) * BARS_PER_YEAR.sqrt()
}

// ─── Helpers ────────────────────────────────────────────────────────

/// Simple returns between consecutive NAV points. Steps from a non-positive NAV are skipped.
pub fn bar_returns(nav_curve: &[f64]) -> Vec<f64> {
    nav_curve
        .windows(2)
        .filter(|w| w[0] > 0.0)
        .map(|w| w[1] / w[0] - 1.0)
        .collect()
}

fn excess_returns(nav_curve: &[f64], risk_free_rate: f64) -> Vec<f64> {
    let per_bar = risk_free_rate / BARS_PER_YEAR;
    bar_returns(nav_curve).into_iter().map(|r| r - per_bar).collect()
}

fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

/// Sample standard deviation (n - 1).
fn std_dev(values: &[f64]) -> f64 {
    if values.len() < 2 {
        return 0.0;
    }
    let m = mean(values);
    let var = values.iter().map(|v| (v - m).powi(2)).sum::<f64>() / (values.len() - 1) as f64;
    var.sqrt()
}
