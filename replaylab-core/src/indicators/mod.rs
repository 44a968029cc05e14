//! Cached indicator functions.
//!
//! Every indicator is a plain function of (cache, series, params). It hashes
//! the series id and params into a `MemoKey`, reuses or creates the node for
//! that key, and runs the node's recompute step at most once per bar. The
//! returned node is itself a `Lookback<f64>`, so past indicator values are
//! read by offset like any other series.
//!
//! Short histories are normal during early bars: every indicator falls back
//! to 0 instead of failing.

pub mod fast_variance;
pub mod true_range;
pub mod volatility;

pub use fast_variance::{fast_variance, fast_variance_key, smoothing_factor, FastVariance};
pub use true_range::{bar_true_range, true_range};
pub use volatility::{
    range_volatility, realized_volatility, volatility, volatility_from_range, TRADING_DAYS,
};

/// Series with `values` written oldest first.
#[cfg(test)]
pub fn series_of(values: &[f64]) -> crate::series::Lookback<f64> {
    let mut s = crate::series::Lookback::new("test-series");
    for &v in values {
        s.write(v);
    }
    s
}

/// Bars from (open, high, low, close) tuples on consecutive days.
#[cfg(test)]
pub fn make_bars(data: &[(f64, f64, f64, f64)]) -> Vec<crate::domain::Bar> {
    use crate::domain::Bar;
    let base = chrono::NaiveDate::from_ymd_opt(2024, 1, 2)
        .unwrap()
        .and_hms_opt(16, 0, 0)
        .unwrap();
    data.iter()
        .enumerate()
        .map(|(i, &(open, high, low, close))| {
            Bar::new(base + chrono::Duration::days(i as i64), open, high, low, close)
        })
        .collect()
}

/// Assert two f64 values are approximately equal (within epsilon).
#[cfg(test)]
pub fn assert_approx(actual: f64, expected: f64, epsilon: f64) {
    assert!(
        (actual - expected).abs() < epsilon,
        "assert_approx failed: actual={actual}, expected={expected}, diff={}, epsilon={epsilon}",
        (actual - expected).abs()
    );
}

/// Default epsilon for indicator tests.
#[cfg(test)]
pub const DEFAULT_EPSILON: f64 = 1e-10;
