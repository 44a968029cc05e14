//! Close-to-close and range-based annualized volatility.
//!
//! Close-to-close: sample standard deviation of the log returns across the
//! last `n` points (n-1 transitions), scaled by sqrt(252). The returns' own
//! mean is subtracted (Welford accumulation, divisor count - 1), so a steady
//! trend has zero volatility. Range-based: `0.63 * sqrt(252/n) * ln(high/low)` over the last
//! `n` points.
//!
//! Both return 0 when the history is too short or the inputs cannot produce a
//! finite value (non-positive prices).

use crate::memo::{key_for, MemoCache};
use crate::series::{Lookback, Observable};

/// Trading days per year used for annualization.
pub const TRADING_DAYS: f64 = 252.0;

/// Scaling constant of the range estimator.
pub const RANGE_SCALE: f64 = 0.63;

/// Cached close-to-close volatility of `series` over `n` points.
pub fn volatility<'c>(cache: &'c mut MemoCache, series: &dyn Observable, n: usize) -> &'c Lookback<f64> {
    let key = key_for("volatility", series, &[n as f64]);
    cache.compute(key, || (), |_, _| realized_volatility(series, n))
}

/// Cached range-based volatility of `series` over `n` points.
pub fn volatility_from_range<'c>(
    cache: &'c mut MemoCache,
    series: &dyn Observable,
    n: usize,
) -> &'c Lookback<f64> {
    let key = key_for("volatility_from_range", series, &[n as f64]);
    cache.compute(key, || (), |_, _| range_volatility(series, n))
}

/// Uncached close-to-close volatility at the series' current offset.
pub fn realized_volatility(series: &dyn Observable, n: usize) -> f64 {
    if n < 2 {
        return 0.0;
    }

    let mut count = 0usize;
    let mut mean = 0.0;
    let mut m2 = 0.0;

    for offset in 0..n - 1 {
        let (Some(now), Some(before)) = (series.observe(offset), series.observe(offset + 1)) else {
            break;
        };
        if now <= 0.0 || before <= 0.0 {
            continue;
        }
        let r = (now / before).ln();
        if !r.is_finite() {
            continue;
        }
        count += 1;
        let delta = r - mean;
        mean += delta / count as f64;
        m2 += delta * (r - mean);
    }

    if count < 2 {
        return 0.0;
    }
    let variance = m2 / (count - 1) as f64;
    let vol = (TRADING_DAYS * variance).sqrt();
    if vol.is_finite() {
        vol
    } else {
        0.0
    }
}

/// Uncached range-based volatility at the series' current offset.
///
/// Returns 0 until `n` points are available, or when the window's low is not positive.
pub fn range_volatility(series: &dyn Observable, n: usize) -> f64 {
    if n == 0 || series.depth() < n {
        return 0.0;
    }

    let mut high = f64::NEG_INFINITY;
    let mut low = f64::INFINITY;
    for offset in 0..n {
        let Some(v) = series.observe(offset) else {
            return 0.0;
        };
        high = high.max(v);
        low = low.min(v);
    }

    if low <= 0.0 {
        return 0.0;
    }
    let vol = RANGE_SCALE * (TRADING_DAYS / n as f64).sqrt() * (high / low).ln();
    if vol.is_finite() {
        vol
    } else {
        0.0
    }
}
