//! Exponentially weighted running mean and variance.
//!
//! alpha = 2 / (n + 1), with a span of 0 treated as 1 (alpha = 1, so the
//! variance stays 0). On the first update the mean is seeded with the
//! observed value and the variance with 0; afterwards:
//!
//! ```text
//! diff     = x - mean
//! incr     = alpha * diff
//! mean     = mean + incr
//! variance = (1 - alpha) * (variance + diff * incr)
//! ```
//!
//! State lives in the cache node, so each (series, n) pair keeps its own
//! running mean.

use crate::memo::{key_for, MemoCache, MemoKey};
use crate::series::{Lookback, Observable};

/// Running state of one fast-variance node.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct FastVariance {
    pub mean: f64,
    pub variance: f64,
    seeded: bool,
}

impl FastVariance {
    pub fn is_seeded(&self) -> bool {
        self.seeded
    }

    /// Fold one observation in and return the new variance.
    pub fn update(&mut self, x: f64, alpha: f64) -> f64 {
        if !x.is_finite() {
            return self.variance;
        }
        if !self.seeded {
            self.mean = x;
            self.variance = 0.0;
            self.seeded = true;
            return 0.0;
        }
        let diff = x - self.mean;
        let incr = alpha * diff;
        self.mean += incr;
        self.variance = (1.0 - alpha) * (self.variance + diff * incr);
        self.variance
    }
}

/// `2 / (n + 1)` for `n >= 1`; a span of 0 gives 1.
pub fn smoothing_factor(n: usize) -> f64 {
    2.0 / (n.max(1) as f64 + 1.0)
}

/// Key of the fast-variance node over `series` with span `n`.
pub fn fast_variance_key(series: &dyn Observable, n: usize) -> MemoKey {
    key_for("fast_variance", series, &[n as f64])
}

/// Cached fast variance of `series` with span `n`.
///
/// The node's series holds the variance; the running mean is available
/// through `MemoCache::state::<FastVariance>(&fast_variance_key(series, n))`.
pub fn fast_variance<'c>(cache: &'c mut MemoCache, series: &dyn Observable, n: usize) -> &'c Lookback<f64> {
    let alpha = smoothing_factor(n);
    let key = fast_variance_key(series, n);
    cache.compute(key, FastVariance::default, |state: &mut FastVariance, _| {
        match series.observe(0) {
            Some(x) => state.update(x, alpha),
            None => state.variance,
        }
    })
}
