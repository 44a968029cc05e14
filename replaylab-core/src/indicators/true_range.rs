//! True Range.
//!
//! TR = max(high, prev_close) - min(low, prev_close).
//! Returns 0 on the first bar of an instrument, where no previous close exists.

use crate::domain::{Bar, Instrument};
use crate::memo::{MemoCache, MemoKey};
use crate::series::Lookback;

/// Cached true range of `instrument`'s latest bar.
pub fn true_range<'c>(cache: &'c mut MemoCache, instrument: &Instrument) -> &'c Lookback<f64> {
    let bars = instrument.bars();
    let key = MemoKey::new("true_range", bars.id(), &[]);
    cache.compute(key, || (), |_, _| bar_true_range(bars))
}

/// Uncached true range at the series' current offset.
pub fn bar_true_range(bars: &Lookback<Bar>) -> f64 {
    let (Some(today), Some(yesterday)) = (bars.read(0), bars.read(1)) else {
        return 0.0;
    };
    let prev_close = yesterday.close;
    let tr = today.high.max(prev_close) - today.low.min(prev_close);
    if tr.is_finite() {
        tr
    } else {
        0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::indicators::{assert_approx, make_bars, DEFAULT_EPSILON};

    fn history(data: &[(f64, f64, f64, f64)]) -> Lookback<Bar> {
        let mut bars = Lookback::new("bars/TEST");
        for bar in make_bars(data) {
            bars.write(bar);
        }
        bars
    }

    #[test]
    fn first_bar_is_zero() {
        let bars = history(&[(100.0, 105.0, 95.0, 102.0)]);
        assert_eq!(bar_true_range(&bars), 0.0);
    }

    #[test]
    fn inside_bar_uses_high_low() {
        let bars = history(&[(100.0, 105.0, 95.0, 102.0), (102.0, 108.0, 100.0, 106.0)]);
        // max(108, 102) - min(100, 102) = 8
        assert_approx(bar_true_range(&bars), 8.0, DEFAULT_EPSILON);
    }

    #[test]
    fn gap_up_uses_previous_close() {
        let bars = history(&[(98.0, 102.0, 97.0, 100.0), (110.0, 115.0, 108.0, 112.0)]);
        // max(115, 100) - min(108, 100) = 15
        assert_approx(bar_true_range(&bars), 15.0, DEFAULT_EPSILON);
    }

    #[test]
    fn gap_down_uses_previous_close() {
        let bars = history(&[(98.0, 102.0, 97.0, 100.0), (90.0, 92.0, 85.0, 88.0)]);
        // max(92, 100) - min(85, 100) = 15
        assert_approx(bar_true_range(&bars), 15.0, DEFAULT_EPSILON);
    }
}
