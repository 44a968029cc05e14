//! Reference strategies shipped with the runner.
//!
//! `BuyAndHold` is the baseline the CLI runs. `VolatilityFilter` holds a
//! position only while realized volatility stays under a threshold and is the
//! parameterized strategy used for sweeps.

use serde_json::json;

use replaylab_core::domain::Order;
use replaylab_core::engine::{Algorithm, BarContext, RunOutcome, SimError};
use replaylab_core::indicators::volatility;

/// Buys `quantity` of `symbol` at the first exposed bar it trades and holds.
#[derive(Debug, Clone)]
pub struct BuyAndHold {
    symbol: String,
    quantity: i64,
    submitted: bool,
    fill_count: usize,
}

impl BuyAndHold {
    pub fn new(symbol: impl Into<String>, quantity: i64) -> Self {
        Self {
            symbol: symbol.into(),
            quantity,
            submitted: false,
            fill_count: 0,
        }
    }

    pub fn symbol(&self) -> &str {
        &self.symbol
    }
}

impl Algorithm for BuyAndHold {
    fn on_bar(&mut self, ctx: &mut BarContext<'_>) -> Result<(), SimError> {
        if self.submitted || !ctx.market.contains(&self.symbol) {
            return Ok(());
        }
        ctx.submit(Order::at_next_open(self.symbol.clone(), self.quantity))?;
        self.submitted = true;
        Ok(())
    }

    fn on_finish(&mut self, outcome: &RunOutcome) {
        self.fill_count = outcome
            .fills
            .iter()
            .filter(|f| f.symbol == self.symbol)
            .count();
    }

    fn report(&self) -> Option<serde_json::Value> {
        Some(json!({
            "strategy": "buy_and_hold",
            "symbol": self.symbol,
            "quantity": self.quantity,
            "fills": self.fill_count,
        }))
    }
}

/// Sweep parameters for `VolatilityFilter`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FilterParams {
    pub lookback: usize,
    /// Annualized volatility above which the position is closed.
    pub threshold: f64,
}

/// Long `quantity` of `symbol` while close-to-close volatility over
/// `lookback` bars is positive and below `threshold`, flat otherwise.
#[derive(Debug, Clone)]
pub struct VolatilityFilter {
    symbol: String,
    quantity: i64,
    params: FilterParams,
    switches: usize,
}

impl VolatilityFilter {
    pub fn new(symbol: impl Into<String>, quantity: i64, params: FilterParams) -> Self {
        Self {
            symbol: symbol.into(),
            quantity,
            params,
            switches: 0,
        }
    }
}

impl Algorithm for VolatilityFilter {
    fn on_bar(&mut self, ctx: &mut BarContext<'_>) -> Result<(), SimError> {
        let Ok(inst) = ctx.instrument(&self.symbol) else {
            return Ok(());
        };
        let vol = volatility(ctx.memo, &inst.close(), self.params.lookback)
            .read(0)
            .copied()
            .unwrap_or(0.0);

        let target = if vol > 0.0 && vol < self.params.threshold {
            self.quantity
        } else {
            0
        };
        let delta = target - ctx.position(&self.symbol);
        if delta != 0 {
            ctx.submit(Order::at_next_open(self.symbol.clone(), delta))?;
            self.switches += 1;
        }
        Ok(())
    }

    fn report(&self) -> Option<serde_json::Value> {
        Some(json!({
            "strategy": "volatility_filter",
            "symbol": self.symbol,
            "lookback": self.params.lookback,
            "threshold": self.params.threshold,
            "switches": self.switches,
        }))
    }
}
