//! Orders issued by a strategy and consumed once by the execution engine.

use serde::{Deserialize, Serialize};

/// When an order executes relative to the bar it was submitted on.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum Timing {
    /// Fill against the bar the strategy saw when it submitted the order.
    PriorClose,
    /// Fill at the open of the instrument's next bar.
    NextOpen,
    /// Settlement of an expired option at a pre-computed intrinsic value.
    Expiry { settlement: f64 },
}

/// Price constraint on a fill.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum PriceSpec {
    Market,
    /// Fill only at this price or better (at or below for buys, at or above for sells).
    Limit(f64),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Order {
    pub symbol: String,
    /// Positive buys, negative sells.
    pub quantity: i64,
    pub timing: Timing,
    pub price: PriceSpec,
}

impl Order {
    pub fn new(symbol: impl Into<String>, quantity: i64, timing: Timing) -> Self {
        Self {
            symbol: symbol.into(),
            quantity,
            timing,
            price: PriceSpec::Market,
        }
    }

    pub fn at_prior_close(symbol: impl Into<String>, quantity: i64) -> Self {
        Self::new(symbol, quantity, Timing::PriorClose)
    }

    pub fn at_next_open(symbol: impl Into<String>, quantity: i64) -> Self {
        Self::new(symbol, quantity, Timing::NextOpen)
    }

    pub(crate) fn expiry(symbol: impl Into<String>, quantity: i64, settlement: f64) -> Self {
        Self::new(symbol, quantity, Timing::Expiry { settlement })
    }

    pub fn with_limit(mut self, limit: f64) -> Self {
        self.price = PriceSpec::Limit(limit);
        self
    }

    pub fn is_buy(&self) -> bool {
        self.quantity > 0
    }

    /// Whether a fill at `price` satisfies this order's price constraint.
    pub fn accepts(&self, price: f64) -> bool {
        match self.price {
            PriceSpec::Market => true,
            PriceSpec::Limit(limit) => {
                if self.is_buy() {
                    price <= limit
                } else {
                    price >= limit
                }
            }
        }
    }
}
