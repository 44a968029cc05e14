use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::domain::{Bar, Order};

/// Immutable record of one fill.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogEntry {
    /// Simulation timestamp at which the fill was booked.
    pub timestamp: NaiveDateTime,
    pub symbol: String,
    pub order: Order,
    /// Bar the order executed against.
    pub bar: Bar,
    /// NAV at fill time (prior bar's for prior-close fills, current bar's otherwise).
    pub nav: f64,
    pub price: f64,
    pub commission: f64,
}

impl LogEntry {
    pub fn quantity(&self) -> i64 {
        self.order.quantity
    }

    /// Signed cash impact excluding commission, given the contract multiplier.
    pub fn notional(&self, multiplier: f64) -> f64 {
        self.order.quantity as f64 * self.price * multiplier
    }
}
