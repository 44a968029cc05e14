//! Cost model: commission charged on each fill.
//!
//! Commission is the sum of a per-contract fee and a basis-point charge on the
//! absolute notional. The default model is frictionless (zero commission).

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct CostModel {
    /// Flat fee per unit (share or contract) traded.
    #[serde(default)]
    pub per_contract: f64,
    /// Commission in basis points of absolute notional.
    #[serde(default)]
    pub commission_bps: f64,
}

impl CostModel {
    pub fn new(per_contract: f64, commission_bps: f64) -> Self {
        Self {
            per_contract,
            commission_bps,
        }
    }

    pub fn frictionless() -> Self {
        Self::default()
    }

    pub fn is_frictionless(&self) -> bool {
        self.per_contract == 0.0 && self.commission_bps == 0.0
    }

    /// Commission for a fill of `quantity` units at `price`.
    pub fn commission(&self, quantity: i64, price: f64, multiplier: f64) -> f64 {
        if self.is_frictionless() {
            return 0.0;
        }
        let units = quantity.unsigned_abs() as f64;
        let notional = units * price.abs() * multiplier;
        units * self.per_contract + notional * self.commission_bps / 10_000.0
    }
}
