//! Portfolio: cash plus signed integer positions.

use std::collections::btree_map::Entry;
use std::collections::BTreeMap;

use crate::domain::Market;

/// Cash and open positions for one run.
///
/// Positions are keyed by symbol in an ordered map so valuation and expiry
/// passes visit them in the same order on every run. An entry is removed as
/// soon as its quantity nets to exactly zero.
#[derive(Debug, Clone)]
pub struct Portfolio {
    cash: f64,
    initial_cash: f64,
    positions: BTreeMap<String, i64>,
}

impl Portfolio {
    pub fn new(initial_cash: f64) -> Self {
        Self {
            cash: initial_cash,
            initial_cash,
            positions: BTreeMap::new(),
        }
    }

    pub fn cash(&self) -> f64 {
        self.cash
    }

    pub fn initial_cash(&self) -> f64 {
        self.initial_cash
    }

    /// Signed quantity held, zero when flat.
    pub fn position(&self, symbol: &str) -> i64 {
        self.positions.get(symbol).copied().unwrap_or(0)
    }

    pub fn positions(&self) -> &BTreeMap<String, i64> {
        &self.positions
    }

    pub fn is_flat(&self) -> bool {
        self.positions.is_empty()
    }

    /// Book a fill: adjust the position, then move cash by
    /// `quantity * price * multiplier` plus commission.
    pub(crate) fn apply_fill(
        &mut self,
        symbol: &str,
        quantity: i64,
        price: f64,
        multiplier: f64,
        commission: f64,
    ) {
        match self.positions.entry(symbol.to_string()) {
            Entry::Occupied(mut held) => {
                let net = *held.get() + quantity;
                if net == 0 {
                    held.remove();
                } else {
                    *held.get_mut() = net;
                }
            }
            Entry::Vacant(slot) => {
                if quantity != 0 {
                    slot.insert(quantity);
                }
            }
        }
        self.cash -= quantity as f64 * price * multiplier;
        self.cash -= commission;
    }

    /// Cash plus every position marked at its instrument's latest close.
    pub fn valuation(&self, market: &Market) -> f64 {
        let marked: f64 = self
            .positions
            .iter()
            .map(|(symbol, &qty)| match market.get(symbol) {
                Ok(inst) => {
                    let close = inst.last_close().unwrap_or(0.0);
                    qty as f64 * close * inst.multiplier()
                }
                Err(_) => 0.0,
            })
            .sum();
        self.cash + marked
    }
}
