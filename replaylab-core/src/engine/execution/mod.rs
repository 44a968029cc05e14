//! Execution engine: turns queued orders into fills once per bar.
//!
//! The engine carries only its cost model. All mutable state (market,
//! portfolio, pending orders, fill log) lives in the `RunContext` it borrows.
//!
//! Two passes run per bar, in order:
//! - `execute_pending`: every order queued on the previous exposed bar is
//!   priced, filled or dropped. The queue is empty afterwards.
//! - `expire_options`: every open option position past its expiry date is
//!   closed at intrinsic value against its underlying's latest close.

pub mod cost_model;
pub mod fill_price;

pub use cost_model::CostModel;
pub use fill_price::{quote_order, Quote};

use chrono::NaiveDateTime;

use crate::domain::{LogEntry, Order};
use crate::engine::context::RunContext;
use crate::engine::SimError;

/// Outcome of one `execute_pending` pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ExecutionReport {
    pub filled: usize,
    /// Orders with no bar to fill against or whose limit was not met.
    pub dropped: usize,
}

#[derive(Debug, Clone, Default)]
pub struct ExecutionEngine {
    costs: CostModel,
}

impl ExecutionEngine {
    pub fn new(costs: CostModel) -> Self {
        Self { costs }
    }

    pub fn frictionless() -> Self {
        Self::new(CostModel::frictionless())
    }

    pub fn costs(&self) -> &CostModel {
        &self.costs
    }

    /// Fill or drop every pending order, in submission order.
    pub fn execute_pending(
        &self,
        ctx: &mut RunContext,
        now: NaiveDateTime,
    ) -> Result<ExecutionReport, SimError> {
        let orders = std::mem::take(&mut ctx.pending);
        let mut report = ExecutionReport::default();
        if orders.is_empty() {
            return Ok(report);
        }

        let prior_nav = ctx.prior_nav();
        let current_nav = ctx.portfolio.valuation(&ctx.market);

        for order in orders {
            let instrument = ctx.market.get(&order.symbol)?;
            let multiplier = instrument.multiplier();
            let quote = match quote_order(&order, instrument, now, prior_nav, current_nav) {
                Some(q) if order.accepts(q.price) => q,
                Some(q) => {
                    tracing::warn!(
                        symbol = %order.symbol,
                        price = q.price,
                        limit = ?order.price,
                        "limit not met, order dropped"
                    );
                    report.dropped += 1;
                    continue;
                }
                None => {
                    tracing::warn!(
                        symbol = %order.symbol,
                        timing = ?order.timing,
                        %now,
                        "no bar to fill against, order dropped"
                    );
                    report.dropped += 1;
                    continue;
                }
            };
            self.book(ctx, now, order, quote, multiplier);
            report.filled += 1;
        }

        Ok(report)
    }

    /// Close option positions whose expiry date is before `now`'s date.
    ///
    /// Returns the number of positions settled.
    pub fn expire_options(&self, ctx: &mut RunContext, now: NaiveDateTime) -> Result<usize, SimError> {
        let today = now.date();
        let mut expiring = Vec::new();
        for (symbol, &quantity) in ctx.portfolio.positions() {
            let instrument = ctx.market.get(symbol)?;
            let Some(terms) = instrument.option() else {
                continue;
            };
            if !terms.is_expired(today) {
                continue;
            }
            let underlying_close = ctx
                .market
                .get(&terms.underlying)
                .ok()
                .and_then(|u| u.last_close())
                .ok_or_else(|| SimError::MissingUnderlying {
                    option: symbol.clone(),
                    underlying: terms.underlying.clone(),
                })?;
            let settlement = terms.intrinsic(underlying_close);
            expiring.push(Order::expiry(symbol.clone(), -quantity, settlement));
        }
        if expiring.is_empty() {
            return Ok(0);
        }

        let prior_nav = ctx.prior_nav();
        let current_nav = ctx.portfolio.valuation(&ctx.market);
        let mut settled = 0;
        for order in expiring {
            let instrument = ctx.market.get(&order.symbol)?;
            let multiplier = instrument.multiplier();
            let Some(quote) = quote_order(&order, instrument, now, prior_nav, current_nav) else {
                continue;
            };
            tracing::debug!(
                symbol = %order.symbol,
                quantity = order.quantity,
                settlement = quote.price,
                "option expired"
            );
            self.book(ctx, now, order, quote, multiplier);
            settled += 1;
        }
        Ok(settled)
    }

    fn book(&self, ctx: &mut RunContext, now: NaiveDateTime, order: Order, quote: Quote, multiplier: f64) {
        let commission = self.costs.commission(order.quantity, quote.price, multiplier);
        ctx.portfolio
            .apply_fill(&order.symbol, order.quantity, quote.price, multiplier, commission);
        tracing::debug!(
            symbol = %order.symbol,
            quantity = order.quantity,
            price = quote.price,
            commission,
            cash = ctx.portfolio.cash(),
            "fill"
        );
        ctx.fills.push(LogEntry {
            timestamp: now,
            symbol: order.symbol.clone(),
            order,
            bar: quote.bar,
            nav: quote.nav,
            price: quote.price,
            commission,
        });
    }
}
