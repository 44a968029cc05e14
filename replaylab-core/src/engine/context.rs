//! Per-run state and the per-bar view handed to the strategy.

use chrono::NaiveDateTime;
use std::collections::BTreeMap;

use crate::domain::{Instrument, LogEntry, LookupError, Market, Order, Portfolio};
use crate::engine::SimError;
use crate::memo::MemoCache;
use crate::series::{Lookback, SeriesIds};

/// Everything one run owns. Dropped with its `Simulation`.
#[derive(Debug)]
pub struct RunContext {
    pub(crate) market: Market,
    pub(crate) portfolio: Portfolio,
    pub(crate) pending: Vec<Order>,
    pub(crate) nav: Lookback<f64>,
    pub(crate) fills: Vec<LogEntry>,
    pub(crate) memo: MemoCache,
    pub(crate) series_ids: SeriesIds,
}

impl RunContext {
    pub fn new(initial_cash: f64) -> Self {
        Self {
            market: Market::default(),
            portfolio: Portfolio::new(initial_cash),
            pending: Vec::new(),
            nav: Lookback::named("portfolio/nav"),
            fills: Vec::new(),
            memo: MemoCache::new(),
            series_ids: SeriesIds::new(),
        }
    }

    pub fn market(&self) -> &Market {
        &self.market
    }

    pub fn portfolio(&self) -> &Portfolio {
        &self.portfolio
    }

    pub fn nav(&self) -> &Lookback<f64> {
        &self.nav
    }

    pub fn fills(&self) -> &[LogEntry] {
        &self.fills
    }

    pub fn pending(&self) -> &[Order] {
        &self.pending
    }

    pub fn memo(&self) -> &MemoCache {
        &self.memo
    }

    /// NAV recorded on the previous bar, or initial cash before the first bar.
    pub fn prior_nav(&self) -> f64 {
        self.nav
            .latest()
            .copied()
            .unwrap_or_else(|| self.portfolio.initial_cash())
    }

    /// Value the portfolio against the latest closes and append to the NAV series.
    pub fn mark_to_market(&mut self) -> f64 {
        let nav = self.portfolio.valuation(&self.market);
        self.nav.write(nav);
        nav
    }

    pub(crate) fn bar_context(&mut self, now: NaiveDateTime, is_last_bar: bool) -> BarContext<'_> {
        BarContext {
            market: &self.market,
            memo: &mut self.memo,
            portfolio: &self.portfolio,
            pending: &mut self.pending,
            nav: &self.nav,
            fills: &self.fills,
            series_ids: &mut self.series_ids,
            now,
            is_last_bar,
        }
    }
}

/// What a strategy sees on one exposed bar.
///
/// `market` and `memo` are public fields so indicator calls can borrow the
/// cache mutably while holding instruments from the market:
///
/// ```ignore
/// let spy = ctx.instrument("SPY")?;
/// let vol = *volatility(ctx.memo, &spy.close(), 20).read(0).unwrap_or(&0.0);
/// ```
pub struct BarContext<'a> {
    pub market: &'a Market,
    pub memo: &'a mut MemoCache,
    portfolio: &'a Portfolio,
    pending: &'a mut Vec<Order>,
    nav: &'a Lookback<f64>,
    fills: &'a [LogEntry],
    series_ids: &'a mut SeriesIds,
    now: NaiveDateTime,
    is_last_bar: bool,
}

impl<'a> BarContext<'a> {
    pub fn now(&self) -> NaiveDateTime {
        self.now
    }

    /// True on the final bar of the run; orders submitted now will never execute.
    pub fn is_last_bar(&self) -> bool {
        self.is_last_bar
    }

    /// NAV marked at this bar's closes.
    pub fn nav(&self) -> f64 {
        self.nav
            .latest()
            .copied()
            .unwrap_or_else(|| self.portfolio.initial_cash())
    }

    pub fn nav_series(&self) -> &'a Lookback<f64> {
        self.nav
    }

    pub fn cash(&self) -> f64 {
        self.portfolio.cash()
    }

    pub fn position(&self, symbol: &str) -> i64 {
        self.portfolio.position(symbol)
    }

    pub fn positions(&self) -> &'a BTreeMap<String, i64> {
        self.portfolio.positions()
    }

    pub fn fills(&self) -> &'a [LogEntry] {
        self.fills
    }

    pub fn instrument(&self, symbol: &str) -> Result<&'a Instrument, LookupError> {
        self.market.get(symbol)
    }

    pub fn by_nickname(&self, nickname: &str) -> Result<&'a Instrument, LookupError> {
        self.market.by_nickname(nickname)
    }

    /// Queue an order for the next bar.
    pub fn submit(&mut self, order: Order) -> Result<(), SimError> {
        if order.quantity == 0 {
            return Err(SimError::ZeroQuantity {
                symbol: order.symbol,
            });
        }
        if !self.market.contains(&order.symbol) {
            return Err(SimError::UnknownInstrument(order.symbol));
        }
        tracing::trace!(symbol = %order.symbol, quantity = order.quantity, "order queued");
        self.pending.push(order);
        Ok(())
    }

    /// Orders queued so far in this bar and not yet executed.
    pub fn pending(&self) -> &[Order] {
        self.pending
    }

    /// A new derived series owned by the strategy.
    ///
    /// Each call gets its own identity, even when `origin` repeats, and the
    /// ids are the same every time the run is replayed.
    pub fn series<T>(&mut self, origin: &str) -> Lookback<T> {
        Lookback::with_id(self.series_ids.mint(origin))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::BarRecord;
    use crate::domain::Bar;
    use chrono::NaiveDate;

    fn ts(day: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 1, day)
            .unwrap()
            .and_hms_opt(16, 0, 0)
            .unwrap()
    }

    fn context_with_spy() -> RunContext {
        let mut ctx = RunContext::new(10_000.0);
        ctx.market
            .absorb(BarRecord::new("SPY", Bar::new(ts(2), 1.0, 1.0, 1.0, 50.0)));
        ctx
    }

    #[test]
    fn prior_nav_falls_back_to_initial_cash() {
        let mut ctx = context_with_spy();
        assert_eq!(ctx.prior_nav(), 10_000.0);
        ctx.mark_to_market();
        assert_eq!(ctx.prior_nav(), 10_000.0);
        assert_eq!(ctx.nav().len(), 1);
    }

    #[test]
    fn submit_rejects_unknown_symbol() {
        let mut ctx = context_with_spy();
        let mut bar = ctx.bar_context(ts(2), false);
        assert!(matches!(
            bar.submit(Order::at_next_open("QQQ", 1)),
            Err(SimError::UnknownInstrument(s)) if s == "QQQ"
        ));
        assert!(matches!(
            bar.submit(Order::at_next_open("SPY", 0)),
            Err(SimError::ZeroQuantity { .. })
        ));
        bar.submit(Order::at_next_open("SPY", 5)).unwrap();
        assert_eq!(bar.pending().len(), 1);
        assert_eq!(ctx.pending().len(), 1);
    }

    #[test]
    fn instruments_outlive_memo_borrow() {
        let mut ctx = context_with_spy();
        let mut bar = ctx.bar_context(ts(2), false);
        let spy = bar.instrument("SPY").unwrap();
        let tr = crate::indicators::true_range(bar.memo, spy);
        assert_eq!(tr.read(0), Some(&0.0));
    }

    #[test]
    fn strategy_series_are_distinct_and_replayable() {
        let mut first = context_with_spy();
        let mut bar = first.bar_context(ts(2), false);
        let a: Lookback<f64> = bar.series("spread");
        let b: Lookback<f64> = bar.series("spread");
        assert_ne!(a.id(), b.id());
        assert_ne!(a.id(), first.nav().id());

        let mut second = context_with_spy();
        let mut bar = second.bar_context(ts(2), false);
        let replayed: Lookback<f64> = bar.series("spread");
        assert_eq!(replayed.id(), a.id());
    }
}
