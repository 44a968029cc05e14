//! Fill price computation: picks the bar, price and NAV an order fills against.
//!
//! - Prior close: the bar the strategy saw when it submitted the order. Buys
//!   pay the ask and sells receive the bid when the bar is quoted, otherwise
//!   the close. NAV is the prior bar's NAV.
//! - Next open: the open of the bar that arrived this tick. NAV is the
//!   current bar's pre-fill valuation.
//! - Expiry: the settlement carried on the order, against the option's latest
//!   bar. NAV is the current bar's pre-fill valuation.

use chrono::NaiveDateTime;

use crate::domain::{Bar, Instrument, Order, Timing};

/// The bar, price and NAV a fill is booked at.
#[derive(Debug, Clone, PartialEq)]
pub struct Quote {
    pub bar: Bar,
    pub price: f64,
    pub nav: f64,
}

/// Price `order` against `instrument` at `now`, or `None` when there is no
/// bar to fill against (the order is then dropped).
pub fn quote_order(
    order: &Order,
    instrument: &Instrument,
    now: NaiveDateTime,
    prior_nav: f64,
    current_nav: f64,
) -> Option<Quote> {
    let bars = instrument.bars();
    match order.timing {
        Timing::PriorClose => {
            let offset = usize::from(instrument.updated_at(now));
            let bar = bars.read(offset)?;
            let price = bar.quote_for(order.quantity).unwrap_or(bar.close);
            Some(Quote {
                bar: bar.clone(),
                price,
                nav: prior_nav,
            })
        }
        Timing::NextOpen => {
            if !instrument.updated_at(now) {
                return None;
            }
            let bar = bars.latest()?;
            Some(Quote {
                bar: bar.clone(),
                price: bar.open,
                nav: current_nav,
            })
        }
        Timing::Expiry { settlement } => {
            let bar = bars.latest()?;
            Some(Quote {
                bar: bar.clone(),
                price: settlement,
                nav: current_nav,
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn ts(day: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 1, day)
            .unwrap()
            .and_hms_opt(16, 0, 0)
            .unwrap()
    }

    fn instrument_with(bars: Vec<Bar>) -> Instrument {
        let mut inst = Instrument::new("SPY", None, None);
        for bar in bars {
            inst.push(bar);
        }
        inst
    }

    #[test]
    fn prior_close_uses_previous_bar_when_updated() {
        let inst = instrument_with(vec![
            Bar::new(ts(2), 49.0, 51.0, 48.0, 50.0),
            Bar::new(ts(3), 52.0, 54.0, 51.0, 53.0),
        ]);
        let q = quote_order(&Order::at_prior_close("SPY", 10), &inst, ts(3), 1.0, 2.0).unwrap();
        assert_eq!(q.price, 50.0);
        assert_eq!(q.bar.timestamp, ts(2));
        assert_eq!(q.nav, 1.0);
    }

    #[test]
    fn prior_close_uses_latest_bar_when_not_updated() {
        let inst = instrument_with(vec![Bar::new(ts(2), 49.0, 51.0, 48.0, 50.0)]);
        let q = quote_order(&Order::at_prior_close("SPY", 10), &inst, ts(3), 1.0, 2.0).unwrap();
        assert_eq!(q.price, 50.0);
    }

    #[test]
    fn prior_close_crosses_the_spread() {
        let inst = instrument_with(vec![
            Bar::new(ts(2), 49.0, 51.0, 48.0, 50.0).with_quote(49.9, 50.1),
            Bar::new(ts(3), 52.0, 54.0, 51.0, 53.0),
        ]);
        let buy = quote_order(&Order::at_prior_close("SPY", 1), &inst, ts(3), 0.0, 0.0).unwrap();
        let sell = quote_order(&Order::at_prior_close("SPY", -1), &inst, ts(3), 0.0, 0.0).unwrap();
        assert_eq!(buy.price, 50.1);
        assert_eq!(sell.price, 49.9);
    }

    #[test]
    fn prior_close_without_history_is_dropped() {
        let inst = instrument_with(vec![Bar::new(ts(3), 52.0, 54.0, 51.0, 53.0)]);
        assert!(quote_order(&Order::at_prior_close("SPY", 1), &inst, ts(3), 0.0, 0.0).is_none());
    }

    #[test]
    fn next_open_uses_current_open() {
        let inst = instrument_with(vec![
            Bar::new(ts(2), 49.0, 51.0, 48.0, 50.0),
            Bar::new(ts(3), 52.0, 54.0, 51.0, 53.0),
        ]);
        let q = quote_order(&Order::at_next_open("SPY", 10), &inst, ts(3), 1.0, 2.0).unwrap();
        assert_eq!(q.price, 52.0);
        assert_eq!(q.nav, 2.0);
    }

    #[test]
    fn next_open_without_new_bar_is_dropped() {
        let inst = instrument_with(vec![Bar::new(ts(2), 49.0, 51.0, 48.0, 50.0)]);
        assert!(quote_order(&Order::at_next_open("SPY", 10), &inst, ts(3), 1.0, 2.0).is_none());
    }
}
