//! Property tests for core invariants.
//!
//! Uses proptest to verify:
//! 1. Lookback offsets: offset 0 is the latest write, and a write shifts
//!    every older value back by exactly one
//! 2. Clock merge: timestamps are non-decreasing and every in-window record
//!    is consumed exactly once, whatever the interleaving across streams
//! 3. Cash accounting: a frictionless round trip at one price leaves cash
//!    unchanged and the book flat

use chrono::{NaiveDate, NaiveDateTime};
use proptest::prelude::*;

use replaylab_core::data::{BarRecord, DataStream, DateWindow, MemoryStream};
use replaylab_core::domain::{Bar, Market};
use replaylab_core::engine::Clock;
use replaylab_core::series::Lookback;

// ── Strategies (proptest) ────────────────────────────────────────────

fn arb_values() -> impl Strategy<Value = Vec<f64>> {
    prop::collection::vec(-1.0e6..1.0e6_f64, 1..64)
}

/// Per-stream sorted day offsets (duplicates allowed: several records per day).
fn arb_stream_days() -> impl Strategy<Value = Vec<Vec<u32>>> {
    prop::collection::vec(
        prop::collection::vec(0u32..40, 0..20).prop_map(|mut days| {
            days.sort_unstable();
            days
        }),
        1..5,
    )
}

fn ts(day: u32) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2024, 1, 1).unwrap().and_hms_opt(16, 0, 0).unwrap()
        + chrono::Duration::days(day as i64)
}

// ── 1. Lookback offsets ──────────────────────────────────────────────

proptest! {
    #[test]
    fn read_zero_is_latest(values in arb_values()) {
        let mut s = Lookback::new("prop");
        for &v in &values {
            s.write(v);
            prop_assert_eq!(s.read(0), Some(&v));
        }
        prop_assert_eq!(s.len(), values.len());
        prop_assert!(s.read(values.len()).is_none());
        prop_assert!(s.get(values.len()).is_err());
    }

    #[test]
    fn write_shifts_offsets_by_one(values in arb_values(), next in -1.0e6..1.0e6_f64) {
        let mut s = Lookback::new("prop");
        for &v in &values {
            s.write(v);
        }
        let before: Vec<f64> = s.iter().copied().collect();
        s.write(next);
        for (k, old) in before.iter().enumerate() {
            prop_assert_eq!(s.read(k + 1), Some(old));
        }
    }
}

// ── 2. Clock merge ───────────────────────────────────────────────────

proptest! {
    #[test]
    fn merge_is_ordered_and_complete(stream_days in arb_stream_days()) {
        // Symbol per (stream, record) so nothing is dropped as a duplicate.
        let streams: Vec<Box<dyn DataStream>> = stream_days
            .iter()
            .enumerate()
            .map(|(s, days)| {
                let records = days
                    .iter()
                    .enumerate()
                    .map(|(r, &d)| {
                        let bar = Bar::new(ts(d), 1.0, 1.0, 1.0, 1.0);
                        BarRecord::new(format!("S{s}R{r}"), bar)
                    })
                    .collect();
                Box::new(MemoryStream::new(format!("stream-{s}"), records)) as Box<dyn DataStream>
            })
            .collect();

        let window = DateWindow::new(ts(0).date(), ts(60).date());
        let mut clock = Clock::open(&streams, window).unwrap();
        let mut market = Market::default();

        let mut total = 0;
        let mut previous = None;
        while let Some(tick) = clock.advance(&mut market).unwrap() {
            if let Some(p) = previous {
                prop_assert!(tick.timestamp > p);
            }
            previous = Some(tick.timestamp);
            total += tick.records;
        }

        let expected: usize = stream_days.iter().map(Vec::len).sum();
        prop_assert_eq!(total, expected);
        prop_assert_eq!(market.len(), expected);

        let mut distinct: Vec<u32> = stream_days.iter().flatten().copied().collect();
        distinct.sort_unstable();
        distinct.dedup();
        prop_assert_eq!(clock.ticks() as usize, distinct.len());
    }
}

// ── 3. Cash accounting ───────────────────────────────────────────────

mod accounting {
    use super::*;
    use replaylab_core::config::SimConfig;
    use replaylab_core::domain::Order;
    use replaylab_core::engine::{Algorithm, BarContext, SimError, Simulation};

    struct RoundTrip {
        qty: i64,
        bar: usize,
    }

    impl Algorithm for RoundTrip {
        fn on_bar(&mut self, ctx: &mut BarContext<'_>) -> Result<(), SimError> {
            match self.bar {
                0 => ctx.submit(Order::at_next_open("X", self.qty))?,
                1 => ctx.submit(Order::at_next_open("X", -self.qty))?,
                _ => {}
            }
            self.bar += 1;
            Ok(())
        }
    }

    proptest! {
        #[test]
        fn flat_round_trip_preserves_cash(
            qty in prop_oneof![-500i64..-1, 1i64..500],
            price in 1.0..500.0_f64,
        ) {
            let price = (price * 100.0).round() / 100.0;
            let records = (0..4)
                .map(|d| BarRecord::new("X", Bar::new(ts(d), price, price, price, price)))
                .collect();
            let streams: Vec<Box<dyn DataStream>> =
                vec![Box::new(MemoryStream::new("x", records))];
            let config = SimConfig::new(ts(0).date(), ts(3).date(), 100_000.0);
            let outcome = Simulation::new(&config, &streams)
                .unwrap()
                .run(&mut RoundTrip { qty, bar: 0 })
                .unwrap();

            prop_assert!(outcome.positions.is_empty());
            prop_assert!((outcome.cash - 100_000.0).abs() < 1e-6);
            prop_assert!((outcome.final_nav() - 100_000.0).abs() < 1e-6);
        }
    }
}
