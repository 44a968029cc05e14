//! Criterion benchmarks for ReplayLab hot paths.
//!
//! Benchmarks:
//! 1. Bar loop (full simulation over N bars, idle strategy)
//! 2. Bar loop with indicator calls (cache lookups + recompute per bar)
//! 3. Clock merge across many streams

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};

use replaylab_core::config::SimConfig;
use replaylab_core::data::{BarRecord, DataStream, MemoryStream};
use replaylab_core::domain::{Bar, Market};
use replaylab_core::engine::{Algorithm, BarContext, Clock, SimError, Simulation};
use replaylab_core::indicators::{fast_variance, true_range, volatility, volatility_from_range};

// ── Helpers ──────────────────────────────────────────────────────────

fn make_records(symbol: &str, n: usize) -> Vec<BarRecord> {
    let base = chrono::NaiveDate::from_ymd_opt(2000, 1, 3)
        .unwrap()
        .and_hms_opt(16, 0, 0)
        .unwrap();
    (0..n)
        .map(|i| {
            let close = 100.0 + (i as f64 * 0.1).sin() * 10.0;
            let bar = Bar::new(
                base + chrono::Duration::days(i as i64),
                close - 0.3,
                close + 1.5,
                close - 1.5,
                close,
            );
            BarRecord::new(symbol, bar)
        })
        .collect()
}

fn config(n: usize) -> SimConfig {
    let start = chrono::NaiveDate::from_ymd_opt(2000, 1, 3).unwrap();
    SimConfig::new(start, start + chrono::Duration::days(n as i64), 1_000_000.0)
}

struct Idle;

impl Algorithm for Idle {
    fn on_bar(&mut self, _ctx: &mut BarContext<'_>) -> Result<(), SimError> {
        Ok(())
    }
}

struct Indicators;

impl Algorithm for Indicators {
    fn on_bar(&mut self, ctx: &mut BarContext<'_>) -> Result<(), SimError> {
        let spy = ctx.instrument("SPY")?;
        black_box(volatility(ctx.memo, &spy.close(), 20).read(0));
        black_box(volatility_from_range(ctx.memo, &spy.close(), 20).read(0));
        black_box(fast_variance(ctx.memo, &spy.close(), 20).read(0));
        black_box(true_range(ctx.memo, spy).read(0));
        Ok(())
    }
}

// ── 1 & 2. Bar loop ──────────────────────────────────────────────────

fn bench_bar_loop(c: &mut Criterion) {
    let mut group = c.benchmark_group("bar_loop");
    for n in [252usize, 2520] {
        let streams: Vec<Box<dyn DataStream>> =
            vec![Box::new(MemoryStream::new("spy", make_records("SPY", n)))];
        let config = config(n);

        group.bench_with_input(BenchmarkId::new("idle", n), &n, |b, _| {
            b.iter(|| {
                let sim = Simulation::new(&config, &streams).unwrap();
                black_box(sim.run(&mut Idle).unwrap())
            })
        });
        group.bench_with_input(BenchmarkId::new("indicators", n), &n, |b, _| {
            b.iter(|| {
                let sim = Simulation::new(&config, &streams).unwrap();
                black_box(sim.run(&mut Indicators).unwrap())
            })
        });
    }
    group.finish();
}

// ── 3. Clock merge ───────────────────────────────────────────────────

fn bench_clock_merge(c: &mut Criterion) {
    let streams: Vec<Box<dyn DataStream>> = (0..16)
        .map(|i| {
            Box::new(MemoryStream::new(
                format!("s{i}"),
                make_records(&format!("SYM{i}"), 1000),
            )) as Box<dyn DataStream>
        })
        .collect();
    let window = config(1000).load_window();

    c.bench_function("clock_merge_16x1000", |b| {
        b.iter(|| {
            let mut clock = Clock::open(&streams, window).unwrap();
            let mut market = Market::default();
            while let Some(tick) = clock.advance(&mut market).unwrap() {
                black_box(tick);
            }
        })
    });
}

criterion_group!(benches, bench_bar_loop, bench_clock_merge);
criterion_main!(benches);
