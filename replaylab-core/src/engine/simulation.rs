//! Simulation driver: owns one run and steps it bar by bar.
//!
//! Per bar:
//! 1. The clock drains every record at the next timestamp into the market.
//! 2. Pending orders execute, then expired options settle.
//! 3. NAV is marked and appended.
//! 4. If the timestamp is inside the exposure window the strategy runs.
//!
//! Warmup bars (before `start`) go through steps 1-3 only.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::config::{ConfigError, SimConfig};
use crate::data::{DataStream, DateWindow};
use crate::domain::LogEntry;
use crate::engine::clock::Clock;
use crate::engine::context::{BarContext, RunContext};
use crate::engine::execution::ExecutionEngine;
use crate::engine::{Algorithm, SimError};

/// One processed bar.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Step {
    pub timestamp: NaiveDateTime,
    pub index: u64,
    /// Inside [start, end]; the strategy sees this bar.
    pub exposed: bool,
    pub is_last: bool,
    pub nav: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct NavPoint {
    pub timestamp: NaiveDateTime,
    pub nav: f64,
}

/// Counters collected over a run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunSummary {
    pub bars_processed: u64,
    pub bars_exposed: u64,
    pub bars_warmup: u64,
    pub records: u64,
    pub duplicate_bars: u64,
    pub fills: u64,
    pub dropped_orders: u64,
    pub expiries: u64,
    /// Orders still queued when the data ran out.
    pub unexecuted_orders: u64,
    pub memo_nodes: u64,
    pub memo_recomputes: u64,
}

/// Everything a finished run hands back.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunOutcome {
    /// NAV at every exposed bar.
    pub nav_curve: Vec<NavPoint>,
    pub fills: Vec<LogEntry>,
    pub positions: BTreeMap<String, i64>,
    pub cash: f64,
    pub initial_cash: f64,
    pub summary: RunSummary,
}

impl RunOutcome {
    pub fn final_nav(&self) -> f64 {
        self.nav_curve
            .last()
            .map(|p| p.nav)
            .unwrap_or(self.initial_cash)
    }

    pub fn total_return(&self) -> f64 {
        if self.initial_cash <= 0.0 {
            return 0.0;
        }
        self.final_nav() / self.initial_cash - 1.0
    }
}

/// A single run: clock, run context and execution engine.
pub struct Simulation {
    clock: Clock,
    ctx: RunContext,
    engine: ExecutionEngine,
    exposure: DateWindow,
    summary: RunSummary,
    done: bool,
}

impl Simulation {
    /// Validate the date window and open every stream over the load window.
    ///
    /// Sources listed in `config` are not consulted; the caller builds
    /// `streams` from them (or supplies its own).
    pub fn new(config: &SimConfig, streams: &[Box<dyn DataStream>]) -> Result<Self, SimError> {
        config.validate_window()?;
        if streams.is_empty() {
            return Err(ConfigError::NoSources.into());
        }
        let clock = Clock::open(streams, config.load_window())?;
        Ok(Self {
            clock,
            ctx: RunContext::new(config.initial_cash),
            engine: ExecutionEngine::new(config.costs),
            exposure: config.exposure_window(),
            summary: RunSummary::default(),
            done: false,
        })
    }

    pub fn context(&self) -> &RunContext {
        &self.ctx
    }

    pub fn summary(&self) -> &RunSummary {
        &self.summary
    }

    /// Process one bar. Returns `Ok(None)` once every stream is exhausted.
    pub fn advance(&mut self) -> Result<Option<Step>, SimError> {
        if self.done {
            return Ok(None);
        }
        let Some(tick) = self.clock.advance(&mut self.ctx.market)? else {
            self.done = true;
            return Ok(None);
        };
        let now = tick.timestamp;

        let executed = self.engine.execute_pending(&mut self.ctx, now)?;
        let expired = self.engine.expire_options(&mut self.ctx, now)?;
        let nav = self.ctx.mark_to_market();
        self.ctx.memo.begin_bar(tick.index);

        let exposed = self.exposure.contains(now);
        let s = &mut self.summary;
        s.bars_processed += 1;
        if exposed {
            s.bars_exposed += 1;
        } else {
            s.bars_warmup += 1;
        }
        s.records += tick.records as u64;
        s.duplicate_bars += tick.duplicates as u64;
        s.fills += (executed.filled + expired) as u64;
        s.dropped_orders += executed.dropped as u64;
        s.expiries += expired as u64;

        if tick.is_last {
            self.done = true;
        }
        Ok(Some(Step {
            timestamp: now,
            index: tick.index,
            exposed,
            is_last: tick.is_last,
            nav,
        }))
    }

    /// Strategy view of the bar just produced by `advance`.
    pub fn bar_context(&mut self, step: &Step) -> BarContext<'_> {
        self.ctx.bar_context(step.timestamp, step.is_last)
    }

    /// Drive the run to completion, calling `algorithm` on every exposed bar.
    pub fn run(mut self, algorithm: &mut dyn Algorithm) -> Result<RunOutcome, SimError> {
        tracing::info!(
            streams = self.clock.stream_count(),
            start = %self.exposure.start,
            end = %self.exposure.end,
            "simulation started"
        );
        while let Some(step) = self.advance()? {
            if step.exposed {
                let mut ctx = self.bar_context(&step);
                algorithm.on_bar(&mut ctx)?;
            }
        }
        let outcome = self.finish();
        algorithm.on_finish(&outcome);
        tracing::info!(
            bars = outcome.summary.bars_processed,
            fills = outcome.summary.fills,
            final_nav = outcome.final_nav(),
            "simulation finished"
        );
        Ok(outcome)
    }

    /// Consume the run and collect its results. Pending orders are discarded.
    pub fn finish(self) -> RunOutcome {
        let Self {
            clock,
            ctx,
            exposure,
            mut summary,
            ..
        } = self;

        if !ctx.pending.is_empty() {
            tracing::warn!(orders = ctx.pending.len(), "orders left unexecuted at end of data");
        }
        summary.unexecuted_orders = ctx.pending.len() as u64;
        summary.memo_nodes = ctx.memo.len() as u64;
        summary.memo_recomputes = ctx.memo.recomputes();

        let nav_curve = clock
            .timestamps()
            .chronological()
            .iter()
            .zip(ctx.nav.chronological())
            .filter(|(ts, _)| exposure.contains(**ts))
            .map(|(&timestamp, &nav)| NavPoint { timestamp, nav })
            .collect();

        RunOutcome {
            nav_curve,
            fills: ctx.fills,
            positions: ctx.portfolio.positions().clone(),
            cash: ctx.portfolio.cash(),
            initial_cash: ctx.portfolio.initial_cash(),
            summary,
        }
    }
}
