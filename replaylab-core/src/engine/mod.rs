//! Simulation engine: clock, execution and the bar-by-bar driver.
//!
//! A `Simulation` owns one run: the clock merging its data streams, the
//! `RunContext` holding market, portfolio, pending orders, NAV, fill log and
//! indicator cache, and the `ExecutionEngine` that turns orders into fills.
//! Each call to `advance` processes exactly one merged timestamp:
//!
//! 1. Clock: drain all records at the next timestamp into instruments
//! 2. Execution: fill pending orders, then settle expired options
//! 3. Accounting: mark NAV to the latest closes
//! 4. Strategy: if past warmup, `Algorithm::on_bar` (via `Simulation::run`)

pub mod algorithm;
pub mod clock;
pub mod context;
pub mod error;
pub mod execution;
pub mod simulation;

pub use algorithm::Algorithm;
pub use clock::{Clock, Tick};
pub use context::{BarContext, RunContext};
pub use error::SimError;
pub use execution::{CostModel, ExecutionEngine, ExecutionReport};
pub use simulation::{NavPoint, RunOutcome, RunSummary, Simulation, Step};
