//! ReplayLab Core: deterministic bar-by-bar market simulation.
//!
//! This crate contains the simulation core:
//! - Recency-indexed series (`Lookback`) with stable series identities
//! - Instruments, orders, fills, portfolio and the market registry
//! - Memoizing indicator cache and the indicator functions built on it
//! - Data stream contract and the k-way merging clock
//! - Execution engine (fill pricing, option expiry, commission)
//! - The `Algorithm` contract and the `Simulation` driver

pub mod config;
pub mod data;
pub mod domain;
pub mod engine;
pub mod indicators;
pub mod memo;
pub mod series;

pub use config::{ConfigError, SimConfig, SourceConfig};
pub use engine::{Algorithm, BarContext, RunOutcome, SimError, Simulation};
