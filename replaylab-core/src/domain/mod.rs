//! Domain types for ReplayLab

pub mod bar;
pub mod fill;
pub mod instrument;
pub mod market;
pub mod order;
pub mod portfolio;

pub use bar::Bar;
pub use fill::LogEntry;
pub use instrument::{Instrument, OptionRight, OptionTerms, OPTION_MULTIPLIER};
pub use market::{LookupError, Market};
pub use order::{Order, PriceSpec, Timing};
pub use portfolio::Portfolio;
