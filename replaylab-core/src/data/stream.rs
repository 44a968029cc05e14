//! Data stream trait and structured error types.
//!
//! A `DataStream` abstracts over where bars come from (CSV files, synthetic
//! generators, in-memory fixtures) so the clock can merge any mix of them and
//! tests can swap in fixtures.

use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::{Bar, OptionTerms};

/// One record emitted by a stream: a bar for a symbol, plus the metadata used
/// to create the instrument the first time the symbol is seen.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BarRecord {
    pub symbol: String,
    #[serde(default)]
    pub nickname: Option<String>,
    #[serde(default)]
    pub option: Option<OptionTerms>,
    pub bar: Bar,
}

impl BarRecord {
    pub fn new(symbol: impl Into<String>, bar: Bar) -> Self {
        Self {
            symbol: symbol.into(),
            nickname: None,
            option: None,
            bar,
        }
    }

    pub fn with_nickname(mut self, nickname: impl Into<String>) -> Self {
        self.nickname = Some(nickname.into());
        self
    }

    pub fn with_option(mut self, terms: OptionTerms) -> Self {
        self.option = Some(terms);
        self
    }

    pub fn timestamp(&self) -> NaiveDateTime {
        self.bar.timestamp
    }
}

/// Inclusive date range a stream is opened over.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateWindow {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateWindow {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Self {
        Self { start, end }
    }

    pub fn contains(&self, timestamp: NaiveDateTime) -> bool {
        let date = timestamp.date();
        date >= self.start && date <= self.end
    }
}

#[derive(Debug, Error)]
pub enum DataError {
    #[error("stream '{stream}' went backwards: {found} after {previous}")]
    OutOfOrder {
        stream: String,
        previous: NaiveDateTime,
        found: NaiveDateTime,
    },

    #[error("stream '{stream}' could not be opened: {reason}")]
    Unavailable { stream: String, reason: String },

    #[error("malformed record in '{stream}': {reason}")]
    Malformed { stream: String, reason: String },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Ordered records produced by an opened stream.
pub type RecordIter = Box<dyn Iterator<Item = Result<BarRecord, DataError>> + Send>;

/// A restartable source of ordered bar records.
///
/// `open` must yield records with non-decreasing timestamps and may emit many
/// records at one timestamp (an option chain). Opening again starts over with
/// no residual state, which is what parameter sweeps rely on.
pub trait DataStream: Send + Sync {
    /// Human-readable name used in errors and logs.
    fn name(&self) -> &str;

    fn open(&self, window: DateWindow) -> Result<RecordIter, DataError>;
}
