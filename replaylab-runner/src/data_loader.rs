//! Data streams built from configuration.
//!
//! Two stream kinds back `SourceConfig`:
//! - `CsvStream`: one CSV file of bar records, re-read on every open
//! - `SyntheticStream`: a seeded random walk for one symbol, weekdays only
//!
//! Both are restartable: opening twice yields the same records, so parameter
//! sweeps can share one stream list across runs.

use chrono::{Datelike, NaiveDate, NaiveDateTime, NaiveTime, Weekday};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::Deserialize;
use std::path::{Path, PathBuf};

use replaylab_core::config::SourceConfig;
use replaylab_core::data::{BarRecord, DataError, DataStream, DateWindow, RecordIter};
use replaylab_core::domain::{Bar, OptionRight, OptionTerms};

/// Time of day stamped on date-only CSV rows and synthetic bars.
pub fn session_close() -> NaiveTime {
    NaiveTime::from_hms_opt(16, 0, 0).unwrap_or(NaiveTime::MIN)
}

/// Build one stream per configured source, in configuration order.
pub fn build_streams(sources: &[SourceConfig]) -> Vec<Box<dyn DataStream>> {
    sources
        .iter()
        .map(|source| -> Box<dyn DataStream> {
            match source {
                SourceConfig::Csv { path, name } => {
                    let stream = CsvStream::new(path);
                    match name {
                        Some(n) => Box::new(stream.with_name(n.clone())),
                        None => Box::new(stream),
                    }
                }
                SourceConfig::Synthetic {
                    symbol,
                    seed,
                    start_price,
                    daily_volatility,
                } => Box::new(
                    SyntheticStream::new(symbol.clone(), *seed)
                        .with_start_price(*start_price)
                        .with_daily_volatility(*daily_volatility),
                ),
            }
        })
        .collect()
}

// ─── CSV ────────────────────────────────────────────────────────────

/// One CSV row. Quote and option columns are optional.
#[derive(Debug, Deserialize)]
struct CsvRow {
    timestamp: String,
    symbol: String,
    open: f64,
    high: f64,
    low: f64,
    close: f64,
    #[serde(default)]
    volume: Option<u64>,
    #[serde(default)]
    bid: Option<f64>,
    #[serde(default)]
    ask: Option<f64>,
    #[serde(default)]
    nickname: Option<String>,
    #[serde(default)]
    right: Option<OptionRight>,
    #[serde(default)]
    strike: Option<f64>,
    #[serde(default)]
    expiry: Option<NaiveDate>,
    #[serde(default)]
    underlying: Option<String>,
}

impl CsvRow {
    fn into_record(self) -> Result<BarRecord, String> {
        let timestamp = parse_timestamp(&self.timestamp)?;
        let mut bar = Bar::new(timestamp, self.open, self.high, self.low, self.close);
        if let Some(volume) = self.volume {
            bar = bar.with_volume(volume);
        }
        bar.bid = self.bid;
        bar.ask = self.ask;
        if bar.is_void() {
            return Err(format!("NaN price for '{}'", self.symbol));
        }
        if !bar.is_sane() {
            return Err(format!(
                "inconsistent OHLC for '{}': open {} high {} low {} close {}",
                self.symbol, bar.open, bar.high, bar.low, bar.close
            ));
        }

        let option = match (self.right, self.strike, self.expiry, self.underlying) {
            (None, None, None, None) => None,
            (Some(right), Some(strike), Some(expiry), Some(underlying)) => Some(OptionTerms {
                right,
                strike,
                expiry,
                underlying,
            }),
            _ => {
                return Err(format!(
                    "option row for '{}' needs right, strike, expiry and underlying",
                    self.symbol
                ))
            }
        };

        let mut record = BarRecord::new(self.symbol, bar);
        record.nickname = self.nickname.filter(|n| !n.is_empty());
        record.option = option;
        Ok(record)
    }
}

/// Accepts `YYYY-MM-DD`, `YYYY-MM-DD HH:MM:SS` and `YYYY-MM-DDTHH:MM:SS`.
fn parse_timestamp(raw: &str) -> Result<NaiveDateTime, String> {
    let raw = raw.trim();
    for fmt in ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S"] {
        if let Ok(ts) = NaiveDateTime::parse_from_str(raw, fmt) {
            return Ok(ts);
        }
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .map(|d| d.and_time(session_close()))
        .map_err(|e| format!("bad timestamp '{raw}': {e}"))
}

/// Bar records read from a CSV file with a header row.
///
/// Columns: `timestamp,symbol,open,high,low,close` plus optional `volume`,
/// `bid`, `ask`, `nickname`, `right`, `strike`, `expiry`, `underlying`.
/// Rows must be in non-decreasing timestamp order.
#[derive(Debug, Clone)]
pub struct CsvStream {
    path: PathBuf,
    name: String,
}

impl CsvStream {
    pub fn new(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref().to_path_buf();
        let name = path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        Self { path, name }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl DataStream for CsvStream {
    fn name(&self) -> &str {
        &self.name
    }

    fn open(&self, window: DateWindow) -> Result<RecordIter, DataError> {
        let reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .from_path(&self.path)
            .map_err(|e| DataError::Unavailable {
                stream: self.name.clone(),
                reason: e.to_string(),
            })?;
        tracing::debug!(stream = %self.name, path = %self.path.display(), "opened csv stream");

        let name = self.name.clone();
        let rows = reader
            .into_deserialize::<CsvRow>()
            .enumerate()
            .map(move |(i, row)| {
                let malformed = |reason: String| DataError::Malformed {
                    stream: name.clone(),
                    reason: format!("row {}: {reason}", i + 1),
                };
                row.map_err(|e| malformed(e.to_string()))
                    .and_then(|r| r.into_record().map_err(malformed))
            })
            .filter(move |r| match r {
                Ok(record) => window.contains(record.timestamp()),
                Err(_) => true,
            });
        Ok(Box::new(rows))
    }
}

// ─── Synthetic ──────────────────────────────────────────────────────

/// Deterministic random walk for one symbol.
///
/// Daily returns are uniform with standard deviation `daily_volatility`.
/// The walk starts at `start_price` on the first weekday of the opened
/// window, so the same seed and window always give the same bars.
#[derive(Debug, Clone)]
pub struct SyntheticStream {
    name: String,
    symbol: String,
    seed: u64,
    start_price: f64,
    daily_volatility: f64,
}

impl SyntheticStream {
    pub fn new(symbol: impl Into<String>, seed: u64) -> Self {
        let symbol = symbol.into();
        Self {
            name: format!("synthetic/{symbol}"),
            symbol,
            seed,
            start_price: 100.0,
            daily_volatility: 0.01,
        }
    }

    pub fn with_start_price(mut self, price: f64) -> Self {
        self.start_price = price;
        self
    }

    pub fn with_daily_volatility(mut self, volatility: f64) -> Self {
        self.daily_volatility = volatility;
        self
    }

    fn generate(&self, window: DateWindow) -> Vec<BarRecord> {
        let mut rng = StdRng::seed_from_u64(self.seed);
        // Uniform on [-a, a] has standard deviation a / sqrt(3).
        let half_width = self.daily_volatility * 3f64.sqrt();
        let mut price = self.start_price;
        let mut records = Vec::new();

        let mut day = window.start;
        while day <= window.end {
            if !matches!(day.weekday(), Weekday::Sat | Weekday::Sun) {
                let open = price;
                let close = price * (1.0 + rng.gen_range(-half_width..=half_width));
                let high = open.max(close) * (1.0 + rng.gen_range(0.0..=self.daily_volatility));
                let low = open.min(close) * (1.0 - rng.gen_range(0.0..=self.daily_volatility));
                let volume = rng.gen_range(500_000..5_000_000u64);
                let bar = Bar::new(day.and_time(session_close()), open, high, low, close)
                    .with_volume(volume);
                records.push(BarRecord::new(self.symbol.clone(), bar));
                price = close;
            }
            match day.succ_opt() {
                Some(next) => day = next,
                None => break,
            }
        }
        records
    }
}

impl DataStream for SyntheticStream {
    fn name(&self) -> &str {
        &self.name
    }

    fn open(&self, window: DateWindow) -> Result<RecordIter, DataError> {
        Ok(Box::new(self.generate(window).into_iter().map(Ok)))
    }
}
