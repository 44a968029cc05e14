//! Lookback series: the append-only, recency-indexed history every other
//! component is built on.
//!
//! Offset 0 is the most recent write, offset k the value written k writes ago.
//! Reading past the recorded history is a normal outcome during early bars, so
//! `read` returns `Option` and indicators treat `None` as missing data.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use thiserror::Error;

use crate::domain::Bar;

/// Serial numbers for `Lookback::new`, shared by every run in the process.
static PROCESS_SERIAL: AtomicU64 = AtomicU64::new(0);

/// Identity of a series, assigned when the series is created and hashed from
/// an origin string rather than a memory address.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SeriesId(pub u64);

impl SeriesId {
    /// Derive an id from an origin such as `bars/SPY`.
    ///
    /// Equal origins give equal ids. Only use this for origins that are unique
    /// within a run; `SeriesIds::mint` and `Lookback::new` do not have that
    /// requirement.
    pub fn from_origin(origin: &str) -> Self {
        Self::from_hash(blake3::hash(origin.as_bytes()))
    }

    /// Id of the `serial`-th series drawn from allocator `scope`.
    fn sequenced(scope: &[u8], origin: &str, serial: u64) -> Self {
        let mut hasher = blake3::Hasher::new();
        hasher.update(scope);
        hasher.update(&[0u8]);
        hasher.update(origin.as_bytes());
        hasher.update(&[0u8]);
        hasher.update(&serial.to_le_bytes());
        Self::from_hash(hasher.finalize())
    }

    /// Derive a child id (e.g. the close-price projection of a bar series).
    pub fn child(&self, label: &str) -> Self {
        let mut hasher = blake3::Hasher::new();
        hasher.update(&self.0.to_le_bytes());
        hasher.update(label.as_bytes());
        Self::from_hash(hasher.finalize())
    }

    pub(crate) fn from_hash(hash: blake3::Hash) -> Self {
        let mut buf = [0u8; 8];
        buf.copy_from_slice(&hash.as_bytes()[..8]);
        Self(u64::from_le_bytes(buf))
    }
}

impl fmt::Display for SeriesId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:016x}", self.0)
    }
}

/// Per-run allocator of series ids.
///
/// Every `mint` yields a new id, even for a repeated origin, and two
/// allocators minting the same origins in the same order yield the same ids.
/// `RunContext` owns one, so rerunning a simulation reproduces its ids.
#[derive(Debug, Clone, Default)]
pub struct SeriesIds {
    next: u64,
}

impl SeriesIds {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn mint(&mut self, origin: &str) -> SeriesId {
        let id = SeriesId::sequenced(b"run", origin, self.next);
        self.next += 1;
        id
    }

    /// Number of ids minted so far.
    pub fn minted(&self) -> u64 {
        self.next
    }
}

/// A read past the recorded history.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("offset {offset} is out of history ({len} values recorded)")]
pub struct OutOfHistory {
    pub offset: usize,
    pub len: usize,
}

/// Append-only history indexed by distance from the latest write.
#[derive(Debug, Clone)]
pub struct Lookback<T> {
    id: SeriesId,
    values: Vec<T>,
}

impl<T> Lookback<T> {
    /// A series with a fresh identity. Two series built from the same origin
    /// never share an id, so they never share memo nodes. The id is unique
    /// within the process but not reproducible across runs; use
    /// `BarContext::series` when it must be.
    pub fn new(origin: &str) -> Self {
        let serial = PROCESS_SERIAL.fetch_add(1, Ordering::Relaxed);
        Self::with_id(SeriesId::sequenced(b"process", origin, serial))
    }

    /// A series whose id is derived from `origin` alone. The origin must be
    /// unique within the run (`bars/SPY`, `portfolio/nav`).
    pub fn named(origin: &str) -> Self {
        Self::with_id(SeriesId::from_origin(origin))
    }

    pub fn with_id(id: SeriesId) -> Self {
        Self {
            id,
            values: Vec::new(),
        }
    }

    pub fn id(&self) -> SeriesId {
        self.id
    }

    /// Push a new current value. Everything already recorded shifts back one offset.
    pub fn write(&mut self, value: T) {
        self.values.push(value);
    }

    /// Value written `offset` writes ago, or `None` if the history is too short.
    pub fn read(&self, offset: usize) -> Option<&T> {
        let len = self.values.len();
        if offset >= len {
            return None;
        }
        self.values.get(len - 1 - offset)
    }

    /// Like `read`, but as a `Result` for call sites that propagate with `?`.
    pub fn get(&self, offset: usize) -> Result<&T, OutOfHistory> {
        self.read(offset).ok_or(OutOfHistory {
            offset,
            len: self.values.len(),
        })
    }

    pub fn latest(&self) -> Option<&T> {
        self.values.last()
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Iterate from the latest value backwards (offset 0, 1, 2, ...).
    pub fn iter(&self) -> impl Iterator<Item = &T> + '_ {
        self.values.iter().rev()
    }

    /// Values in write order (oldest first).
    pub fn chronological(&self) -> &[T] {
        &self.values
    }
}

/// A numeric series that indicators can read by offset.
pub trait Observable {
    fn series_id(&self) -> SeriesId;

    /// Value at `offset`, or `None` when the history is too short.
    fn observe(&self, offset: usize) -> Option<f64>;

    /// Number of readable offsets.
    fn depth(&self) -> usize;
}

impl Observable for Lookback<f64> {
    fn series_id(&self) -> SeriesId {
        self.id
    }

    fn observe(&self, offset: usize) -> Option<f64> {
        self.read(offset).copied()
    }

    fn depth(&self) -> usize {
        self.len()
    }
}

/// Which price of a bar a projection reads.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BarField {
    Open,
    High,
    Low,
    Close,
}

impl BarField {
    fn label(&self) -> &'static str {
        match self {
            Self::Open => "open",
            Self::High => "high",
            Self::Low => "low",
            Self::Close => "close",
        }
    }

    pub fn of(&self, bar: &Bar) -> f64 {
        match self {
            Self::Open => bar.open,
            Self::High => bar.high,
            Self::Low => bar.low,
            Self::Close => bar.close,
        }
    }
}

/// Zero-copy numeric view over one field of a bar series.
#[derive(Debug, Clone, Copy)]
pub struct FieldView<'a> {
    bars: &'a Lookback<Bar>,
    field: BarField,
    id: SeriesId,
}

impl<'a> FieldView<'a> {
    pub fn new(bars: &'a Lookback<Bar>, field: BarField) -> Self {
        Self {
            bars,
            field,
            id: bars.id().child(field.label()),
        }
    }
}

impl Observable for FieldView<'_> {
    fn series_id(&self) -> SeriesId {
        self.id
    }

    fn observe(&self, offset: usize) -> Option<f64> {
        self.bars.read(offset).map(|bar| self.field.of(bar))
    }

    fn depth(&self) -> usize {
        self.bars.len()
    }
}
