//! Simulation clock: k-way merge of data streams into one timeline.
//!
//! Each stream is opened once per run and read through a cursor holding one
//! record of lookahead. Every `advance` picks the smallest head timestamp,
//! then drains all records at exactly that timestamp from every stream, in
//! registration order, into the market. A stream may emit many records at
//! one timestamp (an option chain); they all land on the same tick.

use chrono::NaiveDateTime;

use crate::data::{BarRecord, DataError, DataStream, DateWindow, RecordIter};
use crate::domain::Market;
use crate::series::Lookback;

/// One merged timestamp.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Tick {
    pub timestamp: NaiveDateTime,
    /// Zero-based count of ticks before this one.
    pub index: u64,
    /// Records absorbed at this timestamp across all streams.
    pub records: usize,
    /// Records dropped because their instrument already had a bar at this timestamp.
    pub duplicates: usize,
    /// No stream has data left after this tick.
    pub is_last: bool,
}

struct Cursor {
    name: String,
    window: DateWindow,
    records: RecordIter,
    head: Option<BarRecord>,
    last: Option<NaiveDateTime>,
}

impl Cursor {
    fn open(stream: &dyn DataStream, window: DateWindow) -> Result<Self, DataError> {
        let mut cursor = Self {
            name: stream.name().to_string(),
            window,
            records: stream.open(window)?,
            head: None,
            last: None,
        };
        cursor.fetch()?;
        Ok(cursor)
    }

    /// Load the next in-window record into `head`.
    fn fetch(&mut self) -> Result<(), DataError> {
        self.head = None;
        for next in self.records.by_ref() {
            let record = next?;
            let ts = record.timestamp();
            if let Some(previous) = self.last {
                if ts < previous {
                    return Err(DataError::OutOfOrder {
                        stream: self.name.clone(),
                        previous,
                        found: ts,
                    });
                }
            }
            self.last = Some(ts);
            if self.window.contains(ts) {
                self.head = Some(record);
                break;
            }
        }
        Ok(())
    }

    fn head_timestamp(&self) -> Option<NaiveDateTime> {
        self.head.as_ref().map(BarRecord::timestamp)
    }

    /// Take the head if it sits at `ts` and refill.
    fn take_at(&mut self, ts: NaiveDateTime) -> Result<Option<BarRecord>, DataError> {
        if self.head_timestamp() != Some(ts) {
            return Ok(None);
        }
        let record = self.head.take();
        self.fetch()?;
        Ok(record)
    }
}

/// Merged cursor over every registered stream.
pub struct Clock {
    cursors: Vec<Cursor>,
    timestamps: Lookback<NaiveDateTime>,
    ticks: u64,
}

impl Clock {
    /// Open every stream over `window`. Streams keep their slice order for tie-breaking.
    pub fn open(streams: &[Box<dyn DataStream>], window: DateWindow) -> Result<Self, DataError> {
        let cursors = streams
            .iter()
            .map(|s| Cursor::open(s.as_ref(), window))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self {
            cursors,
            timestamps: Lookback::named("clock/timestamps"),
            ticks: 0,
        })
    }

    /// Timestamp the next `advance` will produce.
    pub fn peek(&self) -> Option<NaiveDateTime> {
        self.cursors.iter().filter_map(Cursor::head_timestamp).min()
    }

    pub fn is_exhausted(&self) -> bool {
        self.cursors.iter().all(|c| c.head.is_none())
    }

    /// Drain every record at the next timestamp into `market`.
    ///
    /// Returns `Ok(None)` once all streams are exhausted.
    pub fn advance(&mut self, market: &mut Market) -> Result<Option<Tick>, DataError> {
        let Some(now) = self.peek() else {
            return Ok(None);
        };

        let mut records = 0;
        let mut duplicates = 0;
        for cursor in &mut self.cursors {
            while let Some(record) = cursor.take_at(now)? {
                if market.absorb(record) {
                    records += 1;
                } else {
                    duplicates += 1;
                }
            }
        }

        self.timestamps.write(now);
        let tick = Tick {
            timestamp: now,
            index: self.ticks,
            records,
            duplicates,
            is_last: self.is_exhausted(),
        };
        self.ticks += 1;
        Ok(Some(tick))
    }

    /// Latest emitted timestamp.
    pub fn now(&self) -> Option<NaiveDateTime> {
        self.timestamps.latest().copied()
    }

    /// Every timestamp emitted so far.
    pub fn timestamps(&self) -> &Lookback<NaiveDateTime> {
        &self.timestamps
    }

    pub fn ticks(&self) -> u64 {
        self.ticks
    }

    pub fn stream_count(&self) -> usize {
        self.cursors.len()
    }
}
