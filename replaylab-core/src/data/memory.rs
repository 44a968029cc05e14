use crate::data::stream::{BarRecord, DataError, DataStream, DateWindow, RecordIter};

/// In-memory stream over a fixed record list.
///
/// Records are stable-sorted by timestamp on construction, so records sharing
/// a timestamp keep their given order.
#[derive(Debug, Clone)]
pub struct MemoryStream {
    name: String,
    records: Vec<BarRecord>,
}

impl MemoryStream {
    pub fn new(name: impl Into<String>, mut records: Vec<BarRecord>) -> Self {
        records.sort_by_key(|r| r.timestamp());
        Self {
            name: name.into(),
            records,
        }
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

impl DataStream for MemoryStream {
    fn name(&self) -> &str {
        &self.name
    }

    fn open(&self, window: DateWindow) -> Result<RecordIter, DataError> {
        let records: Vec<BarRecord> = self
            .records
            .iter()
            .filter(|r| window.contains(r.timestamp()))
            .cloned()
            .collect();
        Ok(Box::new(records.into_iter().map(Ok)))
    }
}
