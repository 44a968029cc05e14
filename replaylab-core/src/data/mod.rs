//! Data stream contract and in-memory streams.

pub mod memory;
pub mod stream;

pub use memory::MemoryStream;
pub use stream::{BarRecord, DataError, DataStream, DateWindow, RecordIter};
