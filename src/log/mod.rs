//! Reading the history log: separator splitting and record decoding.

pub mod reader;
pub mod record;

pub use reader::{RECORD_SEPARATOR, RawChunk, RecordReader};
pub use record::{EntityKind, ExtraInfo, RawRecord, decode_record};
