//! I/O for reading stream records from disk

mod json;

pub use json::{read_stream_records, JsonStreamSearch};
