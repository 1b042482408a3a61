//! # Formats
//!
//! Serialization formats for stored records. File and database I/O live in
//! `store`; this module only turns records into bytes and back.

pub mod record;

pub use record::{MAX_RECORD_PAYLOAD_SIZE, RecordHeader, decode_record, encode_record};
