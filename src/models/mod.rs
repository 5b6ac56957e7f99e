//! Data models for jobwire.

mod record;

pub use record::{publish_flag_set, ParseStatusError, Record, RecordStatus};
