//! # Record Store
//!
//! Document collections with store-assigned ids, shallow-merge updates and
//! atomic multi-record batches.

pub mod errors;
pub mod json_file;
pub mod memory;
pub mod store;

pub use errors::{RecordError, RecordResult};
pub use json_file::JsonFileRecordStore;
pub use memory::MemoryRecordStore;
pub use store::{Document, Fields, RecordStore, SortKey};
