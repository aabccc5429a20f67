//! Observability for folio
//!
//! Structured JSON-line logging over a closed set of typed events.
//!
//! ```ignore
//! use folio::observability::{Event, Logger};
//!
//! Logger::info(Event::PostCreated, &[("post_id", &id)]);
//! Logger::emit(Event::BlobCleanupFailed, &[("path", path), ("error", &e.to_string())]);
//! ```

mod events;
mod logger;

pub use events::Event;
pub use logger::{Logger, Severity};
