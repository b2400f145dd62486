//! # Linkcal Core
//!
//! Pure synchronization logic: the persistent-store port, the event
//! filter/validator, the deduplicator, and the diff engine. Everything here
//! is deterministic and I/O-free; infrastructure implements the ports.

pub mod dedupe;
pub mod diff;
pub mod filter;
pub mod ports;

pub use dedupe::dedupe_by_event_id;
pub use diff::compute_diff;
pub use filter::{clean_meetings, is_self_generated, is_valid_event_date};
pub use ports::MeetingStore;
