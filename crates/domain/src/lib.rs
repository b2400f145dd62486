//! # Linkcal Domain
//!
//! Shared value types, error taxonomy, and constants for the meeting
//! synchronization engine. This crate is pure data: no I/O, no async.

pub mod constants;
pub mod errors;
pub mod types;

pub use errors::{LinkcalError, Result};
pub use types::{
    LinkedAccount, Meeting, MeetingDiff, MeetingFields, NewMeeting, NormalizedMeeting, Provider,
    SyncPhase, SyncReport,
};
