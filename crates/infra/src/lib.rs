//! # Linkcal Infrastructure
//!
//! Infrastructure implementations of the core ports:
//! - SQLite-backed meeting store
//! - Google/Microsoft calendar provider adapters
//! - Token manager, sync worker, and forwarder
//!
//! All "impure" code (HTTP, database, clocks) lives here; the sync logic
//! itself is in `linkcal-core`.

pub mod calendar;
pub mod config;
pub mod database;
pub mod errors;
pub mod retry;

pub use calendar::{ForwardReport, Forwarder, MeetingSyncWorker, TokenManager};
pub use config::{CalendarConfig, ProviderEndpoints};
pub use database::{SqliteMeetingStore, SqlitePool};
pub use errors::InfraError;
