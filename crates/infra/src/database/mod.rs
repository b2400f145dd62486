//! SQLite-backed persistence.

pub mod meeting_store;
pub mod pool;

pub use meeting_store::SqliteMeetingStore;
pub use pool::SqlitePool;
