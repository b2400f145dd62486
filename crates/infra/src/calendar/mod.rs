//! Calendar integration: provider adapters, token management, the sync
//! worker, and the forwarder.

pub mod forward;
pub mod providers;
pub mod sync;
pub mod token;
pub mod window;

pub use forward::{ForwardReport, Forwarder};
pub use providers::{create_provider, CalendarProvider, RefreshedTokens, TimeblockDraft};
pub use sync::MeetingSyncWorker;
pub use token::TokenManager;
pub use window::FetchWindow;
