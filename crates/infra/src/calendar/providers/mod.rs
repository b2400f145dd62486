//! Provider adapters for Google Calendar and Microsoft Graph.

pub mod google;
pub mod microsoft;
pub mod traits;

pub use google::GoogleCalendarProvider;
pub use microsoft::MicrosoftCalendarProvider;
pub use traits::{create_provider, CalendarProvider, RefreshedTokens, TimeblockDraft};
