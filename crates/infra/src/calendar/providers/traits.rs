//! Calendar provider trait and factory.
//!
//! Adding a provider means implementing this trait and extending the factory;
//! nothing else in the engine branches on the provider.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use linkcal_domain::{NormalizedMeeting, Provider, Result};
use serde::{Deserialize, Serialize};

use super::google::GoogleCalendarProvider;
use super::microsoft::MicrosoftCalendarProvider;
use crate::calendar::window::FetchWindow;
use crate::config::CalendarConfig;

/// Result of exchanging a refresh token at the provider's token endpoint.
/// Providers may or may not rotate the refresh token; `None` means the prior
/// one remains valid.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RefreshedTokens {
    pub access_token: String,
    pub refresh_token: Option<String>,
}

/// Placeholder event to be created on a target calendar. Always free /
/// transparent; never carries real event semantics.
#[derive(Debug, Clone)]
pub struct TimeblockDraft {
    pub title: String,
    pub body: String,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

/// Operations the engine needs from one calendar provider.
#[async_trait]
pub trait CalendarProvider: Send + Sync {
    fn provider(&self) -> Provider;

    /// Fetch events in the window and normalize them into the canonical
    /// shape. Performs no retries; transport and authorization failures
    /// surface as typed errors for the caller to handle.
    async fn fetch_events(
        &self,
        access_token: &str,
        window: &FetchWindow,
    ) -> Result<Vec<NormalizedMeeting>>;

    /// Exchange the stored refresh token for a fresh access token.
    async fn refresh_token(&self, refresh_token: &str) -> Result<RefreshedTokens>;

    /// Best-effort idempotency probe: is an event with this exact title
    /// already present near the given time range?
    async fn timeblock_exists(
        &self,
        access_token: &str,
        title: &str,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<bool>;

    /// Create a placeholder event on the primary calendar.
    async fn create_timeblock(&self, access_token: &str, draft: &TimeblockDraft) -> Result<()>;

    /// Remove the engine's own placeholder events from the calendar, paging
    /// through a marker search. Individual delete failures are skipped; the
    /// count of events actually removed is returned.
    async fn delete_timeblocks(&self, access_token: &str) -> Result<usize>;
}

/// Build the adapter for a provider variant.
pub fn create_provider(provider: Provider, config: &CalendarConfig) -> Box<dyn CalendarProvider> {
    match provider {
        Provider::Google => Box::new(GoogleCalendarProvider::new(
            config.google.clone(),
            config.timeblock_marker.clone(),
        )),
        Provider::Microsoft => Box::new(MicrosoftCalendarProvider::new(
            config.microsoft.clone(),
            config.timeblock_marker.clone(),
        )),
    }
}
