//! Persistent-store port.
//!
//! The engine never talks to a database directly; it goes through this trait
//! so the store handle is injected rather than read from ambient state.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use linkcal_domain::{LinkedAccount, Meeting, MeetingFields, NewMeeting, Result};

/// Storage operations the sync engine depends on.
///
/// Individual calls are atomic at the row level; no multi-row transactions
/// are assumed. A crash mid-sync leaves a partially-applied set that the next
/// sync reconciles.
#[async_trait]
pub trait MeetingStore: Send + Sync {
    async fn get_linked_account(&self, account_id: &str) -> Result<LinkedAccount>;

    /// All linked accounts for one user, link order.
    async fn list_linked_accounts(&self, user_id: &str) -> Result<Vec<LinkedAccount>>;

    /// Resolve a webhook channel id to its account, if any. Lets a webhook
    /// collaborator drive a sync without an interactive session.
    async fn find_account_by_channel(&self, channel_id: &str) -> Result<Option<LinkedAccount>>;

    /// Fails with `LinkcalError::Database` if `(user_id, email)` is already
    /// linked.
    async fn insert_linked_account(&self, account: &LinkedAccount) -> Result<()>;

    /// Unlink: removes the account and cascades to its meetings.
    async fn delete_linked_account(&self, account_id: &str) -> Result<()>;

    async fn list_meetings(&self, linked_account_id: &str) -> Result<Vec<Meeting>>;

    /// Bulk insert. Rows that collide on `(external_event_id, provider,
    /// linked_account_id)` degrade to updates rather than failing the batch.
    async fn insert_meetings(&self, rows: &[NewMeeting]) -> Result<usize>;

    async fn update_meeting(
        &self,
        linked_account_id: &str,
        external_event_id: &str,
        fields: &MeetingFields,
    ) -> Result<()>;

    /// Delete by external id list, scoped to one account. Returns the number
    /// of rows removed.
    async fn delete_meetings(
        &self,
        linked_account_id: &str,
        external_event_ids: &[String],
    ) -> Result<usize>;

    async fn update_last_synced(&self, account_id: &str, at: DateTime<Utc>) -> Result<()>;

    async fn update_refresh_token(&self, account_id: &str, refresh_token: &str) -> Result<()>;
}
