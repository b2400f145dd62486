//! Meeting sync worker.
//!
//! Drives one account through the full pass: refresh the token, fetch and
//! normalize events inside the sliding window, filter and dedupe, diff
//! against the store, and apply the diff. Token and fetch failures abort the
//! pass; once applying starts, per-record failures are logged and counted
//! rather than propagated, and `last_synced` is stamped either way.

use std::sync::Arc;

use chrono::{Duration, Utc};
use linkcal_core::{clean_meetings, compute_diff, dedupe_by_event_id, MeetingStore};
use linkcal_domain::constants::PERIODIC_SYNC_INTERVAL_HOURS;
use linkcal_domain::{
    LinkedAccount, NewMeeting, NormalizedMeeting, Result, SyncPhase, SyncReport,
};
use tracing::{debug, info, instrument, warn};

use super::providers::create_provider;
use super::token::TokenManager;
use super::window::FetchWindow;
use crate::config::CalendarConfig;

pub struct MeetingSyncWorker {
    store: Arc<dyn MeetingStore>,
    tokens: TokenManager,
    config: CalendarConfig,
}

impl MeetingSyncWorker {
    pub fn new(store: Arc<dyn MeetingStore>, config: CalendarConfig) -> Self {
        let tokens = TokenManager::new(Arc::clone(&store));
        Self { store, tokens, config }
    }

    /// Fetch and normalize the account's events for the current window.
    ///
    /// Covers the `Fetching` and `Validating` phases: the provider adapter
    /// returns normalized events, then malformed and self-generated events
    /// are dropped and duplicates collapsed (first position, last value).
    #[instrument(skip_all, fields(account_id = %account.id, provider = %account.provider))]
    pub async fn fetch_meetings(&self, account: &LinkedAccount) -> Result<Vec<NormalizedMeeting>> {
        debug!(phase = ?SyncPhase::Fetching, "refreshing token and fetching events");
        let provider = create_provider(account.provider, &self.config);
        let access_token = self.tokens.refresh_and_persist(account, provider.as_ref()).await?;

        let window = FetchWindow::current();
        let fetched = provider.fetch_events(&access_token, &window).await?;
        debug!(phase = ?SyncPhase::Validating, fetched = fetched.len(), "events fetched");

        let meetings = dedupe_by_event_id(clean_meetings(fetched));
        Ok(meetings)
    }

    /// Reconcile already-fetched meetings into the store for one account.
    ///
    /// Applies deletes first so a re-created event cannot collide with its
    /// own stale row, then inserts, then updates one by one. A failed update
    /// is counted and skipped; the rest of the batch still lands.
    #[instrument(skip(self, meetings), fields(account_id = %linked_account_id))]
    pub async fn sync_to_store(
        &self,
        meetings: Vec<NormalizedMeeting>,
        linked_account_id: &str,
        user_id: &str,
    ) -> Result<SyncReport> {
        let mut report = SyncReport {
            phase: SyncPhase::Validating,
            fetched: meetings.len(),
            filtered: 0,
            inserted: 0,
            updated: 0,
            update_failures: 0,
            deleted: 0,
        };

        // Filter drops and dedup collapses are tracked separately; only the
        // former counts as filtered.
        let cleaned = clean_meetings(meetings);
        report.filtered = report.fetched - cleaned.len();
        let meetings = dedupe_by_event_id(cleaned);

        report.phase = SyncPhase::Diffing;
        let stored = self.store.list_meetings(linked_account_id).await?;
        let diff = compute_diff(&meetings, &stored);
        debug!(
            to_insert = diff.to_insert.len(),
            to_update = diff.to_update.len(),
            to_delete = diff.to_delete.len(),
            "diff computed"
        );

        report.phase = SyncPhase::Applying;
        if !diff.to_delete.is_empty() {
            report.deleted = self.store.delete_meetings(linked_account_id, &diff.to_delete).await?;
        }

        if !diff.to_insert.is_empty() {
            let rows: Vec<NewMeeting> = diff
                .to_insert
                .iter()
                .map(|meeting| NewMeeting::from_normalized(meeting, linked_account_id, user_id))
                .collect();
            report.inserted = self.store.insert_meetings(&rows).await?;
        }

        for (external_event_id, fields) in &diff.to_update {
            match self.store.update_meeting(linked_account_id, external_event_id, fields).await {
                Ok(()) => report.updated += 1,
                Err(err) => {
                    warn!(%external_event_id, error = %err, "meeting update failed, skipping");
                    report.update_failures += 1;
                }
            }
        }

        // Stamped even when some updates failed: the pass ran and the window
        // was reconciled, so the periodic gate should not re-run it early.
        self.store.update_last_synced(linked_account_id, Utc::now()).await?;

        report.phase = SyncPhase::Done;
        info!(
            inserted = report.inserted,
            updated = report.updated,
            update_failures = report.update_failures,
            deleted = report.deleted,
            "sync pass complete"
        );
        Ok(report)
    }

    /// One full sync pass for a pre-resolved account. Webhook handlers call
    /// this directly with the account they resolved from the channel id.
    pub async fn sync_linked_account(&self, account: &LinkedAccount) -> Result<SyncReport> {
        let meetings = self.fetch_meetings(account).await?;
        self.sync_to_store(meetings, &account.id, &account.user_id).await
    }

    /// One full sync pass for an account looked up by id.
    pub async fn sync_account(&self, account_id: &str) -> Result<SyncReport> {
        let account = self.store.get_linked_account(account_id).await?;
        self.sync_linked_account(&account).await
    }

    /// Sync every account for a user, sequentially, skipping accounts synced
    /// within `PERIODIC_SYNC_INTERVAL_HOURS`. One account's failure does not
    /// stop the rest; failed accounts appear in the result with a `Failed`
    /// report.
    #[instrument(skip(self))]
    pub async fn sync_all_accounts(
        &self,
        user_id: &str,
        force: bool,
    ) -> Result<Vec<(String, SyncReport)>> {
        let accounts = self.store.list_linked_accounts(user_id).await?;
        let min_interval = Duration::hours(PERIODIC_SYNC_INTERVAL_HOURS);
        let now = Utc::now();

        let mut reports = Vec::with_capacity(accounts.len());
        for account in accounts {
            if !force {
                if let Some(last) = account.last_synced {
                    if now - last < min_interval {
                        debug!(account_id = %account.id, %last, "skipping recently synced account");
                        continue;
                    }
                }
            }
            let report = match self.sync_linked_account(&account).await {
                Ok(report) => report,
                Err(err) => {
                    warn!(account_id = %account.id, error = %err, "account sync failed");
                    SyncReport::failed()
                }
            };
            reports.push((account.id, report));
        }
        Ok(reports)
    }

    /// Unlink an account: scrub the engine's placeholder events from the
    /// remote calendar, then delete the local account and its meetings.
    ///
    /// Cleanup failure aborts the unlink so placeholders are never silently
    /// orphaned on a calendar the engine no longer watches.
    #[instrument(skip(self))]
    pub async fn unlink_account(&self, account_id: &str) -> Result<usize> {
        let account = self.store.get_linked_account(account_id).await?;
        let provider = create_provider(account.provider, &self.config);
        let access_token = self.tokens.refresh_and_persist(&account, provider.as_ref()).await?;

        let removed = provider.delete_timeblocks(&access_token).await?;
        self.store.delete_linked_account(account_id).await?;

        info!(removed, "account unlinked");
        Ok(removed)
    }
}
