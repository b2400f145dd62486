//! Sync bookkeeping: the computed diff and the per-attempt report.

use serde::{Deserialize, Serialize};

use super::meeting::{MeetingFields, NormalizedMeeting};

/// The minimal operation sets needed to reconcile stored state with a fresh
/// fetch for one linked account.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MeetingDiff {
    /// Fetched meetings absent from the store.
    pub to_insert: Vec<NormalizedMeeting>,
    /// `(external_event_id, changed fields)` for meetings present in both
    /// sets with at least one differing field.
    pub to_update: Vec<(String, MeetingFields)>,
    /// External ids present in the store but absent from the fetch.
    pub to_delete: Vec<String>,
}

impl MeetingDiff {
    pub fn is_empty(&self) -> bool {
        self.to_insert.is_empty() && self.to_update.is_empty() && self.to_delete.is_empty()
    }
}

/// Phases of one sync attempt. `Failed` is terminal and only reachable from
/// `Fetching` (token refresh or transport failure); later phases recover
/// per-record and keep going.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SyncPhase {
    Fetching,
    Validating,
    Diffing,
    Applying,
    Done,
    Failed,
}

/// Per-category operation counts for one sync attempt.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SyncReport {
    pub phase: SyncPhase,
    pub fetched: usize,
    /// Events dropped by the filter stage (malformed or self-generated).
    pub filtered: usize,
    pub inserted: usize,
    pub updated: usize,
    pub update_failures: usize,
    pub deleted: usize,
}

impl SyncReport {
    pub fn failed() -> Self {
        Self {
            phase: SyncPhase::Failed,
            fetched: 0,
            filtered: 0,
            inserted: 0,
            updated: 0,
            update_failures: 0,
            deleted: 0,
        }
    }
}
