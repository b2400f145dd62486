//! Diff engine.
//!
//! Compares a cleaned, deduplicated fetch against the persisted set for one
//! linked account and computes the minimal insert/update/delete sets. This is
//! full-replace semantics over the fetch window: anything stored but not seen
//! in the current fetch is considered removed from the provider and purged.
//!
//! Because the window is bounded (one month back, three months ahead), events
//! that scroll out of it will show up in `to_delete` even if they still exist
//! on the provider's full calendar. That is accepted behavior of the bounded
//! window, not a bug.

use std::collections::{HashMap, HashSet};

use linkcal_domain::{Meeting, MeetingDiff, NormalizedMeeting};
use tracing::debug;

/// Computes the operation sets needed to reconcile `existing` with `fetched`.
///
/// Unchanged meetings are skipped entirely to avoid unnecessary writes.
/// Attendee lists use deep equality over the full list.
pub fn compute_diff(fetched: &[NormalizedMeeting], existing: &[Meeting]) -> MeetingDiff {
    let existing_by_id: HashMap<&str, &Meeting> =
        existing.iter().map(|m| (m.external_event_id.as_str(), m)).collect();
    let fetched_ids: HashSet<&str> =
        fetched.iter().map(|m| m.external_event_id.as_str()).collect();

    let mut diff = MeetingDiff::default();

    for meeting in fetched {
        match existing_by_id.get(meeting.external_event_id.as_str()) {
            None => diff.to_insert.push(meeting.clone()),
            Some(stored) => {
                let fields = meeting.fields();
                if fields != stored.fields() {
                    diff.to_update.push((meeting.external_event_id.clone(), fields));
                }
            }
        }
    }

    diff.to_delete = existing
        .iter()
        .filter(|m| !fetched_ids.contains(m.external_event_id.as_str()))
        .map(|m| m.external_event_id.clone())
        .collect();

    debug!(
        insert = diff.to_insert.len(),
        update = diff.to_update.len(),
        delete = diff.to_delete.len(),
        "computed meeting diff"
    );

    diff
}

#[cfg(test)]
mod tests {
    use chrono::Utc;
    use linkcal_domain::Provider;

    use super::*;

    fn fetched(id: &str, name: &str, start: &str) -> NormalizedMeeting {
        NormalizedMeeting {
            external_event_id: id.into(),
            provider: Provider::Google,
            name: name.into(),
            start_date: start.into(),
            end_date: "2024-01-01T10:00:00Z".into(),
            attendees: vec!["a@example.com".into()],
            location: "No location".into(),
            link: "No link".into(),
            message: "No description".into(),
            status: "confirmed".into(),
        }
    }

    fn stored(id: &str, name: &str, start: &str) -> Meeting {
        let now = Utc::now();
        Meeting {
            id: format!("row-{id}"),
            user_id: "user-1".into(),
            linked_account_id: "acct-1".into(),
            external_event_id: id.into(),
            provider: Provider::Google,
            name: name.into(),
            start_date: start.into(),
            end_date: "2024-01-01T10:00:00Z".into(),
            attendees: vec!["a@example.com".into()],
            location: "No location".into(),
            link: "No link".into(),
            message: "No description".into(),
            status: "confirmed".into(),
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn delete_on_absence() {
        let diff = compute_diff(
            &[fetched("A", "Standup", "2024-01-01T09:00:00Z")],
            &[
                stored("A", "Standup", "2024-01-01T09:00:00Z"),
                stored("B", "Retro", "2024-01-02T09:00:00Z"),
            ],
        );
        assert!(diff.to_insert.is_empty());
        assert!(diff.to_update.is_empty());
        assert_eq!(diff.to_delete, vec!["B".to_string()]);
    }

    #[test]
    fn start_time_change_is_an_update_not_insert_or_delete() {
        let diff = compute_diff(
            &[fetched("A", "Standup", "2024-01-01T09:30:00Z")],
            &[stored("A", "Standup", "2024-01-01T09:00:00Z")],
        );
        assert!(diff.to_insert.is_empty());
        assert!(diff.to_delete.is_empty());
        assert_eq!(diff.to_update.len(), 1);
        assert_eq!(diff.to_update[0].0, "A");
        assert_eq!(diff.to_update[0].1.start_date, "2024-01-01T09:30:00Z");
    }

    #[test]
    fn unchanged_meeting_produces_empty_diff() {
        let diff = compute_diff(
            &[fetched("A", "Standup", "2024-01-01T09:00:00Z")],
            &[stored("A", "Standup", "2024-01-01T09:00:00Z")],
        );
        assert!(diff.is_empty());
    }

    #[test]
    fn attendee_list_change_detected() {
        let mut event = fetched("A", "Standup", "2024-01-01T09:00:00Z");
        event.attendees.push("b@example.com".into());
        let diff = compute_diff(&[event], &[stored("A", "Standup", "2024-01-01T09:00:00Z")]);
        assert_eq!(diff.to_update.len(), 1);
    }

    #[test]
    fn fresh_account_inserts_everything() {
        let diff = compute_diff(
            &[
                fetched("A", "Standup", "2024-01-01T09:00:00Z"),
                fetched("B", "Retro", "2024-01-02T09:00:00Z"),
                fetched("C", "1:1", "2024-01-03T09:00:00Z"),
            ],
            &[],
        );
        assert_eq!(diff.to_insert.len(), 3);
        assert!(diff.to_update.is_empty());
        assert!(diff.to_delete.is_empty());
    }
}
