//! Event filter/validator.
//!
//! Two failure classes are dropped here rather than propagated: events whose
//! start date does not parse, and events the engine itself created. Filtering
//! self-generated placeholders is what stops a forwarded timeblock from being
//! re-ingested as source data and duplicated across every linked account.

use linkcal_domain::constants::{FORWARD_SIGNATURE, LINKCAL_MARKER, TIMEBLOCK_MARKER};
use linkcal_domain::NormalizedMeeting;
use tracing::debug;

/// Whether a start/end value parses to a valid instant. Accepts RFC 3339
/// timestamps and the date-only form providers use for all-day events.
pub fn is_valid_event_date(value: &str) -> bool {
    let trimmed = value.trim();
    chrono::DateTime::parse_from_rfc3339(trimmed).is_ok()
        || chrono::NaiveDate::parse_from_str(trimmed, "%Y-%m-%d").is_ok()
}

/// Whether a meeting looks like a Linkcal-generated placeholder: a marker
/// substring in the title, or the forward signature in the body. All matches
/// are case-insensitive substring checks.
pub fn is_self_generated(meeting: &NormalizedMeeting) -> bool {
    let name = meeting.name.to_lowercase();
    if name.contains(LINKCAL_MARKER) || name.contains(TIMEBLOCK_MARKER) {
        return true;
    }
    meeting.message.to_lowercase().contains(FORWARD_SIGNATURE)
}

/// Drops malformed and self-generated meetings, returning the survivors.
///
/// Runs at fetch-normalization time and again at sync time: the adapters'
/// provider-level marker filter only catches title matches against the exact
/// configured marker, while this pass catches substring matches in title or
/// body.
pub fn clean_meetings(meetings: Vec<NormalizedMeeting>) -> Vec<NormalizedMeeting> {
    meetings
        .into_iter()
        .filter(|meeting| {
            if !is_valid_event_date(&meeting.start_date) {
                debug!(
                    external_event_id = %meeting.external_event_id,
                    start_date = %meeting.start_date,
                    "dropping event with unparseable start date"
                );
                return false;
            }
            if is_self_generated(meeting) {
                debug!(
                    external_event_id = %meeting.external_event_id,
                    name = %meeting.name,
                    "dropping self-generated placeholder event"
                );
                return false;
            }
            true
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use linkcal_domain::Provider;

    use super::*;

    fn meeting(name: &str, start: &str, message: &str) -> NormalizedMeeting {
        NormalizedMeeting {
            external_event_id: "ev-1".into(),
            provider: Provider::Google,
            name: name.into(),
            start_date: start.into(),
            end_date: "2024-01-01T10:00:00Z".into(),
            attendees: vec![],
            location: "No location".into(),
            link: "No link".into(),
            message: message.into(),
            status: "confirmed".into(),
        }
    }

    #[test]
    fn drops_timeblock_title_regardless_of_case() {
        let kept = clean_meetings(vec![
            meeting("LINKCAL TIMEBLOCK | Sync", "2024-01-01T09:00:00Z", ""),
            meeting("Linkcal Timeblock | Sync", "2024-01-01T09:00:00Z", ""),
            meeting("Standup", "2024-01-01T09:00:00Z", ""),
        ]);
        assert_eq!(kept.len(), 1);
        assert_eq!(kept[0].name, "Standup");
    }

    #[test]
    fn drops_forward_signature_in_body() {
        let kept = clean_meetings(vec![meeting(
            "Busy",
            "2024-01-01T09:00:00Z",
            "Name: x\n-----\nMeeting Forwarded By Linkcal.io",
        )]);
        assert!(kept.is_empty());
    }

    #[test]
    fn drops_unparseable_start_date() {
        let kept = clean_meetings(vec![meeting("Standup", "not-a-date", "")]);
        assert!(kept.is_empty());
    }

    #[test]
    fn keeps_all_day_date_only_start() {
        let kept = clean_meetings(vec![meeting("Offsite", "2024-01-01", "")]);
        assert_eq!(kept.len(), 1);
    }

    #[test]
    fn marker_in_middle_of_title_still_matches() {
        let kept = clean_meetings(vec![meeting(
            "review the timeblock proposal",
            "2024-01-01T09:00:00Z",
            "",
        )]);
        assert!(kept.is_empty());
    }
}
