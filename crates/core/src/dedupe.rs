//! Deduplicator.
//!
//! Providers occasionally return the same event twice in one page set
//! (recurring-event expansion and pagination overlap are the usual causes).
//! Within a batch, the last occurrence wins while the position of the first
//! occurrence is kept, so provider ordering survives.

use std::collections::HashMap;

use linkcal_domain::NormalizedMeeting;

/// Collapses meetings sharing an `external_event_id` to one record each.
pub fn dedupe_by_event_id(meetings: Vec<NormalizedMeeting>) -> Vec<NormalizedMeeting> {
    let mut seen: HashMap<String, usize> = HashMap::with_capacity(meetings.len());
    let mut out: Vec<NormalizedMeeting> = Vec::with_capacity(meetings.len());

    for meeting in meetings {
        match seen.get(&meeting.external_event_id) {
            Some(&idx) => out[idx] = meeting,
            None => {
                seen.insert(meeting.external_event_id.clone(), out.len());
                out.push(meeting);
            }
        }
    }

    out
}

#[cfg(test)]
mod tests {
    use linkcal_domain::Provider;

    use super::*;

    fn meeting(id: &str, name: &str) -> NormalizedMeeting {
        NormalizedMeeting {
            external_event_id: id.into(),
            provider: Provider::Google,
            name: name.into(),
            start_date: "2024-01-01T09:00:00Z".into(),
            end_date: "2024-01-01T10:00:00Z".into(),
            attendees: vec![],
            location: "No location".into(),
            link: "No link".into(),
            message: "No description".into(),
            status: "confirmed".into(),
        }
    }

    #[test]
    fn last_record_wins() {
        let deduped = dedupe_by_event_id(vec![meeting("a", "first"), meeting("a", "second")]);
        assert_eq!(deduped.len(), 1);
        assert_eq!(deduped[0].name, "second");
    }

    #[test]
    fn preserves_first_seen_order() {
        let deduped = dedupe_by_event_id(vec![
            meeting("a", "a1"),
            meeting("b", "b1"),
            meeting("a", "a2"),
        ]);
        let ids: Vec<&str> = deduped.iter().map(|m| m.external_event_id.as_str()).collect();
        assert_eq!(ids, ["a", "b"]);
        assert_eq!(deduped[0].name, "a2");
    }

    #[test]
    fn no_duplicates_is_identity() {
        let deduped = dedupe_by_event_id(vec![meeting("a", "a1"), meeting("b", "b1")]);
        assert_eq!(deduped.len(), 2);
    }
}
