//! Busy-time forwarder.
//!
//! Mirrors one account's stored meetings onto another linked account as
//! opaque placeholder events: marked title, free/transparent, no attendees.
//! Creation is idempotent (probe before create) and retried with linear
//! backoff; one meeting's failure never stops the rest.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, NaiveDate, Utc};
use linkcal_core::MeetingStore;
use linkcal_domain::constants::{
    FORWARD_BACKOFF_BASE_MS, FORWARD_MAX_ATTEMPTS, NO_DESCRIPTION, NO_LINK,
    TIMEBLOCK_TITLE_PREFIX,
};
use linkcal_domain::{LinkcalError, Meeting, Result};
use tracing::{debug, info, instrument, warn};

use super::providers::{create_provider, CalendarProvider, TimeblockDraft};
use super::token::TokenManager;
use crate::config::CalendarConfig;
use crate::retry::retry_linear;

/// Per-meeting outcome counts for one forward pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ForwardReport {
    pub success: usize,
    pub failure: usize,
}

pub struct Forwarder {
    store: Arc<dyn MeetingStore>,
    tokens: TokenManager,
    config: CalendarConfig,
}

impl Forwarder {
    pub fn new(store: Arc<dyn MeetingStore>, config: CalendarConfig) -> Self {
        let tokens = TokenManager::new(Arc::clone(&store));
        Self { store, tokens, config }
    }

    /// Forward every stored meeting of `source_account_id` onto the calendar
    /// behind `target_account_id`.
    #[instrument(skip(self))]
    pub async fn forward(
        &self,
        source_account_id: &str,
        target_account_id: &str,
    ) -> Result<ForwardReport> {
        let meetings = self.store.list_meetings(source_account_id).await?;
        let target = self.store.get_linked_account(target_account_id).await?;

        let provider = create_provider(target.provider, &self.config);
        let access_token = self.tokens.refresh_and_persist(&target, provider.as_ref()).await?;

        let loop_marker = format!("forwarded from {target_account_id}").to_lowercase();
        let mut report = ForwardReport::default();

        for meeting in &meetings {
            // A meeting that itself originated from the target would bounce
            // back and forth forever.
            if meeting.name.to_lowercase().contains(&loop_marker) {
                debug!(external_event_id = %meeting.external_event_id, "skipping forward loop");
                continue;
            }

            match self.forward_one(provider.as_ref(), &access_token, meeting).await {
                Ok(()) => report.success += 1,
                Err(err) => {
                    warn!(
                        external_event_id = %meeting.external_event_id,
                        error = %err,
                        "forward failed for meeting"
                    );
                    report.failure += 1;
                }
            }
        }

        info!(success = report.success, failure = report.failure, "forward pass complete");
        Ok(report)
    }

    async fn forward_one(
        &self,
        provider: &dyn CalendarProvider,
        access_token: &str,
        meeting: &Meeting,
    ) -> Result<()> {
        let start = parse_event_instant(&meeting.start_date)?;
        let end = parse_event_instant(&meeting.end_date)?;

        let draft = TimeblockDraft {
            title: format!("{TIMEBLOCK_TITLE_PREFIX}{}", meeting.name),
            body: compose_body(meeting, start, end),
            start,
            end,
        };

        let draft = &draft;
        retry_linear(
            FORWARD_MAX_ATTEMPTS,
            Duration::from_millis(FORWARD_BACKOFF_BASE_MS),
            move || async move {
                if provider.timeblock_exists(access_token, &draft.title, start, end).await? {
                    debug!(title = %draft.title, "timeblock already present, skipping create");
                    return Ok(());
                }
                provider.create_timeblock(access_token, draft).await
            },
        )
        .await
    }
}

/// Parses a stored event date into an instant. All-day date-only values map
/// to UTC midnight.
fn parse_event_instant(value: &str) -> Result<DateTime<Utc>> {
    let trimmed = value.trim();
    if let Ok(instant) = DateTime::parse_from_rfc3339(trimmed) {
        return Ok(instant.with_timezone(&Utc));
    }
    if let Ok(date) = NaiveDate::parse_from_str(trimmed, "%Y-%m-%d") {
        if let Some(midnight) = date.and_hms_opt(0, 0, 0) {
            return Ok(midnight.and_utc());
        }
    }
    Err(LinkcalError::InvalidInput(format!("unparseable event date: {value}")))
}

/// Placeholder body: enough context to find the original, plus the fixed
/// signature the ingest filter recognizes.
fn compose_body(meeting: &Meeting, start: DateTime<Utc>, end: DateTime<Utc>) -> String {
    let attendees = if meeting.attendees.is_empty() {
        "No attendees".to_string()
    } else {
        meeting.attendees.join(", ")
    };

    let mut body = format!(
        "Name: {}\nTime: {} - {}\nAttendees: {}\n",
        meeting.name,
        start.format("%H:%M"),
        end.format("%H:%M"),
        attendees,
    );
    if meeting.message != NO_DESCRIPTION && !meeting.message.is_empty() {
        body.push_str(&format!("Body: {}\n", meeting.message));
    }
    if meeting.link != NO_LINK && !meeting.link.is_empty() {
        body.push_str(&format!("Link: {}\n", meeting.link));
    }
    body.push_str("-----\nMeeting forwarded by Linkcal.io");
    body
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;
    use linkcal_domain::Provider;

    use super::*;

    fn stored_meeting() -> Meeting {
        Meeting {
            id: "m-1".into(),
            user_id: "u-1".into(),
            linked_account_id: "acct-1".into(),
            external_event_id: "ev-1".into(),
            provider: Provider::Google,
            name: "Weekly planning".into(),
            start_date: "2024-06-01T09:00:00Z".into(),
            end_date: "2024-06-01T09:30:00Z".into(),
            attendees: vec!["a@example.com".into(), "b@example.com".into()],
            location: "No location".into(),
            link: "No link".into(),
            message: "No description".into(),
            status: "confirmed".into(),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn body_lists_attendees_and_carries_signature() {
        let meeting = stored_meeting();
        let start = Utc.with_ymd_and_hms(2024, 6, 1, 9, 0, 0).unwrap();
        let end = Utc.with_ymd_and_hms(2024, 6, 1, 9, 30, 0).unwrap();
        let body = compose_body(&meeting, start, end);
        assert!(body.contains("Name: Weekly planning"));
        assert!(body.contains("Time: 09:00 - 09:30"));
        assert!(body.contains("Attendees: a@example.com, b@example.com"));
        assert!(!body.contains("Body:"));
        assert!(!body.contains("Link:"));
        assert!(body.ends_with("-----\nMeeting forwarded by Linkcal.io"));
    }

    #[test]
    fn body_includes_real_description_and_link() {
        let mut meeting = stored_meeting();
        meeting.attendees = vec![];
        meeting.message = "Agenda attached".into();
        meeting.link = "https://meet.example.com/abc".into();
        let start = Utc.with_ymd_and_hms(2024, 6, 1, 9, 0, 0).unwrap();
        let end = Utc.with_ymd_and_hms(2024, 6, 1, 9, 30, 0).unwrap();
        let body = compose_body(&meeting, start, end);
        assert!(body.contains("Attendees: No attendees"));
        assert!(body.contains("Body: Agenda attached"));
        assert!(body.contains("Link: https://meet.example.com/abc"));
    }

    #[test]
    fn parses_rfc3339_and_date_only() {
        assert_eq!(
            parse_event_instant("2024-06-01T09:00:00+02:00").unwrap(),
            Utc.with_ymd_and_hms(2024, 6, 1, 7, 0, 0).unwrap()
        );
        assert_eq!(
            parse_event_instant("2024-06-01").unwrap(),
            Utc.with_ymd_and_hms(2024, 6, 1, 0, 0, 0).unwrap()
        );
        assert!(parse_event_instant("soon").is_err());
    }
}
