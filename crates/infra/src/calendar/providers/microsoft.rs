//! Microsoft Graph calendar provider implementation.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use linkcal_domain::constants::{LINKCAL_MARKER, NO_DESCRIPTION, NO_LINK, NO_LOCATION, NO_TITLE};
use linkcal_domain::{LinkcalError, NormalizedMeeting, Provider, Result};
use reqwest::Client;
use serde::Deserialize;
use serde_json::json;
use tracing::{debug, warn};

use super::traits::{CalendarProvider, RefreshedTokens, TimeblockDraft};
use crate::calendar::window::FetchWindow;
use crate::config::ProviderEndpoints;
use crate::errors::InfraError;

const OUTLOOK_TIMEZONE_HEADER: &str = r#"outlook.timezone="UTC""#;
const PAGE_SIZE: u32 = 250;

/// Microsoft Graph adapter. Uses the calendarView endpoint over the fetch
/// window and follows `@odata.nextLink` pagination.
pub struct MicrosoftCalendarProvider {
    client: Client,
    endpoints: ProviderEndpoints,
    timeblock_marker: String,
}

impl MicrosoftCalendarProvider {
    pub fn new(endpoints: ProviderEndpoints, timeblock_marker: String) -> Self {
        Self { client: Client::new(), endpoints, timeblock_marker: timeblock_marker.to_lowercase() }
    }

    fn calendar_view_url(&self) -> String {
        format!("{}/me/calendarView", self.endpoints.api_base)
    }

    fn events_url(&self) -> String {
        format!("{}/me/events", self.endpoints.api_base)
    }
}

#[async_trait]
impl CalendarProvider for MicrosoftCalendarProvider {
    fn provider(&self) -> Provider {
        Provider::Microsoft
    }

    async fn fetch_events(
        &self,
        access_token: &str,
        window: &FetchWindow,
    ) -> Result<Vec<NormalizedMeeting>> {
        let mut events = Vec::new();
        let mut next_link: Option<String> = None;

        loop {
            // nextLink is an absolute URL carrying the original parameters.
            let request = match next_link {
                Some(ref link) => self.client.get(link),
                None => self.client.get(self.calendar_view_url()).query(&[
                    ("startDateTime", window.time_min.to_rfc3339()),
                    ("endDateTime", window.time_max.to_rfc3339()),
                    ("$top", PAGE_SIZE.to_string()),
                    (
                        "$select",
                        "id,subject,start,end,attendees,location,onlineMeeting,bodyPreview,\
                         showAs,responseStatus"
                            .to_string(),
                    ),
                ]),
            };

            let response = request
                .bearer_auth(access_token)
                .header("Prefer", OUTLOOK_TIMEZONE_HEADER)
                .send()
                .await
                .map_err(|e| {
                    LinkcalError::Network(format!("Microsoft Calendar fetch failed: {e}"))
                })?;

            if !response.status().is_success() {
                return Err(fetch_error(response).await);
            }

            let page: MicrosoftEventsResponse =
                response.json().await.map_err(InfraError::from).map_err(LinkcalError::from)?;

            events.extend(page.value);

            next_link = page.next_link;
            if next_link.is_none() {
                break;
            }
        }

        let before = events.len();
        events.retain(|event| {
            !event
                .subject
                .as_deref()
                .is_some_and(|s| s.to_lowercase().contains(&self.timeblock_marker))
        });
        debug!(fetched = before, kept = events.len(), "fetched Microsoft events");

        Ok(events.into_iter().map(normalize_event).collect())
    }

    async fn refresh_token(&self, refresh_token: &str) -> Result<RefreshedTokens> {
        let response = self
            .client
            .post(&self.endpoints.token_url)
            .form(&[
                ("client_id", self.endpoints.client_id.as_str()),
                ("client_secret", self.endpoints.client_secret.as_str()),
                ("refresh_token", refresh_token),
                ("grant_type", "refresh_token"),
                ("scope", "Calendars.ReadWrite offline_access"),
            ])
            .send()
            .await
            .map_err(|e| LinkcalError::Auth(format!("Microsoft token refresh failed: {e}")))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_else(|_| "unknown error".to_string());
            return Err(LinkcalError::Auth(format!(
                "Microsoft token refresh failed ({status}): {body}"
            )));
        }

        let tokens: TokenResponse = response
            .json()
            .await
            .map_err(|e| LinkcalError::Auth(format!("failed to parse token response: {e}")))?;

        Ok(RefreshedTokens {
            access_token: tokens.access_token,
            refresh_token: tokens.refresh_token,
        })
    }

    async fn timeblock_exists(
        &self,
        access_token: &str,
        title: &str,
        start: DateTime<Utc>,
        _end: DateTime<Utc>,
    ) -> Result<bool> {
        let filter = format!(
            "subject eq '{}' and start/dateTime ge '{}'",
            title.replace('\'', "''"),
            start.to_rfc3339()
        );

        let response = self
            .client
            .get(self.events_url())
            .bearer_auth(access_token)
            .query(&[("$filter", filter), ("$top", "1".to_string())])
            .send()
            .await
            .map_err(|e| {
                LinkcalError::Network(format!("Microsoft timeblock lookup failed: {e}"))
            })?;

        if !response.status().is_success() {
            return Err(fetch_error(response).await);
        }

        let page: MicrosoftEventsResponse =
            response.json().await.map_err(InfraError::from).map_err(LinkcalError::from)?;
        Ok(!page.value.is_empty())
    }

    async fn create_timeblock(&self, access_token: &str, draft: &TimeblockDraft) -> Result<()> {
        let body = json!({
            "subject": draft.title,
            "body": { "contentType": "text", "content": draft.body },
            "start": { "dateTime": draft.start.to_rfc3339(), "timeZone": "UTC" },
            "end": { "dateTime": draft.end.to_rfc3339(), "timeZone": "UTC" },
            "isAllDay": false,
            "showAs": "free",
        });

        let response = self
            .client
            .post(self.events_url())
            .bearer_auth(access_token)
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                LinkcalError::Network(format!("Microsoft timeblock create failed: {e}"))
            })?;

        if !response.status().is_success() {
            return Err(fetch_error(response).await);
        }
        Ok(())
    }

    async fn delete_timeblocks(&self, access_token: &str) -> Result<usize> {
        let mut deleted = 0usize;
        let mut next_link: Option<String> = None;

        loop {
            let request = match next_link {
                Some(ref link) => self.client.get(link),
                None => self.client.get(self.events_url()).query(&[
                    ("$filter", format!("contains(subject, '{LINKCAL_MARKER}')")),
                    ("$top", "100".to_string()),
                ]),
            };

            let response = request.bearer_auth(access_token).send().await.map_err(|e| {
                LinkcalError::Network(format!("Microsoft Calendar fetch failed: {e}"))
            })?;

            if !response.status().is_success() {
                return Err(fetch_error(response).await);
            }

            let page: MicrosoftEventsResponse =
                response.json().await.map_err(InfraError::from).map_err(LinkcalError::from)?;

            for event in &page.value {
                let is_placeholder = event
                    .subject
                    .as_deref()
                    .is_some_and(|s| s.to_lowercase().contains(LINKCAL_MARKER));
                if !is_placeholder {
                    continue;
                }

                let url = format!("{}/{}", self.events_url(), event.id);
                match self.client.delete(&url).bearer_auth(access_token).send().await {
                    Ok(response) if response.status().is_success() => deleted += 1,
                    Ok(response) => warn!(
                        event_id = %event.id,
                        status = %response.status(),
                        "failed to delete Microsoft placeholder event"
                    ),
                    Err(err) => warn!(
                        event_id = %event.id,
                        error = %err,
                        "failed to delete Microsoft placeholder event"
                    ),
                }
            }

            next_link = page.next_link;
            if next_link.is_none() {
                break;
            }
        }

        debug!(deleted, "removed Microsoft placeholder events");
        Ok(deleted)
    }
}

async fn fetch_error(response: reqwest::Response) -> LinkcalError {
    let status = response.status();
    let body = response.text().await.unwrap_or_else(|_| "unknown error".to_string());
    if status == reqwest::StatusCode::UNAUTHORIZED || status == reqwest::StatusCode::FORBIDDEN {
        LinkcalError::Auth(format!("Microsoft API error ({status}): {body}"))
    } else {
        LinkcalError::Network(format!("Microsoft API error ({status}): {body}"))
    }
}

fn normalize_event(event: MicrosoftCalendarEvent) -> NormalizedMeeting {
    let join_url = event.online_meeting.and_then(|m| m.join_url);

    NormalizedMeeting {
        external_event_id: event.id,
        provider: Provider::Microsoft,
        name: non_empty_or(event.subject, NO_TITLE),
        start_date: event.start.map(|t| utc_timestamp(&t)).unwrap_or_default(),
        end_date: event.end.map(|t| utc_timestamp(&t)).unwrap_or_default(),
        attendees: event
            .attendees
            .unwrap_or_default()
            .into_iter()
            .map(|attendee| attendee.email_address.address)
            .collect(),
        location: event
            .location
            .and_then(|l| l.display_name)
            .filter(|s| !s.trim().is_empty())
            .or_else(|| join_url.clone())
            .unwrap_or_else(|| NO_LOCATION.to_string()),
        link: join_url.unwrap_or_else(|| NO_LINK.to_string()),
        message: non_empty_or(event.body_preview, NO_DESCRIPTION),
        status: event
            .show_as
            .filter(|s| !s.trim().is_empty())
            .or_else(|| event.response_status.and_then(|r| r.response))
            .unwrap_or_else(|| "unknown".to_string()),
    }
}

/// Graph returns wall-clock timestamps without a zone marker when the
/// `outlook.timezone` preference is set; append the zero-offset marker unless
/// one is already present.
fn utc_timestamp(value: &EventDateTime) -> String {
    let trimmed = value.date_time.trim();
    let has_explicit_zone = trimmed.ends_with('Z')
        || trimmed
            .rfind('T')
            .is_some_and(|idx| trimmed[idx + 1..].chars().any(|c| matches!(c, '+' | '-')));

    if has_explicit_zone {
        trimmed.to_string()
    } else {
        format!("{trimmed}Z")
    }
}

fn non_empty_or(value: Option<String>, default: &str) -> String {
    match value {
        Some(v) if !v.trim().is_empty() => v,
        _ => default.to_string(),
    }
}

#[derive(Debug, Deserialize)]
struct MicrosoftEventsResponse {
    #[serde(default)]
    value: Vec<MicrosoftCalendarEvent>,
    #[serde(rename = "@odata.nextLink")]
    next_link: Option<String>,
}

#[derive(Debug, Deserialize)]
struct MicrosoftCalendarEvent {
    id: String,
    subject: Option<String>,
    #[serde(rename = "bodyPreview")]
    body_preview: Option<String>,
    start: Option<EventDateTime>,
    end: Option<EventDateTime>,
    location: Option<Location>,
    #[serde(rename = "onlineMeeting")]
    online_meeting: Option<OnlineMeeting>,
    attendees: Option<Vec<MicrosoftAttendee>>,
    #[serde(rename = "showAs")]
    show_as: Option<String>,
    #[serde(rename = "responseStatus")]
    response_status: Option<ResponseStatus>,
}

#[derive(Debug, Deserialize)]
struct EventDateTime {
    #[serde(rename = "dateTime")]
    date_time: String,
}

#[derive(Debug, Deserialize)]
struct Location {
    #[serde(rename = "displayName")]
    display_name: Option<String>,
}

#[derive(Debug, Deserialize)]
struct OnlineMeeting {
    #[serde(rename = "joinUrl")]
    join_url: Option<String>,
}

#[derive(Debug, Deserialize)]
struct MicrosoftAttendee {
    #[serde(rename = "emailAddress")]
    email_address: EmailAddress,
}

#[derive(Debug, Deserialize)]
struct EmailAddress {
    address: String,
}

#[derive(Debug, Deserialize)]
struct ResponseStatus {
    response: Option<String>,
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    refresh_token: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn appends_utc_marker_when_zone_missing() {
        let value = EventDateTime { date_time: "2024-01-01T09:00:00.0000000".into() };
        assert_eq!(utc_timestamp(&value), "2024-01-01T09:00:00.0000000Z");
    }

    #[test]
    fn keeps_explicit_zone_untouched() {
        let zulu = EventDateTime { date_time: "2024-01-01T09:00:00Z".into() };
        assert_eq!(utc_timestamp(&zulu), "2024-01-01T09:00:00Z");

        let offset = EventDateTime { date_time: "2024-01-01T09:00:00+02:00".into() };
        assert_eq!(utc_timestamp(&offset), "2024-01-01T09:00:00+02:00");
    }

    #[test]
    fn join_url_fills_location_and_link() {
        let event = MicrosoftCalendarEvent {
            id: "ev".into(),
            subject: Some("Planning".into()),
            body_preview: None,
            start: Some(EventDateTime { date_time: "2024-01-01T09:00:00".into() }),
            end: Some(EventDateTime { date_time: "2024-01-01T10:00:00".into() }),
            location: None,
            online_meeting: Some(OnlineMeeting {
                join_url: Some("https://teams.example/join".into()),
            }),
            attendees: None,
            show_as: Some("busy".into()),
            response_status: None,
        };
        let meeting = normalize_event(event);
        assert_eq!(meeting.location, "https://teams.example/join");
        assert_eq!(meeting.link, "https://teams.example/join");
        assert_eq!(meeting.status, "busy");
        assert_eq!(meeting.start_date, "2024-01-01T09:00:00Z");
    }
}
