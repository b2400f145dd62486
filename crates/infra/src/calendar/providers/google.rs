//! Google Calendar provider implementation.

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
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

/// Google Calendar adapter. Recurring events are expanded server-side
/// (`singleEvents=true`) and the engine's own placeholders are dropped before
/// normalization.
pub struct GoogleCalendarProvider {
    client: Client,
    endpoints: ProviderEndpoints,
    timeblock_marker: String,
}

impl GoogleCalendarProvider {
    pub fn new(endpoints: ProviderEndpoints, timeblock_marker: String) -> Self {
        Self { client: Client::new(), endpoints, timeblock_marker: timeblock_marker.to_lowercase() }
    }

    fn events_url(&self) -> String {
        format!("{}/calendars/primary/events", self.endpoints.api_base)
    }
}

#[async_trait]
impl CalendarProvider for GoogleCalendarProvider {
    fn provider(&self) -> Provider {
        Provider::Google
    }

    async fn fetch_events(
        &self,
        access_token: &str,
        window: &FetchWindow,
    ) -> Result<Vec<NormalizedMeeting>> {
        let mut events = Vec::new();
        let mut page_token: Option<String> = None;

        loop {
            let mut params = vec![
                ("singleEvents", "true".to_string()),
                ("timeMin", window.time_min.to_rfc3339()),
                ("timeMax", window.time_max.to_rfc3339()),
                ("timeZone", "UTC".to_string()),
                (
                    "fields",
                    "items(id,status,summary,start,end,attendees,location,hangoutLink,\
                     description),nextPageToken"
                        .to_string(),
                ),
            ];
            if let Some(ref token) = page_token {
                params.push(("pageToken", token.clone()));
            }

            let response = self
                .client
                .get(self.events_url())
                .bearer_auth(access_token)
                .query(&params)
                .send()
                .await
                .map_err(|e| {
                    LinkcalError::Network(format!("Google Calendar fetch failed: {e}"))
                })?;

            if !response.status().is_success() {
                return Err(fetch_error("Google", response).await);
            }

            let page: GoogleEventsResponse =
                response.json().await.map_err(InfraError::from).map_err(LinkcalError::from)?;

            events.extend(page.items);

            page_token = page.next_page_token;
            if page_token.is_none() {
                break;
            }
        }

        let before = events.len();
        events.retain(|event| {
            !event
                .summary
                .as_deref()
                .is_some_and(|s| s.to_lowercase().contains(&self.timeblock_marker))
        });
        debug!(fetched = before, kept = events.len(), "fetched Google events");

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
            ])
            .send()
            .await
            .map_err(|e| LinkcalError::Auth(format!("Google token refresh failed: {e}")))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_else(|_| "unknown error".to_string());
            return Err(LinkcalError::Auth(format!(
                "Google token refresh failed ({status}): {body}"
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
        end: DateTime<Utc>,
    ) -> Result<bool> {
        let response = self
            .client
            .get(self.events_url())
            .bearer_auth(access_token)
            .query(&[
                ("q", title.to_string()),
                ("timeMin", start.to_rfc3339()),
                ("timeMax", (end + Duration::days(1)).to_rfc3339()),
                ("singleEvents", "true".to_string()),
            ])
            .send()
            .await
            .map_err(|e| LinkcalError::Network(format!("Google timeblock lookup failed: {e}")))?;

        if !response.status().is_success() {
            return Err(fetch_error("Google", response).await);
        }

        let page: GoogleEventsResponse =
            response.json().await.map_err(InfraError::from).map_err(LinkcalError::from)?;
        Ok(!page.items.is_empty())
    }

    async fn create_timeblock(&self, access_token: &str, draft: &TimeblockDraft) -> Result<()> {
        let body = json!({
            "summary": draft.title,
            "description": draft.body,
            "start": { "dateTime": draft.start.to_rfc3339(), "timeZone": "UTC" },
            "end": { "dateTime": draft.end.to_rfc3339(), "timeZone": "UTC" },
            "transparency": "transparent",
            "visibility": "private",
        });

        let response = self
            .client
            .post(self.events_url())
            .bearer_auth(access_token)
            .json(&body)
            .send()
            .await
            .map_err(|e| LinkcalError::Network(format!("Google timeblock create failed: {e}")))?;

        if !response.status().is_success() {
            return Err(fetch_error("Google", response).await);
        }
        Ok(())
    }

    async fn delete_timeblocks(&self, access_token: &str) -> Result<usize> {
        let mut deleted = 0usize;
        let mut page_token: Option<String> = None;

        loop {
            let mut params = vec![
                ("q", LINKCAL_MARKER.to_string()),
                ("maxResults", "2500".to_string()),
                ("showDeleted", "false".to_string()),
                ("singleEvents", "true".to_string()),
                ("orderBy", "startTime".to_string()),
            ];
            if let Some(ref token) = page_token {
                params.push(("pageToken", token.clone()));
            }

            let response = self
                .client
                .get(self.events_url())
                .bearer_auth(access_token)
                .query(&params)
                .send()
                .await
                .map_err(|e| {
                    LinkcalError::Network(format!("Google Calendar fetch failed: {e}"))
                })?;

            if !response.status().is_success() {
                return Err(fetch_error("Google", response).await);
            }

            let page: GoogleEventsResponse =
                response.json().await.map_err(InfraError::from).map_err(LinkcalError::from)?;

            for event in &page.items {
                // The q search also matches descriptions; re-check the title.
                let is_placeholder = event
                    .summary
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
                        "failed to delete Google placeholder event"
                    ),
                    Err(err) => warn!(
                        event_id = %event.id,
                        error = %err,
                        "failed to delete Google placeholder event"
                    ),
                }
            }

            page_token = page.next_page_token;
            if page_token.is_none() {
                break;
            }
        }

        debug!(deleted, "removed Google placeholder events");
        Ok(deleted)
    }
}

async fn fetch_error(provider: &str, response: reqwest::Response) -> LinkcalError {
    let status = response.status();
    let body = response.text().await.unwrap_or_else(|_| "unknown error".to_string());
    if status == reqwest::StatusCode::UNAUTHORIZED || status == reqwest::StatusCode::FORBIDDEN {
        LinkcalError::Auth(format!("{provider} API error ({status}): {body}"))
    } else {
        LinkcalError::Network(format!("{provider} API error ({status}): {body}"))
    }
}

fn normalize_event(event: GoogleCalendarEvent) -> NormalizedMeeting {
    let start = event.start.and_then(|t| t.date_time.or(t.date)).unwrap_or_default();
    let end = event.end.and_then(|t| t.date_time.or(t.date)).unwrap_or_default();

    NormalizedMeeting {
        external_event_id: event.id,
        provider: Provider::Google,
        name: non_empty_or(event.summary, NO_TITLE),
        start_date: start,
        end_date: end,
        attendees: event
            .attendees
            .unwrap_or_default()
            .into_iter()
            .map(|attendee| attendee.email)
            .collect(),
        location: non_empty_or(event.location, NO_LOCATION),
        link: non_empty_or(event.hangout_link, NO_LINK),
        message: non_empty_or(event.description, NO_DESCRIPTION),
        status: non_empty_or(event.status, "confirmed"),
    }
}

fn non_empty_or(value: Option<String>, default: &str) -> String {
    match value {
        Some(v) if !v.trim().is_empty() => v,
        _ => default.to_string(),
    }
}

#[derive(Debug, Deserialize)]
struct GoogleEventsResponse {
    #[serde(default)]
    items: Vec<GoogleCalendarEvent>,
    #[serde(rename = "nextPageToken")]
    next_page_token: Option<String>,
}

#[derive(Debug, Deserialize)]
struct GoogleCalendarEvent {
    id: String,
    status: Option<String>,
    summary: Option<String>,
    description: Option<String>,
    location: Option<String>,
    #[serde(rename = "hangoutLink")]
    hangout_link: Option<String>,
    start: Option<EventDateTime>,
    end: Option<EventDateTime>,
    attendees: Option<Vec<GoogleAttendee>>,
}

#[derive(Debug, Deserialize)]
struct EventDateTime {
    #[serde(rename = "dateTime")]
    date_time: Option<String>,
    date: Option<String>,
}

#[derive(Debug, Deserialize)]
struct GoogleAttendee {
    email: String,
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    refresh_token: Option<String>,
}
