//! Meeting representations: the ephemeral normalized shape produced by
//! provider adapters and the persisted row shape.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::account::Provider;

/// Provider-agnostic in-memory representation of one calendar event.
///
/// Produced fresh on every fetch and never persisted directly. Start and end
/// stay ISO 8601 strings because all-day events carry date-only values;
/// validity is checked by the filter stage, and the diff engine compares the
/// strings as-is.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NormalizedMeeting {
    /// Provider-native event id. Unique within one provider's event space
    /// only; always scoped by linked account downstream.
    pub external_event_id: String,
    pub provider: Provider,
    pub name: String,
    pub start_date: String,
    pub end_date: String,
    /// Attendee emails in provider order.
    pub attendees: Vec<String>,
    pub location: String,
    pub link: String,
    pub message: String,
    /// Free-form provider status string (`confirmed`, `busy`, ...).
    pub status: String,
}

/// The comparable/persistable field set shared by fetched and stored
/// meetings. Field-level change detection runs over exactly these fields.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MeetingFields {
    pub name: String,
    pub start_date: String,
    pub end_date: String,
    pub attendees: Vec<String>,
    pub location: String,
    pub link: String,
    pub message: String,
    pub status: String,
}

impl NormalizedMeeting {
    pub fn fields(&self) -> MeetingFields {
        MeetingFields {
            name: self.name.clone(),
            start_date: self.start_date.clone(),
            end_date: self.end_date.clone(),
            attendees: self.attendees.clone(),
            location: self.location.clone(),
            link: self.link.clone(),
            message: self.message.clone(),
            status: self.status.clone(),
        }
    }
}

/// A persisted meeting row, owned by exactly one linked account.
///
/// `(external_event_id, provider, linked_account_id)` is unique, which keeps
/// colliding external ids from different providers apart.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Meeting {
    /// Store-assigned primary key.
    pub id: String,
    pub user_id: String,
    pub linked_account_id: String,
    pub external_event_id: String,
    pub provider: Provider,
    pub name: String,
    pub start_date: String,
    pub end_date: String,
    pub attendees: Vec<String>,
    pub location: String,
    pub link: String,
    pub message: String,
    pub status: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Meeting {
    pub fn fields(&self) -> MeetingFields {
        MeetingFields {
            name: self.name.clone(),
            start_date: self.start_date.clone(),
            end_date: self.end_date.clone(),
            attendees: self.attendees.clone(),
            location: self.location.clone(),
            link: self.link.clone(),
            message: self.message.clone(),
            status: self.status.clone(),
        }
    }
}

/// Insert payload for a meeting not yet present in the store.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewMeeting {
    pub user_id: String,
    pub linked_account_id: String,
    pub external_event_id: String,
    pub provider: Provider,
    pub fields: MeetingFields,
}

impl NewMeeting {
    pub fn from_normalized(
        meeting: &NormalizedMeeting,
        linked_account_id: &str,
        user_id: &str,
    ) -> Self {
        Self {
            user_id: user_id.to_string(),
            linked_account_id: linked_account_id.to_string(),
            external_event_id: meeting.external_event_id.clone(),
            provider: meeting.provider,
            fields: meeting.fields(),
        }
    }
}
