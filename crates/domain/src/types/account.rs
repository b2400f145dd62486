//! Linked calendar accounts and provider identification.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::errors::LinkcalError;

/// External calendar provider backing a linked account.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Provider {
    Google,
    Microsoft,
}

impl Provider {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Google => "google",
            Self::Microsoft => "microsoft",
        }
    }
}

impl fmt::Display for Provider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Provider {
    type Err = LinkcalError;

    /// Accepts the legacy `azure-ad` alias still present in older account
    /// rows.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "google" => Ok(Self::Google),
            "microsoft" | "azure-ad" => Ok(Self::Microsoft),
            other => Err(LinkcalError::InvalidInput(format!("unknown provider: {other}"))),
        }
    }
}

/// A user's connection to one external calendar mailbox via OAuth.
///
/// `(user_id, email)` is unique: the same mailbox cannot be linked twice for
/// one user. The refresh token rotates whenever a provider issues a new one.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LinkedAccount {
    pub id: String,
    pub user_id: String,
    pub provider: Provider,
    pub email: String,
    pub display_name: Option<String>,
    /// Presentation-only hex color, e.g. `#FF0000`.
    pub color: Option<String>,
    pub refresh_token: String,
    /// Stamped after every completed sync pass; `None` until first sync.
    pub last_synced: Option<DateTime<Utc>>,
    pub webhook_channel_id: Option<String>,
    /// Provider-assigned resource/subscription id.
    pub webhook_resource_id: Option<String>,
    pub webhook_expiration: Option<DateTime<Utc>>,
}
