//! Provider configuration loader.
//!
//! Credentials come from environment variables; API and token endpoints
//! default to the real provider hosts and are overridable so tests can point
//! adapters at a local mock server.
//!
//! ## Environment variables
//! - `GOOGLE_CALENDAR_CLIENT_ID` / `GOOGLE_CALENDAR_CLIENT_SECRET`
//! - `MICROSOFT_CALENDAR_CLIENT_ID` / `MICROSOFT_CALENDAR_CLIENT_SECRET`
//! - `LINKCAL_TIMEBLOCK_NAME`: marker used for provider-level filtering of
//!   the engine's own placeholder events (optional)

use linkcal_domain::{LinkcalError, Result};

const GOOGLE_TOKEN_URL: &str = "https://oauth2.googleapis.com/token";
const GOOGLE_API_BASE: &str = "https://www.googleapis.com/calendar/v3";
const MICROSOFT_TOKEN_URL: &str = "https://login.microsoftonline.com/common/oauth2/v2.0/token";
const MICROSOFT_API_BASE: &str = "https://graph.microsoft.com/v1.0";

/// Default marker matched (case-insensitively) against event titles at the
/// provider filter layer.
const DEFAULT_TIMEBLOCK_MARKER: &str = "linkcal timeblock";

/// OAuth client credentials plus the endpoints one provider adapter talks to.
#[derive(Debug, Clone)]
pub struct ProviderEndpoints {
    pub client_id: String,
    pub client_secret: String,
    pub token_url: String,
    pub api_base: String,
}

/// Full adapter configuration for both providers.
#[derive(Debug, Clone)]
pub struct CalendarConfig {
    pub google: ProviderEndpoints,
    pub microsoft: ProviderEndpoints,
    pub timeblock_marker: String,
}

impl CalendarConfig {
    /// Load configuration from the environment.
    ///
    /// # Errors
    /// Returns `LinkcalError::Config` when a client id/secret variable is
    /// missing.
    pub fn from_env() -> Result<Self> {
        Ok(Self {
            google: ProviderEndpoints {
                client_id: require_env("GOOGLE_CALENDAR_CLIENT_ID")?,
                client_secret: require_env("GOOGLE_CALENDAR_CLIENT_SECRET")?,
                token_url: GOOGLE_TOKEN_URL.to_string(),
                api_base: GOOGLE_API_BASE.to_string(),
            },
            microsoft: ProviderEndpoints {
                client_id: require_env("MICROSOFT_CALENDAR_CLIENT_ID")?,
                client_secret: require_env("MICROSOFT_CALENDAR_CLIENT_SECRET")?,
                token_url: MICROSOFT_TOKEN_URL.to_string(),
                api_base: MICROSOFT_API_BASE.to_string(),
            },
            timeblock_marker: std::env::var("LINKCAL_TIMEBLOCK_NAME")
                .unwrap_or_else(|_| DEFAULT_TIMEBLOCK_MARKER.to_string()),
        })
    }
}

fn require_env(name: &str) -> Result<String> {
    std::env::var(name).map_err(|_| LinkcalError::Config(format!("{name} not set")))
}
