//! OAuth token manager.
//!
//! Exchanges a linked account's long-lived refresh token for a fresh access
//! token and persists the (possibly rotated) refresh token back to the store
//! before returning, so a later attempt always starts from the freshest
//! token even if the caller crashes after this point.

use std::sync::Arc;

use linkcal_core::MeetingStore;
use linkcal_domain::{LinkedAccount, Result};
use tracing::{debug, instrument};

use super::providers::CalendarProvider;

pub struct TokenManager {
    store: Arc<dyn MeetingStore>,
}

impl TokenManager {
    pub fn new(store: Arc<dyn MeetingStore>) -> Self {
        Self { store }
    }

    /// Refresh the account's access token and persist the refresh token.
    ///
    /// Providers that do not rotate refresh tokens return none; the stored
    /// token is then re-persisted unchanged. Failure is fatal for the current
    /// sync attempt and surfaces as `LinkcalError::Auth`.
    #[instrument(skip_all, fields(account_id = %account.id, provider = %account.provider))]
    pub async fn refresh_and_persist(
        &self,
        account: &LinkedAccount,
        provider: &dyn CalendarProvider,
    ) -> Result<String> {
        let tokens = provider.refresh_token(&account.refresh_token).await?;

        let rotated = tokens.refresh_token.is_some();
        let next_refresh =
            tokens.refresh_token.unwrap_or_else(|| account.refresh_token.clone());
        self.store.update_refresh_token(&account.id, &next_refresh).await?;

        debug!(rotated, "access token refreshed");
        Ok(tokens.access_token)
    }
}
