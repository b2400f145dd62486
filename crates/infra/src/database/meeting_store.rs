//! SQLite implementation of the `MeetingStore` port.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use linkcal_core::MeetingStore;
use linkcal_domain::{
    LinkcalError, LinkedAccount, Meeting, MeetingFields, NewMeeting, Provider, Result,
};
use rusqlite::types::Type;
use rusqlite::{Row, ToSql};
use tracing::debug;
use uuid::Uuid;

use super::pool::SqlitePool;
use crate::errors::InfraError;

const ACCOUNT_COLUMNS: &str = "id, user_id, provider, email, display_name, color, refresh_token, \
                               last_synced, webhook_channel_id, webhook_resource_id, \
                               webhook_expiration";

const MEETING_COLUMNS: &str = "id, user_id, linked_account_id, external_event_id, provider, name, \
                               start_date, end_date, attendees, location, link, message, status, \
                               created_at, updated_at";

/// SQLite-backed meeting store.
pub struct SqliteMeetingStore {
    pool: SqlitePool,
}

impl SqliteMeetingStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl MeetingStore for SqliteMeetingStore {
    async fn get_linked_account(&self, account_id: &str) -> Result<LinkedAccount> {
        let conn = self.pool.get()?;
        conn.query_row(
            &format!("SELECT {ACCOUNT_COLUMNS} FROM linked_accounts WHERE id = ?1"),
            [account_id],
            map_account_row,
        )
        .map_err(|e| match e {
            rusqlite::Error::QueryReturnedNoRows => {
                LinkcalError::NotFound(format!("linked account not found: {account_id}"))
            }
            other => InfraError::from(other).into(),
        })
    }

    async fn list_linked_accounts(&self, user_id: &str) -> Result<Vec<LinkedAccount>> {
        let conn = self.pool.get()?;
        let mut stmt = conn
            .prepare(&format!(
                "SELECT {ACCOUNT_COLUMNS} FROM linked_accounts
                 WHERE user_id = ?1 ORDER BY created_at"
            ))
            .map_err(InfraError::from)
            .map_err(LinkcalError::from)?;

        let rows = stmt
            .query_map([user_id], map_account_row)
            .map_err(InfraError::from)
            .map_err(LinkcalError::from)?;

        rows.collect::<rusqlite::Result<Vec<_>>>()
            .map_err(InfraError::from)
            .map_err(LinkcalError::from)
    }

    async fn find_account_by_channel(&self, channel_id: &str) -> Result<Option<LinkedAccount>> {
        let conn = self.pool.get()?;
        let result = conn.query_row(
            &format!("SELECT {ACCOUNT_COLUMNS} FROM linked_accounts WHERE webhook_channel_id = ?1"),
            [channel_id],
            map_account_row,
        );

        match result {
            Ok(account) => Ok(Some(account)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(other) => Err(InfraError::from(other).into()),
        }
    }

    async fn insert_linked_account(&self, account: &LinkedAccount) -> Result<()> {
        let conn = self.pool.get()?;
        conn.execute(
            "INSERT INTO linked_accounts (
                id, user_id, provider, email, display_name, color, refresh_token,
                last_synced, webhook_channel_id, webhook_resource_id, webhook_expiration,
                created_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)",
            [
                &account.id as &dyn ToSql,
                &account.user_id,
                &account.provider.as_str(),
                &account.email,
                &account.display_name,
                &account.color,
                &account.refresh_token,
                &account.last_synced.map(|t| t.to_rfc3339()),
                &account.webhook_channel_id,
                &account.webhook_resource_id,
                &account.webhook_expiration.map(|t| t.to_rfc3339()),
                &Utc::now().to_rfc3339(),
            ]
            .as_ref(),
        )
        .map_err(InfraError::from)
        .map_err(LinkcalError::from)?;
        Ok(())
    }

    async fn delete_linked_account(&self, account_id: &str) -> Result<()> {
        let conn = self.pool.get()?;
        // Meetings cascade via the foreign key.
        conn.execute("DELETE FROM linked_accounts WHERE id = ?1", [account_id])
            .map_err(InfraError::from)
            .map_err(LinkcalError::from)?;
        Ok(())
    }

    async fn list_meetings(&self, linked_account_id: &str) -> Result<Vec<Meeting>> {
        let conn = self.pool.get()?;
        let mut stmt = conn
            .prepare(&format!(
                "SELECT {MEETING_COLUMNS} FROM meetings
                 WHERE linked_account_id = ?1 ORDER BY start_date"
            ))
            .map_err(InfraError::from)
            .map_err(LinkcalError::from)?;

        let rows = stmt
            .query_map([linked_account_id], map_meeting_row)
            .map_err(InfraError::from)
            .map_err(LinkcalError::from)?;

        rows.collect::<rusqlite::Result<Vec<_>>>()
            .map_err(InfraError::from)
            .map_err(LinkcalError::from)
    }

    async fn insert_meetings(&self, rows: &[NewMeeting]) -> Result<usize> {
        let conn = self.pool.get()?;
        let now = Utc::now().to_rfc3339();
        let mut written = 0usize;

        for row in rows {
            let attendees = serde_json::to_string(&row.fields.attendees)
                .map_err(InfraError::from)
                .map_err(LinkcalError::from)?;

            // UPSERT: a conflict on the uniqueness key degrades to an update
            // instead of failing the batch.
            conn.execute(
                "INSERT INTO meetings (
                    id, user_id, linked_account_id, external_event_id, provider,
                    name, start_date, end_date, attendees, location, link, message,
                    status, created_at, updated_at
                ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15)
                ON CONFLICT(external_event_id, provider, linked_account_id) DO UPDATE SET
                    name = excluded.name,
                    start_date = excluded.start_date,
                    end_date = excluded.end_date,
                    attendees = excluded.attendees,
                    location = excluded.location,
                    link = excluded.link,
                    message = excluded.message,
                    status = excluded.status,
                    updated_at = excluded.updated_at",
                [
                    &Uuid::new_v4().to_string() as &dyn ToSql,
                    &row.user_id,
                    &row.linked_account_id,
                    &row.external_event_id,
                    &row.provider.as_str(),
                    &row.fields.name,
                    &row.fields.start_date,
                    &row.fields.end_date,
                    &attendees,
                    &row.fields.location,
                    &row.fields.link,
                    &row.fields.message,
                    &row.fields.status,
                    &now,
                    &now,
                ]
                .as_ref(),
            )
            .map_err(InfraError::from)
            .map_err(LinkcalError::from)?;
            written += 1;
        }

        debug!(written, "inserted meetings");
        Ok(written)
    }

    async fn update_meeting(
        &self,
        linked_account_id: &str,
        external_event_id: &str,
        fields: &MeetingFields,
    ) -> Result<()> {
        let conn = self.pool.get()?;
        let attendees = serde_json::to_string(&fields.attendees)
            .map_err(InfraError::from)
            .map_err(LinkcalError::from)?;

        let changed = conn
            .execute(
                "UPDATE meetings SET
                    name = ?1, start_date = ?2, end_date = ?3, attendees = ?4,
                    location = ?5, link = ?6, message = ?7, status = ?8, updated_at = ?9
                 WHERE linked_account_id = ?10 AND external_event_id = ?11",
                [
                    &fields.name as &dyn ToSql,
                    &fields.start_date,
                    &fields.end_date,
                    &attendees,
                    &fields.location,
                    &fields.link,
                    &fields.message,
                    &fields.status,
                    &Utc::now().to_rfc3339(),
                    &linked_account_id,
                    &external_event_id,
                ]
                .as_ref(),
            )
            .map_err(InfraError::from)
            .map_err(LinkcalError::from)?;

        if changed == 0 {
            return Err(LinkcalError::NotFound(format!(
                "meeting not found: {external_event_id}"
            )));
        }
        Ok(())
    }

    async fn delete_meetings(
        &self,
        linked_account_id: &str,
        external_event_ids: &[String],
    ) -> Result<usize> {
        if external_event_ids.is_empty() {
            return Ok(0);
        }

        let conn = self.pool.get()?;
        let placeholders =
            (2..=external_event_ids.len() + 1).map(|i| format!("?{i}")).collect::<Vec<_>>();
        let sql = format!(
            "DELETE FROM meetings WHERE linked_account_id = ?1 AND external_event_id IN ({})",
            placeholders.join(", ")
        );

        let mut params: Vec<&dyn ToSql> = Vec::with_capacity(external_event_ids.len() + 1);
        params.push(&linked_account_id);
        for id in external_event_ids {
            params.push(id);
        }

        let deleted = conn
            .execute(&sql, params.as_slice())
            .map_err(InfraError::from)
            .map_err(LinkcalError::from)?;

        debug!(deleted, "deleted meetings");
        Ok(deleted)
    }

    async fn update_last_synced(&self, account_id: &str, at: DateTime<Utc>) -> Result<()> {
        let conn = self.pool.get()?;
        conn.execute(
            "UPDATE linked_accounts SET last_synced = ?1 WHERE id = ?2",
            [&at.to_rfc3339() as &dyn ToSql, &account_id].as_ref(),
        )
        .map_err(InfraError::from)
        .map_err(LinkcalError::from)?;
        Ok(())
    }

    async fn update_refresh_token(&self, account_id: &str, refresh_token: &str) -> Result<()> {
        let conn = self.pool.get()?;
        conn.execute(
            "UPDATE linked_accounts SET refresh_token = ?1 WHERE id = ?2",
            [&refresh_token as &dyn ToSql, &account_id].as_ref(),
        )
        .map_err(InfraError::from)
        .map_err(LinkcalError::from)?;
        Ok(())
    }
}

fn map_account_row(row: &Row<'_>) -> rusqlite::Result<LinkedAccount> {
    Ok(LinkedAccount {
        id: row.get(0)?,
        user_id: row.get(1)?,
        provider: parse_provider(row.get::<_, String>(2)?, 2)?,
        email: row.get(3)?,
        display_name: row.get(4)?,
        color: row.get(5)?,
        refresh_token: row.get(6)?,
        last_synced: parse_optional_timestamp(row.get::<_, Option<String>>(7)?, 7)?,
        webhook_channel_id: row.get(8)?,
        webhook_resource_id: row.get(9)?,
        webhook_expiration: parse_optional_timestamp(row.get::<_, Option<String>>(10)?, 10)?,
    })
}

fn map_meeting_row(row: &Row<'_>) -> rusqlite::Result<Meeting> {
    let attendees: String = row.get(8)?;
    Ok(Meeting {
        id: row.get(0)?,
        user_id: row.get(1)?,
        linked_account_id: row.get(2)?,
        external_event_id: row.get(3)?,
        provider: parse_provider(row.get::<_, String>(4)?, 4)?,
        name: row.get(5)?,
        start_date: row.get(6)?,
        end_date: row.get(7)?,
        attendees: serde_json::from_str(&attendees)
            .map_err(|e| rusqlite::Error::FromSqlConversionFailure(8, Type::Text, Box::new(e)))?,
        location: row.get(9)?,
        link: row.get(10)?,
        message: row.get(11)?,
        status: row.get(12)?,
        created_at: parse_timestamp(row.get::<_, String>(13)?, 13)?,
        updated_at: parse_timestamp(row.get::<_, String>(14)?, 14)?,
    })
}

fn parse_provider(value: String, column: usize) -> rusqlite::Result<Provider> {
    value
        .parse()
        .map_err(|e: LinkcalError| {
            rusqlite::Error::FromSqlConversionFailure(column, Type::Text, Box::new(e))
        })
}

fn parse_timestamp(value: String, column: usize) -> rusqlite::Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(&value)
        .map(|t| t.with_timezone(&Utc))
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(column, Type::Text, Box::new(e)))
}

fn parse_optional_timestamp(
    value: Option<String>,
    column: usize,
) -> rusqlite::Result<Option<DateTime<Utc>>> {
    value.map(|v| parse_timestamp(v, column)).transpose()
}
