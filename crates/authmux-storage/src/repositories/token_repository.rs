//! SQLite implementation of TokenRepository.
//!
//! Rotation safety hangs on one statement: `UPDATE ... SET used_at = ?
//! WHERE used_at IS NULL`. The rows-affected count is the arbiter when two
//! presentations of the same refresh token race — exactly one caller sees 1.

use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rusqlite::{params, OptionalExtension};
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use authmux_core::{
    MarkUsedOutcome, RepoResult, TokenRecord, TokenRepository, TokenType, UserProfile,
};

use super::user_profile_repository::SqliteUserProfileRepository;
use super::{fmt_ts, optional_ts_column, ts_column};
use crate::Database;

pub struct SqliteTokenRepository {
    db: Arc<Mutex<Database>>,
}

impl SqliteTokenRepository {
    pub fn new(db: Arc<Mutex<Database>>) -> Self {
        Self { db }
    }

    const TOKEN_COLUMNS: &'static str =
        "token, token_type, user_id, client_id, scope, resource, expires_at,
         user_profile_id, family_id, generation, used_at, created_at";

    fn map_row(row: &rusqlite::Row) -> rusqlite::Result<TokenRecord> {
        let token_type: String = row.get(1)?;
        let expires_at: String = row.get(6)?;
        let used_at: Option<String> = row.get(10)?;
        let created_at: String = row.get(11)?;

        Ok(TokenRecord {
            token: row.get(0)?,
            token_type: TokenType::parse(&token_type).ok_or_else(|| {
                rusqlite::Error::FromSqlConversionFailure(
                    1,
                    rusqlite::types::Type::Text,
                    format!("unknown token type: {}", token_type).into(),
                )
            })?,
            user_id: row.get(2)?,
            client_id: row.get(3)?,
            scope: row.get(4)?,
            resource: row.get(5)?,
            expires_at: ts_column(6, &expires_at)?,
            user_profile_id: row.get(7)?,
            family_id: row.get(8)?,
            generation: row.get(9)?,
            used_at: optional_ts_column(10, used_at)?,
            created_at: ts_column(11, &created_at)?,
        })
    }
}

#[async_trait]
impl TokenRepository for SqliteTokenRepository {
    async fn store_token(&self, record: &TokenRecord) -> RepoResult<()> {
        let db = self.db.lock().await;
        let conn = db.connection();

        conn.execute(
            "INSERT INTO tokens (
                token, token_type, user_id, client_id, scope, resource, expires_at,
                user_profile_id, family_id, generation, used_at, created_at
             )
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)",
            params![
                record.token,
                record.token_type.as_str(),
                record.user_id,
                record.client_id,
                record.scope,
                record.resource,
                fmt_ts(record.expires_at),
                record.user_profile_id,
                record.family_id,
                record.generation,
                record.used_at.map(fmt_ts),
                fmt_ts(record.created_at),
            ],
        )?;
        debug!(
            "[OAuth] Stored {} token (family {}, gen {})",
            record.token_type.as_str(),
            record.family_id,
            record.generation
        );
        Ok(())
    }

    async fn get_token(&self, token: &str) -> RepoResult<Option<TokenRecord>> {
        let db = self.db.lock().await;
        let conn = db.connection();

        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM tokens WHERE token = ?1",
            Self::TOKEN_COLUMNS
        ))?;

        Ok(stmt.query_row(params![token], Self::map_row).optional()?)
    }

    async fn get_access_token_with_profile(
        &self,
        token: &str,
    ) -> RepoResult<Option<(TokenRecord, Option<UserProfile>)>> {
        let db = self.db.lock().await;
        let conn = db.connection();

        // LEFT JOIN: a token whose profile row is gone still validates,
        // just without identity context.
        let mut stmt = conn.prepare(
            "SELECT t.token, t.token_type, t.user_id, t.client_id, t.scope, t.resource,
                    t.expires_at, t.user_profile_id, t.family_id, t.generation, t.used_at,
                    t.created_at,
                    p.id, p.provider, p.provider_user_id, p.username, p.email,
                    p.display_name, p.avatar_url, p.raw, p.access_token, p.refresh_token,
                    p.created_at, p.updated_at
             FROM tokens t
             LEFT JOIN user_profiles p ON p.id = t.user_profile_id
             WHERE t.token = ?1 AND t.token_type = 'access'",
        )?;

        let result = stmt
            .query_row(params![token], |row| {
                let record = Self::map_row(row)?;
                let profile_id: Option<String> = row.get(12)?;
                let profile = match profile_id {
                    Some(_) => Some(SqliteUserProfileRepository::map_row_offset(row, 12)?),
                    None => None,
                };
                Ok((record, profile))
            })
            .optional()?;

        Ok(result)
    }

    async fn delete_token(&self, token: &str) -> RepoResult<bool> {
        let db = self.db.lock().await;
        let conn = db.connection();

        let rows = conn.execute("DELETE FROM tokens WHERE token = ?1", params![token])?;
        Ok(rows > 0)
    }

    async fn mark_refresh_token_used(
        &self,
        token: &str,
        now: DateTime<Utc>,
    ) -> RepoResult<MarkUsedOutcome> {
        let db = self.db.lock().await;
        let conn = db.connection();

        let rows = conn.execute(
            "UPDATE tokens SET used_at = ?2
             WHERE token = ?1 AND token_type = 'refresh' AND used_at IS NULL",
            params![token, fmt_ts(now)],
        )?;

        if rows > 0 {
            return Ok(MarkUsedOutcome::Marked);
        }

        // Zero rows: either the row never existed or used_at is already set
        let exists: Option<bool> = conn
            .query_row(
                "SELECT used_at IS NOT NULL FROM tokens
                 WHERE token = ?1 AND token_type = 'refresh'",
                params![token],
                |row| row.get(0),
            )
            .optional()?;

        match exists {
            Some(true) => {
                warn!("[OAuth] Refresh token presented a second time");
                Ok(MarkUsedOutcome::AlreadyUsed)
            }
            // A live row the UPDATE missed cannot happen under one
            // connection; treat it as not-found rather than guessing.
            Some(false) | None => Ok(MarkUsedOutcome::NotFound),
        }
    }

    async fn is_refresh_token_used(&self, token: &str) -> RepoResult<Option<bool>> {
        let db = self.db.lock().await;
        let conn = db.connection();

        Ok(conn
            .query_row(
                "SELECT used_at IS NOT NULL FROM tokens
                 WHERE token = ?1 AND token_type = 'refresh'",
                params![token],
                |row| row.get(0),
            )
            .optional()?)
    }

    async fn revoke_family(&self, family_id: &str) -> RepoResult<Vec<TokenRecord>> {
        let db = self.db.lock().await;
        let conn = db.connection();

        let mut stmt = conn.prepare(&format!(
            "DELETE FROM tokens WHERE family_id = ?1 RETURNING {}",
            Self::TOKEN_COLUMNS
        ))?;

        let revoked: Vec<TokenRecord> = stmt
            .query_map(params![family_id], Self::map_row)?
            .collect::<Result<_, _>>()?;

        if !revoked.is_empty() {
            info!(
                "[OAuth] Revoked token family {} ({} tokens)",
                family_id,
                revoked.len()
            );
        }
        Ok(revoked)
    }

    async fn revoke_client_tokens(&self, client_id: &str) -> RepoResult<usize> {
        let db = self.db.lock().await;
        let conn = db.connection();

        let deleted = conn.execute(
            "DELETE FROM tokens WHERE client_id = ?1",
            params![client_id],
        )?;
        if deleted > 0 {
            info!("[OAuth] Revoked {} tokens for client {}", deleted, client_id);
        }
        Ok(deleted)
    }

    async fn cleanup_expired(&self, cutoff: DateTime<Utc>) -> RepoResult<usize> {
        let db = self.db.lock().await;
        let conn = db.connection();

        let deleted = conn.execute(
            "DELETE FROM tokens WHERE expires_at <= ?1",
            params![fmt_ts(cutoff)],
        )?;
        if deleted > 0 {
            info!("[OAuth] Cleaned up {} expired tokens", deleted);
        }
        Ok(deleted)
    }
}
