//! SQLite implementation of UserProfileRepository.
//!
//! The upstream token pair is encrypted here, at the write boundary, so no
//! plaintext credential ever reaches a SQL statement. Reads hand back the
//! ciphertext untouched; decryption is an explicit step at a higher layer.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use rusqlite::{params, OptionalExtension};
use tokio::sync::Mutex;
use tracing::debug;
use uuid::Uuid;

use authmux_core::{ExternalProfile, RepoResult, UpstreamTokenPair, UserProfile, UserProfileRepository};

use super::{fmt_ts, ts_column};
use crate::crypto::TokenCipher;
use crate::Database;

pub struct SqliteUserProfileRepository {
    db: Arc<Mutex<Database>>,
    cipher: Arc<TokenCipher>,
}

impl SqliteUserProfileRepository {
    pub fn new(db: Arc<Mutex<Database>>, cipher: Arc<TokenCipher>) -> Self {
        Self { db, cipher }
    }

    const PROFILE_COLUMNS: &'static str =
        "id, provider, provider_user_id, username, email, display_name, avatar_url,
         raw, access_token, refresh_token, created_at, updated_at";

    pub(crate) fn map_row(row: &rusqlite::Row) -> rusqlite::Result<UserProfile> {
        Self::map_row_offset(row, 0)
    }

    /// Map a profile starting at `base` in the row. Lets the token
    /// repository reuse this for its LEFT JOIN read.
    pub(crate) fn map_row_offset(row: &rusqlite::Row, base: usize) -> rusqlite::Result<UserProfile> {
        let raw_json: String = row.get(base + 7)?;
        let created_at: String = row.get(base + 10)?;
        let updated_at: String = row.get(base + 11)?;

        Ok(UserProfile {
            id: row.get(base)?,
            provider: row.get(base + 1)?,
            provider_user_id: row.get(base + 2)?,
            username: row.get(base + 3)?,
            email: row.get(base + 4)?,
            display_name: row.get(base + 5)?,
            avatar_url: row.get(base + 6)?,
            raw: serde_json::from_str(&raw_json).unwrap_or(serde_json::Value::Null),
            access_token: row.get(base + 8)?,
            refresh_token: row.get(base + 9)?,
            created_at: ts_column(base + 10, &created_at)?,
            updated_at: ts_column(base + 11, &updated_at)?,
        })
    }
}

#[async_trait]
impl UserProfileRepository for SqliteUserProfileRepository {
    async fn upsert_profile(
        &self,
        profile: &ExternalProfile,
        tokens: &UpstreamTokenPair,
    ) -> RepoResult<String> {
        let access_ct = self.cipher.encrypt_to_string(&tokens.access_token)?;
        let refresh_ct = self.cipher.encrypt_to_string(&tokens.refresh_token)?;

        let db = self.db.lock().await;
        let conn = db.connection();
        let now = fmt_ts(Utc::now());

        // Single upsert keyed on (provider, provider_user_id); RETURNING
        // hands back the surviving id — the existing one on conflict, the
        // fresh UUID on first insert.
        let id: String = conn.query_row(
            "INSERT INTO user_profiles (
                id, provider, provider_user_id, username, email, display_name,
                avatar_url, raw, access_token, refresh_token, created_at, updated_at
             )
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?11)
             ON CONFLICT(provider, provider_user_id) DO UPDATE SET
                username = excluded.username,
                email = excluded.email,
                display_name = excluded.display_name,
                avatar_url = excluded.avatar_url,
                raw = excluded.raw,
                access_token = excluded.access_token,
                refresh_token = excluded.refresh_token,
                updated_at = excluded.updated_at
             RETURNING id",
            params![
                Uuid::new_v4().to_string(),
                profile.provider,
                profile.provider_user_id,
                profile.username,
                profile.email,
                profile.display_name,
                profile.avatar_url,
                serde_json::to_string(&profile.raw)?,
                access_ct,
                refresh_ct,
                now,
            ],
            |row| row.get(0),
        )?;

        debug!(
            "[OAuth] Upserted profile {} for {}:{}",
            id, profile.provider, profile.provider_user_id
        );
        Ok(id)
    }

    async fn get_profile(&self, id: &str) -> RepoResult<Option<UserProfile>> {
        let db = self.db.lock().await;
        let conn = db.connection();

        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM user_profiles WHERE id = ?1",
            Self::PROFILE_COLUMNS
        ))?;

        Ok(stmt.query_row(params![id], Self::map_row).optional()?)
    }

    async fn update_upstream_tokens(
        &self,
        id: &str,
        access_token: &str,
        refresh_token: Option<&str>,
    ) -> RepoResult<()> {
        let access_ct = self.cipher.encrypt_to_string(access_token)?;
        let refresh_ct = refresh_token
            .map(|rt| self.cipher.encrypt_to_string(rt))
            .transpose()?;

        let db = self.db.lock().await;
        let conn = db.connection();
        let now = fmt_ts(Utc::now());

        // COALESCE keeps the existing refresh ciphertext when the upstream
        // rotated only the access token.
        let rows = conn.execute(
            "UPDATE user_profiles SET
                access_token = ?2,
                refresh_token = COALESCE(?3, refresh_token),
                updated_at = ?4
             WHERE id = ?1",
            params![id, access_ct, refresh_ct, now],
        )?;

        if rows == 0 {
            anyhow::bail!("profile not found: {}", id);
        }
        debug!("[OAuth] Updated upstream tokens for profile {}", id);
        Ok(())
    }
}
