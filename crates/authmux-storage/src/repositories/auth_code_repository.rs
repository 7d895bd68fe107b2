//! SQLite implementation of AuthCodeRepository.
//!
//! Redemption is a single `DELETE ... RETURNING` statement: deletion itself
//! is the single-use guarantee, so two racing exchanges can never both see
//! the code as valid. Expired rows are removed on read and reported as
//! absent — callers cannot tell an expired code from one never issued.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use rusqlite::{params, OptionalExtension};
use tokio::sync::Mutex;
use tracing::{debug, info};

use authmux_core::{AuthCodeRepository, AuthorizationCode, RepoResult};

use super::{fmt_ts, ts_column};
use crate::Database;

pub struct SqliteAuthCodeRepository {
    db: Arc<Mutex<Database>>,
}

impl SqliteAuthCodeRepository {
    pub fn new(db: Arc<Mutex<Database>>) -> Self {
        Self { db }
    }

    const CODE_COLUMNS: &'static str =
        "code, user_id, client_id, redirect_uri, code_challenge, code_challenge_method,
         resource, scope, expires_at, user_profile_id";

    fn map_row(row: &rusqlite::Row) -> rusqlite::Result<AuthorizationCode> {
        let expires_at: String = row.get(8)?;
        Ok(AuthorizationCode {
            code: row.get(0)?,
            user_id: row.get(1)?,
            client_id: row.get(2)?,
            redirect_uri: row.get(3)?,
            code_challenge: row.get(4)?,
            code_challenge_method: row.get(5)?,
            resource: row.get(6)?,
            scope: row.get(7)?,
            expires_at: ts_column(8, &expires_at)?,
            user_profile_id: row.get(9)?,
        })
    }
}

#[async_trait]
impl AuthCodeRepository for SqliteAuthCodeRepository {
    async fn store_auth_code(&self, code: &AuthorizationCode) -> RepoResult<()> {
        let db = self.db.lock().await;
        let conn = db.connection();

        conn.execute(
            "INSERT INTO authorization_codes
                (code, user_id, client_id, redirect_uri, code_challenge,
                 code_challenge_method, resource, scope, expires_at, user_profile_id)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
            params![
                code.code,
                code.user_id,
                code.client_id,
                code.redirect_uri,
                code.code_challenge,
                code.code_challenge_method,
                code.resource,
                code.scope,
                fmt_ts(code.expires_at),
                code.user_profile_id,
            ],
        )?;
        debug!("[OAuth] Stored authorization code for client: {}", code.client_id);
        Ok(())
    }

    async fn get_auth_code(&self, code: &str) -> RepoResult<Option<AuthorizationCode>> {
        let db = self.db.lock().await;
        let conn = db.connection();
        let now = fmt_ts(Utc::now());

        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM authorization_codes WHERE code = ?1",
            Self::CODE_COLUMNS
        ))?;

        let found = stmt.query_row(params![code], Self::map_row).optional()?;

        match found {
            Some(auth_code) if fmt_ts(auth_code.expires_at) <= now => {
                // Lazy expiry: delete on read, report not-found
                conn.execute(
                    "DELETE FROM authorization_codes WHERE code = ?1",
                    params![code],
                )?;
                debug!("[OAuth] Dropped expired authorization code on read");
                Ok(None)
            }
            other => Ok(other),
        }
    }

    async fn remove_auth_code(&self, code: &str) -> RepoResult<()> {
        let db = self.db.lock().await;
        let conn = db.connection();

        conn.execute(
            "DELETE FROM authorization_codes WHERE code = ?1",
            params![code],
        )?;
        Ok(())
    }

    async fn take_auth_code(&self, code: &str) -> RepoResult<Option<AuthorizationCode>> {
        let db = self.db.lock().await;
        let conn = db.connection();
        let now = fmt_ts(Utc::now());

        // Atomic delete-and-return: only one of two racing redemptions can
        // observe the row. The expiry check happens after the delete — an
        // expired code is gone either way and reads as never-issued.
        let mut stmt = conn.prepare(&format!(
            "DELETE FROM authorization_codes WHERE code = ?1 RETURNING {}",
            Self::CODE_COLUMNS
        ))?;

        let taken = stmt.query_row(params![code], Self::map_row).optional()?;

        match taken {
            Some(auth_code) if fmt_ts(auth_code.expires_at) <= now => {
                debug!("[OAuth] Redemption attempt on expired authorization code");
                Ok(None)
            }
            Some(auth_code) => {
                debug!(
                    "[OAuth] Consumed authorization code for client: {}",
                    auth_code.client_id
                );
                Ok(Some(auth_code))
            }
            None => Ok(None),
        }
    }

    async fn cleanup_expired_codes(&self) -> RepoResult<usize> {
        let db = self.db.lock().await;
        let conn = db.connection();

        let deleted = conn.execute(
            "DELETE FROM authorization_codes WHERE expires_at <= ?1",
            params![fmt_ts(Utc::now())],
        )?;
        if deleted > 0 {
            info!("[OAuth] Cleaned up {} expired authorization codes", deleted);
        }
        Ok(deleted)
    }
}
