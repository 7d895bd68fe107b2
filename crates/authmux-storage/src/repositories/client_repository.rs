//! SQLite implementation of ClientRepository.
//!
//! Clients are read straight from the durable store on every lookup — there
//! is deliberately no cache tier in front of this table.

use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use rusqlite::{params, OptionalExtension};
use tokio::sync::Mutex;
use tracing::{debug, info};

use authmux_core::{ClientRepository, OAuthClient, RepoResult};

use super::{fmt_ts, ts_column};
use crate::Database;

pub struct SqliteClientRepository {
    db: Arc<Mutex<Database>>,
}

impl SqliteClientRepository {
    pub fn new(db: Arc<Mutex<Database>>) -> Self {
        Self { db }
    }

    /// Standard column selection for client queries.
    const CLIENT_COLUMNS: &'static str =
        "client_id, client_secret, client_name, redirect_uris, grant_types, response_types,
         token_endpoint_auth_method, created_at, updated_at";

    fn map_row(row: &rusqlite::Row) -> rusqlite::Result<OAuthClient> {
        let redirect_uris_json: String = row.get(3)?;
        let grant_types_json: String = row.get(4)?;
        let response_types_json: String = row.get(5)?;
        let created_at: String = row.get(7)?;
        let updated_at: String = row.get(8)?;

        Ok(OAuthClient {
            client_id: row.get(0)?,
            client_secret: row.get(1)?,
            client_name: row.get(2)?,
            redirect_uris: serde_json::from_str(&redirect_uris_json).unwrap_or_default(),
            grant_types: serde_json::from_str(&grant_types_json).unwrap_or_default(),
            response_types: serde_json::from_str(&response_types_json).unwrap_or_default(),
            token_endpoint_auth_method: row.get(6)?,
            created_at: ts_column(7, &created_at)?,
            updated_at: ts_column(8, &updated_at)?,
        })
    }
}

#[async_trait]
impl ClientRepository for SqliteClientRepository {
    async fn store_client(&self, client: &OAuthClient) -> RepoResult<()> {
        let db = self.db.lock().await;
        let conn = db.connection();

        // Plain INSERT: a client_id collision is a unique-constraint error
        // and the caller regenerates the ID and retries.
        conn.execute(
            "INSERT INTO oauth_clients (
                client_id, client_secret, client_name, redirect_uris, grant_types,
                response_types, token_endpoint_auth_method, created_at, updated_at
             )
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
            params![
                client.client_id,
                client.client_secret,
                client.client_name,
                serde_json::to_string(&client.redirect_uris)?,
                serde_json::to_string(&client.grant_types)?,
                serde_json::to_string(&client.response_types)?,
                client.token_endpoint_auth_method,
                fmt_ts(client.created_at),
                fmt_ts(client.updated_at),
            ],
        )?;
        debug!(
            "[OAuth] Stored client: {} ({})",
            client.client_name, client.client_id
        );
        Ok(())
    }

    async fn get_client(&self, client_id: &str) -> RepoResult<Option<OAuthClient>> {
        let db = self.db.lock().await;
        let conn = db.connection();

        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM oauth_clients WHERE client_id = ?1",
            Self::CLIENT_COLUMNS
        ))?;

        Ok(stmt
            .query_row(params![client_id], Self::map_row)
            .optional()?)
    }

    async fn find_client_by_name(&self, name: &str) -> RepoResult<Option<OAuthClient>> {
        let db = self.db.lock().await;
        let conn = db.connection();

        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM oauth_clients WHERE client_name = ?1",
            Self::CLIENT_COLUMNS
        ))?;

        let client = stmt.query_row(params![name], Self::map_row).optional()?;

        // Name lookups feed registration checks; never hand back the secret
        Ok(client.map(OAuthClient::without_secret))
    }

    async fn update_client(&self, client: &OAuthClient) -> RepoResult<()> {
        let db = self.db.lock().await;
        let conn = db.connection();

        conn.execute(
            "UPDATE oauth_clients SET
                client_secret = ?2, client_name = ?3, redirect_uris = ?4,
                grant_types = ?5, response_types = ?6, token_endpoint_auth_method = ?7,
                updated_at = ?8
             WHERE client_id = ?1",
            params![
                client.client_id,
                client.client_secret,
                client.client_name,
                serde_json::to_string(&client.redirect_uris)?,
                serde_json::to_string(&client.grant_types)?,
                serde_json::to_string(&client.response_types)?,
                client.token_endpoint_auth_method,
                fmt_ts(chrono::Utc::now()),
            ],
        )?;
        debug!("[OAuth] Updated client: {}", client.client_id);
        Ok(())
    }

    async fn delete_client(&self, client_id: &str) -> RepoResult<bool> {
        let db = self.db.lock().await;
        let conn = db.connection();

        let rows = conn.execute(
            "DELETE FROM oauth_clients WHERE client_id = ?1",
            params![client_id],
        )?;

        if rows > 0 {
            info!("[OAuth] Deleted client: {}", client_id);
        }
        Ok(rows > 0)
    }

    async fn list_clients(&self) -> RepoResult<Vec<OAuthClient>> {
        let db = self.db.lock().await;
        let conn = db.connection();

        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM oauth_clients ORDER BY created_at DESC",
            Self::CLIENT_COLUMNS
        ))?;

        let clients: Vec<OAuthClient> = stmt
            .query_map([], Self::map_row)?
            .collect::<Result<_, _>>()?;
        debug!("[OAuth] Listed {} clients", clients.len());
        Ok(clients)
    }
}
