//! Database manager for SQLite storage.
//!
//! Note: We use standard SQLite (not SQLCipher). Sensitive data (upstream
//! token pairs) is encrypted at the application level using the `crypto`
//! module before being stored.
//!
//! ## Migration System
//!
//! Migrations are numbered sequentially (001, 002, 003, etc.) and stored in
//! the `migrations/` directory. Each migration is run exactly once, tracked
//! via the `schema_migrations` table.
//!
//! To add a new migration:
//! 1. Create a new file: `migrations/NNN_description.sql`
//! 2. Add the migration to the `MIGRATIONS` array below
//! 3. The migration will auto-run on next startup

use anyhow::{Context, Result};
use rusqlite::Connection;
use std::path::Path;
use tracing::{debug, info};

/// A database migration with version number and SQL content.
struct Migration {
    version: i64,
    name: &'static str,
    sql: &'static str,
}

/// All migrations in order. Add new migrations here.
const MIGRATIONS: &[Migration] = &[Migration {
    version: 1,
    name: "initial",
    sql: include_str!("migrations/001_initial.sql"),
}];

/// SQLite database wrapper.
pub struct Database {
    conn: Connection,
}

impl Database {
    /// Open a database at the given path.
    ///
    /// If the database doesn't exist, it will be created.
    /// All pending migrations will be automatically applied.
    pub fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create database directory: {:?}", parent))?;
        }

        let conn = Connection::open(path)
            .with_context(|| format!("Failed to open database at {:?}", path))?;

        conn.pragma_update(None, "foreign_keys", "ON")?;

        // WAL for better concurrency across requests
        conn.pragma_update(None, "journal_mode", "WAL")?;

        debug!("Opened database at {:?}", path);

        let db = Self { conn };
        db.run_migrations()?;

        Ok(db)
    }

    /// Open an in-memory database (for testing).
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        conn.pragma_update(None, "foreign_keys", "ON")?;

        debug!("Opened in-memory database");

        let db = Self { conn };
        db.run_migrations()?;

        Ok(db)
    }

    /// Run all pending database migrations.
    fn run_migrations(&self) -> Result<()> {
        self.ensure_migrations_table()?;

        let current_version = self.get_schema_version();

        info!(
            "Current database schema version: {}, latest available: {}",
            current_version,
            MIGRATIONS.last().map(|m| m.version).unwrap_or(0)
        );

        for migration in MIGRATIONS {
            if migration.version > current_version {
                info!(
                    "Running migration {} ({})...",
                    migration.version, migration.name
                );

                let tx = self.conn.unchecked_transaction()?;

                if let Err(e) = self.conn.execute_batch(migration.sql) {
                    tracing::error!(
                        "Migration {} ({}) failed with error: {}",
                        migration.version,
                        migration.name,
                        e
                    );
                    return Err(anyhow::anyhow!(
                        "Failed to run migration {} ({}): {}",
                        migration.version,
                        migration.name,
                        e
                    ));
                }

                self.conn.execute(
                    "INSERT OR REPLACE INTO schema_migrations (version, name, applied_at) VALUES (?1, ?2, datetime('now'))",
                    rusqlite::params![migration.version, migration.name],
                )?;

                tx.commit()?;

                info!(
                    "Migration {} ({}) completed successfully",
                    migration.version, migration.name
                );
            }
        }

        Ok(())
    }

    /// Ensure the schema_migrations table exists.
    fn ensure_migrations_table(&self) -> Result<()> {
        self.conn.execute(
            "CREATE TABLE IF NOT EXISTS schema_migrations (
                version INTEGER PRIMARY KEY,
                name TEXT NOT NULL,
                applied_at TEXT NOT NULL
            )",
            [],
        )?;
        Ok(())
    }

    /// Get the current schema version (highest applied migration).
    fn get_schema_version(&self) -> i64 {
        self.conn
            .query_row(
                "SELECT COALESCE(MAX(version), 0) FROM schema_migrations",
                [],
                |row| row.get(0),
            )
            .unwrap_or(0)
    }

    /// Get a reference to the underlying connection.
    pub fn connection(&self) -> &Connection {
        &self.conn
    }

    /// Execute a closure within a transaction.
    pub fn transaction<T, F>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&Connection) -> Result<T>,
    {
        let tx = self.conn.unchecked_transaction()?;
        let result = f(&self.conn)?;
        tx.commit()?;
        Ok(result)
    }
}
