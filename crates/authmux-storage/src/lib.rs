//! Authmux Storage Layer
//!
//! SQLite durable store with field-level encryption for sensitive data.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────┐
//! │                    Application                       │
//! ├──────────────────────────────────────────────────────┤
//! │               Repository Traits                      │
//! │   (ClientRepository, TokenRepository, etc. — core)   │
//! ├──────────────────────────────────────────────────────┤
//! │            SQLite Implementations                    │
//! │  (SqliteClientRepository, SqliteTokenRepository, …)  │
//! ├──────────────────────────────────────────────────────┤
//! │           TokenCipher (AES-256-GCM)                  │
//! │        (Encrypts upstream token columns)             │
//! ├──────────────────────────────────────────────────────┤
//! │                   Database                           │
//! │                   (SQLite)                           │
//! └──────────────────────────────────────────────────────┘
//! ```
//!
//! # Usage
//!
//! ```rust,ignore
//! use authmux_storage::{
//!     Database, SqliteTokenRepository, SqliteUserProfileRepository, TokenCipher,
//! };
//! use std::sync::Arc;
//! use tokio::sync::Mutex;
//!
//! let db = Arc::new(Mutex::new(Database::open(&path)?));
//! let cipher = Arc::new(TokenCipher::new(&config.master_key()?)?);
//!
//! let token_repo = SqliteTokenRepository::new(db.clone());
//! let profile_repo = SqliteUserProfileRepository::new(db.clone(), cipher);
//! ```

pub mod crypto;
mod database;
mod repositories;

pub use crypto::{generate_master_key, EncryptedRecord, TokenCipher, KEY_SIZE};
pub use database::Database;
pub use repositories::*;

/// Default database file name.
pub const DATABASE_FILE: &str = "authmux.db";
