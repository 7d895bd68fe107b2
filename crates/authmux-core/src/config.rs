//! Configuration for the token store and upstream refresh protocol.
//!
//! All dependencies are explicit: the master key is handed to the encryption
//! service by the caller, never looked up from ambient state.

use serde::{Deserialize, Serialize};

use crate::error::CryptoError;

/// Top-level configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthConfig {
    /// 256-bit master key, hex-encoded (64 chars).
    pub master_key_hex: String,

    #[serde(default = "default_access_token_ttl_secs")]
    pub access_token_ttl_secs: i64,

    #[serde(default = "default_refresh_token_ttl_secs")]
    pub refresh_token_ttl_secs: i64,

    #[serde(default = "default_auth_code_ttl_secs")]
    pub auth_code_ttl_secs: i64,

    /// How long expired token rows are retained before cleanup deletes them.
    #[serde(default = "default_token_retention_days")]
    pub token_retention_days: i64,

    pub upstream: UpstreamConfig,
}

/// Upstream OIDC token endpoint configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpstreamConfig {
    pub token_endpoint: String,
    pub client_id: String,
    pub client_secret: Option<String>,
    pub scope: Option<String>,

    /// Timeout for every upstream call. Timeouts surface as
    /// `UpstreamUnavailable`, never as a silent hang.
    #[serde(default = "default_upstream_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_access_token_ttl_secs() -> i64 {
    3600
}

fn default_refresh_token_ttl_secs() -> i64 {
    30 * 24 * 3600
}

fn default_auth_code_ttl_secs() -> i64 {
    600
}

fn default_token_retention_days() -> i64 {
    30
}

fn default_upstream_timeout_secs() -> u64 {
    30
}

impl AuthConfig {
    /// Decode the hex master key into raw bytes.
    pub fn master_key(&self) -> Result<[u8; 32], CryptoError> {
        let bytes = hex::decode(&self.master_key_hex)
            .map_err(|e| CryptoError::InvalidKey(format!("invalid hex: {}", e)))?;
        bytes
            .try_into()
            .map_err(|_| CryptoError::InvalidKey("key must be 32 bytes".to_string()))
    }
}
