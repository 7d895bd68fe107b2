//! Upstream identity bindings.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One upstream identity binding, keyed on `(provider, provider_user_id)`.
///
/// `access_token` and `refresh_token` hold the upstream credential pair as
/// ciphertext. Reads never decrypt automatically — callers needing plaintext
/// go through the encryption service explicitly.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserProfile {
    pub id: String,
    pub provider: String,
    pub provider_user_id: String,
    pub username: String,
    pub email: Option<String>,
    pub display_name: Option<String>,
    pub avatar_url: Option<String>,
    /// Upstream profile snapshot, stored verbatim.
    pub raw: serde_json::Value,
    /// Ciphertext (`iv.tag.data`).
    pub access_token: String,
    /// Ciphertext (`iv.tag.data`).
    pub refresh_token: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Profile data as returned by the upstream IdP's userinfo endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExternalProfile {
    pub provider: String,
    pub provider_user_id: String,
    pub username: String,
    pub email: Option<String>,
    pub display_name: Option<String>,
    pub avatar_url: Option<String>,
    pub raw: serde_json::Value,
}

/// A plaintext upstream token pair, before envelope encryption.
#[derive(Debug, Clone)]
pub struct UpstreamTokenPair {
    pub access_token: String,
    pub refresh_token: String,
}
