//! Issued bearer credentials and rotation families.

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
use chrono::{DateTime, Utc};
use rand::Rng;
use serde::{Deserialize, Serialize};

use super::UserProfile;

/// Token type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenType {
    Access,
    Refresh,
}

impl TokenType {
    pub fn as_str(&self) -> &'static str {
        match self {
            TokenType::Access => "access",
            TokenType::Refresh => "refresh",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "access" => Some(TokenType::Access),
            "refresh" => Some(TokenType::Refresh),
            _ => None,
        }
    }
}

/// One issued bearer credential.
///
/// `family_id` groups a refresh token with every token descended from it via
/// rotation; `generation` increases monotonically within a family. A REFRESH
/// row with `used_at` set has already been rotated — presenting it again is
/// replay, and the whole family gets revoked.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenRecord {
    /// Opaque token value. Not the same value space as upstream tokens.
    pub token: String,
    pub token_type: TokenType,
    pub user_id: String,
    pub client_id: String,
    pub scope: Option<String>,
    pub resource: Option<String>,
    pub expires_at: DateTime<Utc>,
    pub user_profile_id: String,
    pub family_id: String,
    pub generation: i64,
    pub used_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl TokenRecord {
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at <= now
    }
}

/// Access-token metadata as served by the cache-aside read path: the token
/// row joined with its owning profile.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccessTokenMeta {
    pub token: TokenRecord,
    pub profile: Option<UserProfile>,
}

/// Generate an opaque token value: 32 random bytes, URL-safe base64.
pub fn generate_token_value() -> String {
    let mut rng = rand::thread_rng();
    let bytes: [u8; 32] = rng.gen();
    URL_SAFE_NO_PAD.encode(bytes)
}
