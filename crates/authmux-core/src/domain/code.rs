//! Short-lived, single-use PKCE authorization codes.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A pending authorization code.
///
/// Exists for at most one redemption: the exchange deletes the row, and
/// deletion itself is the single-use guarantee. A read past `expires_at`
/// deletes the row and reports not-found — an expired code is
/// indistinguishable from one that was never issued.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthorizationCode {
    pub code: String,
    pub user_id: String,
    pub client_id: String,
    pub redirect_uri: String,
    pub code_challenge: String,
    pub code_challenge_method: String,
    pub resource: Option<String>,
    pub scope: Option<String>,
    pub expires_at: DateTime<Utc>,
    pub user_profile_id: String,
}

impl AuthorizationCode {
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at <= now
    }
}
