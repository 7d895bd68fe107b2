//! Dynamically registered OAuth clients.

use chrono::{DateTime, Utc};
use rand::Rng;
use serde::{Deserialize, Serialize};

/// Length of the random suffix appended to generated client IDs.
const CLIENT_ID_SUFFIX_LEN: usize = 8;

/// A registered OAuth client.
///
/// Identity is immutable once created except via an explicit update. The
/// durable store is the sole source of truth — client reads are never cached.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OAuthClient {
    pub client_id: String,
    pub client_secret: Option<String>,
    pub client_name: String,
    pub redirect_uris: Vec<String>,
    pub grant_types: Vec<String>,
    pub response_types: Vec<String>,
    pub token_endpoint_auth_method: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl OAuthClient {
    pub fn new(client_name: impl Into<String>, redirect_uris: Vec<String>) -> Self {
        let client_name = client_name.into();
        let now = Utc::now();
        Self {
            client_id: generate_client_id(&client_name),
            client_secret: None,
            client_name,
            redirect_uris,
            grant_types: vec![
                "authorization_code".to_string(),
                "refresh_token".to_string(),
            ],
            response_types: vec!["code".to_string()],
            token_endpoint_auth_method: "none".to_string(),
            created_at: now,
            updated_at: now,
        }
    }

    /// Drop the client secret for lookups that must not leak it.
    pub fn without_secret(mut self) -> Self {
        self.client_secret = None;
        self
    }

    /// Check whether a redirect URI is registered for this client.
    pub fn has_redirect_uri(&self, uri: &str) -> bool {
        self.redirect_uris.iter().any(|u| u == uri)
    }
}

/// Generate a client ID from a client name: the lower-cased name with all
/// non-alphanumerics stripped, plus a random lowercase-alphanumeric suffix.
///
/// Uniqueness is probabilistic, not guaranteed — the store enforces the
/// unique constraint and callers regenerate on a conflict.
pub fn generate_client_id(client_name: &str) -> String {
    const ALPHABET: &[u8] = b"abcdefghijklmnopqrstuvwxyz0123456789";

    let slug: String = client_name
        .to_lowercase()
        .chars()
        .filter(|c| c.is_ascii_alphanumeric())
        .collect();

    let mut rng = rand::thread_rng();
    let suffix: String = (0..CLIENT_ID_SUFFIX_LEN)
        .map(|_| ALPHABET[rng.gen_range(0..ALPHABET.len())] as char)
        .collect();

    format!("{}_{}", slug, suffix)
}
