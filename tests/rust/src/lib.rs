//! Shared test utilities and fixtures for Authmux integration tests.

use std::sync::Arc;

use chrono::{Duration, Utc};
use serde_json::json;
use tokio::sync::Mutex;

use authmux_core::{
    generate_token_value, AuthorizationCode, ExternalProfile, TokenRecord, TokenType,
    UpstreamTokenPair,
};
use authmux_storage::{
    generate_master_key, Database, SqliteAuthCodeRepository, SqliteClientRepository,
    SqliteTokenRepository, SqliteUserProfileRepository, TokenCipher,
};

/// Mock and instrumented repository implementations
pub mod mocks;
pub use mocks::CountingTokenRepository;

/// A fully-wired in-memory storage stack for one test.
pub struct TestStorage {
    pub db: Arc<Mutex<Database>>,
    pub cipher: Arc<TokenCipher>,
    pub clients: Arc<SqliteClientRepository>,
    pub codes: Arc<SqliteAuthCodeRepository>,
    pub profiles: Arc<SqliteUserProfileRepository>,
    pub tokens: Arc<SqliteTokenRepository>,
}

impl TestStorage {
    pub fn new() -> Self {
        let db = Arc::new(Mutex::new(
            Database::open_in_memory().expect("in-memory database"),
        ));
        let key = generate_master_key().expect("master key");
        let cipher = Arc::new(TokenCipher::new(&key).expect("cipher"));

        Self {
            clients: Arc::new(SqliteClientRepository::new(db.clone())),
            codes: Arc::new(SqliteAuthCodeRepository::new(db.clone())),
            profiles: Arc::new(SqliteUserProfileRepository::new(db.clone(), cipher.clone())),
            tokens: Arc::new(SqliteTokenRepository::new(db.clone())),
            db,
            cipher,
        }
    }

    /// Insert a profile binding and return its id.
    pub async fn seed_profile(&self, provider_user_id: &str) -> String {
        use authmux_core::UserProfileRepository;

        self.profiles
            .upsert_profile(
                &external_profile(provider_user_id),
                &UpstreamTokenPair {
                    access_token: "upstream-access".to_string(),
                    refresh_token: "upstream-refresh".to_string(),
                },
            )
            .await
            .expect("seed profile")
    }
}

impl Default for TestStorage {
    fn default() -> Self {
        Self::new()
    }
}

pub fn external_profile(provider_user_id: &str) -> ExternalProfile {
    ExternalProfile {
        provider: "zitadel".to_string(),
        provider_user_id: provider_user_id.to_string(),
        username: "alice".to_string(),
        email: Some("alice@example.com".to_string()),
        display_name: Some("Alice".to_string()),
        avatar_url: None,
        raw: json!({"sub": provider_user_id, "preferred_username": "alice"}),
    }
}

pub fn auth_code_fixture(code: &str, profile_id: &str, ttl_secs: i64) -> AuthorizationCode {
    AuthorizationCode {
        code: code.to_string(),
        user_id: "user-1".to_string(),
        client_id: "client-1".to_string(),
        redirect_uri: "http://localhost:3000/callback".to_string(),
        code_challenge: "challenge".to_string(),
        code_challenge_method: "S256".to_string(),
        resource: None,
        scope: Some("openid".to_string()),
        expires_at: Utc::now() + Duration::seconds(ttl_secs),
        user_profile_id: profile_id.to_string(),
    }
}

pub fn token_fixture(
    token_type: TokenType,
    profile_id: &str,
    family: &str,
    ttl_secs: i64,
) -> TokenRecord {
    let now = Utc::now();
    TokenRecord {
        token: generate_token_value(),
        token_type,
        user_id: "user-1".to_string(),
        client_id: "client-1".to_string(),
        scope: Some("openid".to_string()),
        resource: None,
        expires_at: now + Duration::seconds(ttl_secs),
        user_profile_id: profile_id.to_string(),
        family_id: family.to_string(),
        generation: 0,
        used_at: None,
        created_at: now,
    }
}
