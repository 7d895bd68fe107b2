//! Repository and cache traits for data access
//!
//! These traits define the interface for data storage without specifying
//! the implementation (SQLite, in-memory, etc.)

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::domain::{
    AuthorizationCode, ExternalProfile, OAuthClient, TokenRecord, UpstreamTokenPair, UserProfile,
};

/// Result type for repository operations
pub type RepoResult<T> = anyhow::Result<T>;

/// Registered OAuth client storage. No cache tier — reads go straight to
/// the durable store.
#[async_trait]
pub trait ClientRepository: Send + Sync {
    /// Persist a new client. A `client_id` collision surfaces as a
    /// unique-constraint error; the caller regenerates the ID and retries.
    async fn store_client(&self, client: &OAuthClient) -> RepoResult<()>;

    /// Get a client by ID, secret included.
    async fn get_client(&self, client_id: &str) -> RepoResult<Option<OAuthClient>>;

    /// Find a client by name. The secret is stripped from the result.
    async fn find_client_by_name(&self, name: &str) -> RepoResult<Option<OAuthClient>>;

    /// Update an existing client.
    async fn update_client(&self, client: &OAuthClient) -> RepoResult<()>;

    /// Delete a client. Returns whether a row existed.
    async fn delete_client(&self, client_id: &str) -> RepoResult<bool>;

    /// List all registered clients.
    async fn list_clients(&self) -> RepoResult<Vec<OAuthClient>>;
}

/// Authorization code storage.
#[async_trait]
pub trait AuthCodeRepository: Send + Sync {
    /// Persist a code verbatim.
    async fn store_auth_code(&self, code: &AuthorizationCode) -> RepoResult<()>;

    /// Non-consuming read with lazy expiry: an expired row is deleted inside
    /// the lookup and reported as absent.
    async fn get_auth_code(&self, code: &str) -> RepoResult<Option<AuthorizationCode>>;

    /// Unconditional delete. Idempotent.
    async fn remove_auth_code(&self, code: &str) -> RepoResult<()>;

    /// Atomic redemption: delete-and-return in a single statement, so two
    /// racing exchanges can never both observe the code as valid. An expired
    /// row is deleted and reported as absent.
    async fn take_auth_code(&self, code: &str) -> RepoResult<Option<AuthorizationCode>>;

    /// Bulk sweep of expired codes. Returns the number removed.
    async fn cleanup_expired_codes(&self) -> RepoResult<usize>;
}

/// Upstream identity storage. Implementations encrypt the upstream token
/// pair before writing; reads return ciphertext.
#[async_trait]
pub trait UserProfileRepository: Send + Sync {
    /// Upsert keyed on `(provider, provider_user_id)`. Returns the internal
    /// profile id (existing on update, fresh on insert).
    async fn upsert_profile(
        &self,
        profile: &ExternalProfile,
        tokens: &UpstreamTokenPair,
    ) -> RepoResult<String>;

    /// Get a profile by internal id. Tokens stay ciphertext.
    async fn get_profile(&self, id: &str) -> RepoResult<Option<UserProfile>>;

    /// Re-encrypt and persist a fresh upstream token pair. A `None` refresh
    /// token keeps the existing ciphertext (some providers rotate only the
    /// access token).
    async fn update_upstream_tokens(
        &self,
        id: &str,
        access_token: &str,
        refresh_token: Option<&str>,
    ) -> RepoResult<()>;
}

/// Outcome of the conditional "mark used" update on a refresh token.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MarkUsedOutcome {
    /// This caller won the race; `used_at` is now set.
    Marked,
    /// `used_at` was already set — a second presentation, i.e. replay.
    AlreadyUsed,
    NotFound,
}

/// Issued token storage.
#[async_trait]
pub trait TokenRepository: Send + Sync {
    async fn store_token(&self, record: &TokenRecord) -> RepoResult<()>;

    /// Get any token row by value, regardless of type or expiry.
    async fn get_token(&self, token: &str) -> RepoResult<Option<TokenRecord>>;

    /// Get an ACCESS row joined with its owning profile.
    async fn get_access_token_with_profile(
        &self,
        token: &str,
    ) -> RepoResult<Option<(TokenRecord, Option<UserProfile>)>>;

    /// Delete a token row. Returns whether a row existed.
    async fn delete_token(&self, token: &str) -> RepoResult<bool>;

    /// Conditional update: set `used_at` where it is still null. The
    /// rows-affected count is the race arbiter — zero on a live row means
    /// another presentation already rotated this token.
    async fn mark_refresh_token_used(
        &self,
        token: &str,
        now: DateTime<Utc>,
    ) -> RepoResult<MarkUsedOutcome>;

    async fn is_refresh_token_used(&self, token: &str) -> RepoResult<Option<bool>>;

    /// Bulk-delete every token in a rotation family. Returns the deleted
    /// token values (with their types) so callers can evict cache entries.
    async fn revoke_family(&self, family_id: &str) -> RepoResult<Vec<TokenRecord>>;

    /// Delete all tokens issued to a client. Returns the count removed.
    async fn revoke_client_tokens(&self, client_id: &str) -> RepoResult<usize>;

    /// Delete rows that expired before `cutoff`. Returns the count removed.
    async fn cleanup_expired(&self, cutoff: DateTime<Utc>) -> RepoResult<usize>;
}

/// Fast cache tier for the access-token read path.
///
/// Key namespace: `access_token:<token>`. No ordering guarantees across
/// keys. Failures here are non-fatal; callers fall back to the store.
#[async_trait]
pub trait TokenCache: Send + Sync {
    async fn get(&self, key: &str) -> RepoResult<Option<String>>;
    async fn set(&self, key: &str, value: &str, ttl_ms: u64) -> RepoResult<()>;
    async fn del(&self, key: &str) -> RepoResult<()>;
}
