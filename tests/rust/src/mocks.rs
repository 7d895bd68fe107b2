//! Instrumented repository implementations for testing.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use authmux_core::{
    MarkUsedOutcome, RepoResult, TokenRecord, TokenRepository, UserProfile,
};

/// Wraps a real `TokenRepository` and counts store reads, so tests can
/// assert that the cache tier actually absorbed a lookup.
pub struct CountingTokenRepository {
    inner: Arc<dyn TokenRepository>,
    access_lookups: AtomicUsize,
}

impl CountingTokenRepository {
    pub fn new(inner: Arc<dyn TokenRepository>) -> Self {
        Self {
            inner,
            access_lookups: AtomicUsize::new(0),
        }
    }

    /// Number of `get_access_token_with_profile` calls that reached the store.
    pub fn access_lookups(&self) -> usize {
        self.access_lookups.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl TokenRepository for CountingTokenRepository {
    async fn store_token(&self, record: &TokenRecord) -> RepoResult<()> {
        self.inner.store_token(record).await
    }

    async fn get_token(&self, token: &str) -> RepoResult<Option<TokenRecord>> {
        self.inner.get_token(token).await
    }

    async fn get_access_token_with_profile(
        &self,
        token: &str,
    ) -> RepoResult<Option<(TokenRecord, Option<UserProfile>)>> {
        self.access_lookups.fetch_add(1, Ordering::SeqCst);
        self.inner.get_access_token_with_profile(token).await
    }

    async fn delete_token(&self, token: &str) -> RepoResult<bool> {
        self.inner.delete_token(token).await
    }

    async fn mark_refresh_token_used(
        &self,
        token: &str,
        now: DateTime<Utc>,
    ) -> RepoResult<MarkUsedOutcome> {
        self.inner.mark_refresh_token_used(token, now).await
    }

    async fn is_refresh_token_used(&self, token: &str) -> RepoResult<Option<bool>> {
        self.inner.is_refresh_token_used(token).await
    }

    async fn revoke_family(&self, family_id: &str) -> RepoResult<Vec<TokenRecord>> {
        self.inner.revoke_family(family_id).await
    }

    async fn revoke_client_tokens(&self, client_id: &str) -> RepoResult<usize> {
        self.inner.revoke_client_tokens(client_id).await
    }

    async fn cleanup_expired(&self, cutoff: DateTime<Utc>) -> RepoResult<usize> {
        self.inner.cleanup_expired(cutoff).await
    }
}
