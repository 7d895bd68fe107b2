//! Token lifecycle: issuance, cache-aside validation, rotation, revocation.
//!
//! The cache tier is strictly optional for correctness. Every cache failure
//! is swallowed with a warn log and the durable store answers instead; a
//! store failure always propagates. Cached entries carry a TTL bounded by
//! the row's own expiry, so the cache can never extend a token's life.

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use tracing::{debug, warn};
use uuid::Uuid;

use authmux_core::{
    generate_token_value, AccessTokenMeta, AuthError, AuthResult, MarkUsedOutcome, TokenCache,
    TokenRecord, TokenRepository, TokenType, UserProfile,
};

/// Everything needed to mint a fresh access/refresh pair.
#[derive(Debug, Clone)]
pub struct TokenIssueParams {
    pub user_id: String,
    pub client_id: String,
    pub scope: Option<String>,
    pub resource: Option<String>,
    pub user_profile_id: String,
    pub access_ttl_secs: i64,
    pub refresh_ttl_secs: i64,
}

pub struct TokenManager {
    repo: Arc<dyn TokenRepository>,
    cache: Arc<dyn TokenCache>,
}

fn access_token_key(token: &str) -> String {
    format!("access_token:{}", token)
}

/// Cache TTL for an access token: time to row expiry, floored at zero.
fn cache_ttl_ms(expires_at: DateTime<Utc>, now: DateTime<Utc>) -> u64 {
    (expires_at - now).num_milliseconds().max(0) as u64
}

impl TokenManager {
    pub fn new(repo: Arc<dyn TokenRepository>, cache: Arc<dyn TokenCache>) -> Self {
        Self { repo, cache }
    }

    /// Mint a new access/refresh pair in a fresh rotation family
    /// (generation 0). Both rows are durable before the access token is
    /// cached.
    pub async fn issue_token_pair(
        &self,
        params: &TokenIssueParams,
        profile: Option<&UserProfile>,
    ) -> AuthResult<(TokenRecord, TokenRecord)> {
        let now = Utc::now();
        let family_id = Uuid::new_v4().to_string();

        let access = TokenRecord {
            token: generate_token_value(),
            token_type: TokenType::Access,
            user_id: params.user_id.clone(),
            client_id: params.client_id.clone(),
            scope: params.scope.clone(),
            resource: params.resource.clone(),
            expires_at: now + Duration::seconds(params.access_ttl_secs),
            user_profile_id: params.user_profile_id.clone(),
            family_id: family_id.clone(),
            generation: 0,
            used_at: None,
            created_at: now,
        };
        let refresh = TokenRecord {
            token: generate_token_value(),
            token_type: TokenType::Refresh,
            expires_at: now + Duration::seconds(params.refresh_ttl_secs),
            ..access.clone()
        };

        self.store_refresh_token(&refresh).await?;
        self.store_access_token(&access, profile).await?;

        debug!(
            "[OAuth] Issued token pair for client {} (family {})",
            params.client_id, family_id
        );
        Ok((access, refresh))
    }

    /// Persist an access token, then write it through to the cache joined
    /// with its owning profile.
    pub async fn store_access_token(
        &self,
        record: &TokenRecord,
        profile: Option<&UserProfile>,
    ) -> AuthResult<()> {
        self.repo.store_token(record).await?;

        let meta = AccessTokenMeta {
            token: record.clone(),
            profile: profile.cloned(),
        };
        self.cache_access_meta(&meta).await;
        Ok(())
    }

    /// Persist a refresh token. Refresh tokens are never cached — they are
    /// presented once per rotation, so a cache tier buys nothing and risks
    /// serving a row whose `used_at` just changed.
    pub async fn store_refresh_token(&self, record: &TokenRecord) -> AuthResult<()> {
        self.repo.store_token(record).await?;
        Ok(())
    }

    /// Validate an access token: cache first, store on miss (repopulating
    /// the cache). Unknown and expired are both `NotFound`.
    pub async fn get_access_token(&self, token: &str) -> AuthResult<AccessTokenMeta> {
        let key = access_token_key(token);
        let now = Utc::now();

        match self.cache.get(&key).await {
            Ok(Some(raw)) => match serde_json::from_str::<AccessTokenMeta>(&raw) {
                Ok(meta) if !meta.token.is_expired(now) => return Ok(meta),
                Ok(_) => {
                    // TTL should have evicted this already; drop it
                    let _ = self.cache.del(&key).await;
                }
                Err(e) => {
                    warn!("[OAuth] Dropping undecodable cache entry: {}", e);
                    let _ = self.cache.del(&key).await;
                }
            },
            Ok(None) => {}
            Err(e) => warn!("[OAuth] Cache read failed, falling back to store: {}", e),
        }

        let (record, profile) = self
            .repo
            .get_access_token_with_profile(token)
            .await?
            .ok_or(AuthError::NotFound)?;

        if record.is_expired(now) {
            return Err(AuthError::NotFound);
        }

        let meta = AccessTokenMeta {
            token: record,
            profile,
        };
        self.cache_access_meta(&meta).await;
        Ok(meta)
    }

    /// Revoke one access token. Row first, then cache, so a crash between
    /// the two leaves only a cache entry whose TTL still bounds it.
    pub async fn remove_access_token(&self, token: &str) -> AuthResult<bool> {
        let existed = self.repo.delete_token(token).await?;
        if let Err(e) = self.cache.del(&access_token_key(token)).await {
            warn!("[OAuth] Cache eviction failed after token delete: {}", e);
        }
        Ok(existed)
    }

    /// Mark a refresh token as rotated-out. The outcome reports who won:
    /// `AlreadyUsed` means another presentation got there first.
    pub async fn mark_refresh_token_used(&self, token: &str) -> AuthResult<MarkUsedOutcome> {
        Ok(self.repo.mark_refresh_token_used(token, Utc::now()).await?)
    }

    pub async fn is_refresh_token_used(&self, token: &str) -> AuthResult<bool> {
        self.repo
            .is_refresh_token_used(token)
            .await?
            .ok_or(AuthError::NotFound)
    }

    /// Refresh-grant rotation. Exactly one presentation of `presented` can
    /// succeed; the loser triggers family revocation and `ReplayDetected`.
    /// On success the new refresh token lives in the same family, one
    /// generation up.
    pub async fn rotate_refresh_token(
        &self,
        presented: &str,
        refresh_ttl_secs: i64,
    ) -> AuthResult<TokenRecord> {
        let now = Utc::now();

        let parent = self
            .repo
            .get_token(presented)
            .await?
            .ok_or(AuthError::NotFound)?;

        if parent.token_type != TokenType::Refresh || parent.is_expired(now) {
            return Err(AuthError::NotFound);
        }

        match self.repo.mark_refresh_token_used(presented, now).await? {
            MarkUsedOutcome::Marked => {}
            MarkUsedOutcome::AlreadyUsed => {
                // Replay. Burn the whole family before reporting it.
                self.revoke_token_family(&parent.family_id).await?;
                return Err(AuthError::ReplayDetected {
                    family_id: parent.family_id,
                });
            }
            MarkUsedOutcome::NotFound => return Err(AuthError::NotFound),
        }

        let next = TokenRecord {
            token: generate_token_value(),
            token_type: TokenType::Refresh,
            expires_at: now + Duration::seconds(refresh_ttl_secs),
            generation: parent.generation + 1,
            used_at: None,
            created_at: now,
            ..parent
        };
        self.store_refresh_token(&next).await?;

        debug!(
            "[OAuth] Rotated refresh token (family {}, gen {})",
            next.family_id, next.generation
        );
        Ok(next)
    }

    /// Revoke every token descended from one refresh-token family, evicting
    /// cached access entries as they go.
    pub async fn revoke_token_family(&self, family_id: &str) -> AuthResult<usize> {
        let revoked = self.repo.revoke_family(family_id).await?;

        for record in &revoked {
            if record.token_type == TokenType::Access {
                if let Err(e) = self.cache.del(&access_token_key(&record.token)).await {
                    warn!("[OAuth] Cache eviction failed during family revocation: {}", e);
                }
            }
        }

        if !revoked.is_empty() {
            warn!(
                "[OAuth] Revoked token family {} ({} tokens)",
                family_id,
                revoked.len()
            );
        }
        Ok(revoked.len())
    }

    /// Revoke everything issued to a client (deregistration path).
    pub async fn revoke_client_tokens(&self, client_id: &str) -> AuthResult<usize> {
        Ok(self.repo.revoke_client_tokens(client_id).await?)
    }

    /// Scheduled sweep: delete rows that expired more than `retention_days`
    /// ago. Rows are kept for a while after expiry so replay detection still
    /// has the used-up generations to look at.
    pub async fn cleanup_expired_tokens(&self, retention_days: i64) -> AuthResult<usize> {
        let cutoff = Utc::now() - Duration::days(retention_days);
        Ok(self.repo.cleanup_expired(cutoff).await?)
    }

    async fn cache_access_meta(&self, meta: &AccessTokenMeta) {
        let ttl = cache_ttl_ms(meta.token.expires_at, Utc::now());
        if ttl == 0 {
            return;
        }

        let raw = match serde_json::to_string(meta) {
            Ok(raw) => raw,
            Err(e) => {
                warn!("[OAuth] Failed to serialize token for cache: {}", e);
                return;
            }
        };

        if let Err(e) = self
            .cache
            .set(&access_token_key(&meta.token.token), &raw, ttl)
            .await
        {
            warn!("[OAuth] Cache write failed, store remains authoritative: {}", e);
        }
    }
}
