//! Issuance, cache-aside validation, removal, and retention sweeps.

use std::sync::Arc;

use authmux_core::{AuthError, TokenCache, TokenRepository, TokenType};
use authmux_gateway::{tokens::TokenIssueParams, MemoryCache, TokenManager};
use chrono::{Duration, Utc};
use pretty_assertions::assert_eq;
use tests::{token_fixture, CountingTokenRepository, TestStorage};

struct Harness {
    storage: TestStorage,
    repo: Arc<CountingTokenRepository>,
    cache: Arc<MemoryCache>,
    manager: TokenManager,
}

fn harness() -> Harness {
    let storage = TestStorage::new();
    let repo = Arc::new(CountingTokenRepository::new(storage.tokens.clone()));
    let cache = Arc::new(MemoryCache::new());
    let manager = TokenManager::new(repo.clone(), cache.clone());
    Harness {
        storage,
        repo,
        cache,
        manager,
    }
}

fn issue_params(profile_id: &str) -> TokenIssueParams {
    TokenIssueParams {
        user_id: "user-1".to_string(),
        client_id: "client-1".to_string(),
        scope: Some("openid".to_string()),
        resource: None,
        user_profile_id: profile_id.to_string(),
        access_ttl_secs: 3600,
        refresh_ttl_secs: 30 * 24 * 3600,
    }
}

#[tokio::test]
async fn test_write_through_serves_reads_without_store() {
    let h = harness();
    let profile_id = h.storage.seed_profile("u-1").await;

    let (access, _refresh) = h
        .manager
        .issue_token_pair(&issue_params(&profile_id), None)
        .await
        .unwrap();

    let meta = h.manager.get_access_token(&access.token).await.unwrap();
    assert_eq!(meta.token.token, access.token);

    // Write-through populated the cache at issuance; no store read happened
    assert_eq!(h.repo.access_lookups(), 0);
}

#[tokio::test]
async fn test_store_hit_repopulates_cache() {
    let h = harness();
    let profile_id = h.storage.seed_profile("u-1").await;

    let (access, _refresh) = h
        .manager
        .issue_token_pair(&issue_params(&profile_id), None)
        .await
        .unwrap();

    // Simulate a cold cache (restart, eviction)
    h.cache
        .del(&format!("access_token:{}", access.token))
        .await
        .unwrap();

    let meta = h.manager.get_access_token(&access.token).await.unwrap();
    assert_eq!(h.repo.access_lookups(), 1);
    // The joined profile came along from the store
    assert_eq!(meta.profile.unwrap().username, "alice");

    // The miss repopulated the cache: next read stays off the store
    h.manager.get_access_token(&access.token).await.unwrap();
    assert_eq!(h.repo.access_lookups(), 1);
}

#[tokio::test]
async fn test_remove_access_token_clears_both_tiers() {
    let h = harness();
    let profile_id = h.storage.seed_profile("u-1").await;

    let (access, _refresh) = h
        .manager
        .issue_token_pair(&issue_params(&profile_id), None)
        .await
        .unwrap();

    assert!(h.manager.remove_access_token(&access.token).await.unwrap());

    // Absent from the cache (no hit) AND from the store (lookup finds nothing)
    assert!(matches!(
        h.manager.get_access_token(&access.token).await,
        Err(AuthError::NotFound)
    ));
    assert_eq!(h.repo.access_lookups(), 1);

    // Second removal reports nothing existed
    assert!(!h.manager.remove_access_token(&access.token).await.unwrap());
}

#[tokio::test]
async fn test_expired_access_token_not_served() {
    let h = harness();
    let profile_id = h.storage.seed_profile("u-1").await;

    let mut record = token_fixture(TokenType::Access, &profile_id, "fam-1", 3600);
    record.expires_at = Utc::now() - Duration::seconds(5);
    h.manager.store_access_token(&record, None).await.unwrap();

    assert!(matches!(
        h.manager.get_access_token(&record.token).await,
        Err(AuthError::NotFound)
    ));
}

#[tokio::test]
async fn test_unknown_token_is_not_found() {
    let h = harness();
    assert!(matches!(
        h.manager.get_access_token("never-issued").await,
        Err(AuthError::NotFound)
    ));
}

#[tokio::test]
async fn test_cleanup_honors_retention_window() {
    let h = harness();
    let profile_id = h.storage.seed_profile("u-1").await;
    let now = Utc::now();

    // 5 rows expired beyond the 30-day retention window
    for i in 0..5 {
        let mut old = token_fixture(TokenType::Access, &profile_id, &format!("old-{}", i), 3600);
        old.expires_at = now - Duration::days(31);
        h.storage.tokens.store_token(&old).await.unwrap();
    }
    // 2 rows still live
    for i in 0..2 {
        let fresh = token_fixture(TokenType::Access, &profile_id, &format!("new-{}", i), 3600);
        h.storage.tokens.store_token(&fresh).await.unwrap();
    }

    assert_eq!(h.manager.cleanup_expired_tokens(30).await.unwrap(), 5);
    assert_eq!(h.manager.cleanup_expired_tokens(30).await.unwrap(), 0);
}

#[tokio::test]
async fn test_revoke_client_tokens() {
    let h = harness();
    let profile_id = h.storage.seed_profile("u-1").await;

    h.manager
        .issue_token_pair(&issue_params(&profile_id), None)
        .await
        .unwrap();
    h.manager
        .issue_token_pair(&issue_params(&profile_id), None)
        .await
        .unwrap();

    // Each pair = access + refresh
    assert_eq!(h.manager.revoke_client_tokens("client-1").await.unwrap(), 4);
}
