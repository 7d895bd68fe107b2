//! Authorization code integration tests: single-use redemption and expiry.

use authmux_core::AuthCodeRepository;
use tests::{auth_code_fixture, TestStorage};

#[tokio::test]
async fn test_exchange_consumes_code_exactly_once() {
    let storage = TestStorage::new();
    let profile_id = storage.seed_profile("u-1").await;

    storage
        .codes
        .store_auth_code(&auth_code_fixture("code-1", &profile_id, 600))
        .await
        .unwrap();

    let redeemed = storage.codes.take_auth_code("code-1").await.unwrap().unwrap();
    assert_eq!(redeemed.user_profile_id, profile_id);
    assert_eq!(redeemed.code_challenge_method, "S256");

    // Replayed exchange sees nothing
    assert!(storage.codes.take_auth_code("code-1").await.unwrap().is_none());
}

#[tokio::test]
async fn test_expired_code_unredeemable_and_deleted() {
    let storage = TestStorage::new();
    let profile_id = storage.seed_profile("u-1").await;

    storage
        .codes
        .store_auth_code(&auth_code_fixture("stale", &profile_id, -10))
        .await
        .unwrap();

    // Read path deletes the expired row and reports absence
    assert!(storage.codes.get_auth_code("stale").await.unwrap().is_none());

    let db = storage.db.lock().await;
    let remaining: i64 = db
        .connection()
        .query_row("SELECT count(*) FROM authorization_codes", [], |r| r.get(0))
        .unwrap();
    assert_eq!(remaining, 0);
}

#[tokio::test]
async fn test_unknown_and_expired_are_indistinguishable() {
    let storage = TestStorage::new();
    let profile_id = storage.seed_profile("u-1").await;

    storage
        .codes
        .store_auth_code(&auth_code_fixture("stale", &profile_id, -10))
        .await
        .unwrap();

    let expired = storage.codes.take_auth_code("stale").await.unwrap();
    let unknown = storage.codes.take_auth_code("never-issued").await.unwrap();
    assert!(expired.is_none());
    assert!(unknown.is_none());
}

#[tokio::test]
async fn test_cleanup_sweeps_only_expired() {
    let storage = TestStorage::new();
    let profile_id = storage.seed_profile("u-1").await;

    for (code, ttl) in [("live-1", 600), ("dead-1", -5), ("dead-2", -3600)] {
        storage
            .codes
            .store_auth_code(&auth_code_fixture(code, &profile_id, ttl))
            .await
            .unwrap();
    }

    assert_eq!(storage.codes.cleanup_expired_codes().await.unwrap(), 2);
    assert!(storage.codes.get_auth_code("live-1").await.unwrap().is_some());
}
