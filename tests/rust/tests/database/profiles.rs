//! User profile integration tests: upsert identity, encrypted columns.

use authmux_core::{UpstreamTokenPair, UserProfileRepository};
use pretty_assertions::assert_eq;
use tests::{external_profile, TestStorage};

fn pair(access: &str, refresh: &str) -> UpstreamTokenPair {
    UpstreamTokenPair {
        access_token: access.to_string(),
        refresh_token: refresh.to_string(),
    }
}

#[tokio::test]
async fn test_tokens_stored_as_ciphertext() {
    let storage = TestStorage::new();
    let id = storage
        .profiles
        .upsert_profile(&external_profile("u-1"), &pair("plain-at", "plain-rt"))
        .await
        .unwrap();

    // Straight from the table: neither plaintext appears
    let db = storage.db.lock().await;
    let (at, rt): (String, String) = db
        .connection()
        .query_row(
            "SELECT access_token, refresh_token FROM user_profiles WHERE id = ?1",
            [&id],
            |row| Ok((row.get(0)?, row.get(1)?)),
        )
        .unwrap();
    drop(db);

    assert_ne!(at, "plain-at");
    assert_ne!(rt, "plain-rt");
    assert_eq!(at.matches('.').count(), 2, "expected iv.tag.data form");

    assert_eq!(storage.cipher.decrypt(&at).unwrap(), "plain-at");
    assert_eq!(storage.cipher.decrypt(&rt).unwrap(), "plain-rt");
}

#[tokio::test]
async fn test_upsert_is_stable_per_identity() {
    let storage = TestStorage::new();
    let first = storage
        .profiles
        .upsert_profile(&external_profile("u-1"), &pair("a", "r"))
        .await
        .unwrap();

    let mut renamed = external_profile("u-1");
    renamed.username = "alice2".to_string();
    let second = storage
        .profiles
        .upsert_profile(&renamed, &pair("a2", "r2"))
        .await
        .unwrap();

    assert_eq!(first, second);
    let profile = storage.profiles.get_profile(&first).await.unwrap().unwrap();
    assert_eq!(profile.username, "alice2");
    assert_eq!(storage.cipher.decrypt(&profile.access_token).unwrap(), "a2");
}

#[tokio::test]
async fn test_optional_fields_stay_none() {
    let storage = TestStorage::new();
    let mut ext = external_profile("u-1");
    ext.email = None;
    ext.display_name = None;

    let id = storage.profiles.upsert_profile(&ext, &pair("a", "r")).await.unwrap();
    let profile = storage.profiles.get_profile(&id).await.unwrap().unwrap();

    // NULLs normalize to None, never empty strings
    assert_eq!(profile.email, None);
    assert_eq!(profile.display_name, None);
}

#[tokio::test]
async fn test_refresh_rotation_without_new_refresh_token() {
    let storage = TestStorage::new();
    let id = storage
        .profiles
        .upsert_profile(&external_profile("u-1"), &pair("old-at", "keep-rt"))
        .await
        .unwrap();

    storage
        .profiles
        .update_upstream_tokens(&id, "new-at", None)
        .await
        .unwrap();

    let profile = storage.profiles.get_profile(&id).await.unwrap().unwrap();
    assert_eq!(storage.cipher.decrypt(&profile.access_token).unwrap(), "new-at");
    assert_eq!(storage.cipher.decrypt(&profile.refresh_token).unwrap(), "keep-rt");
}
