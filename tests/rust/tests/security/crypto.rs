//! Envelope encryption tests across the public storage API.

use authmux_core::{AuthConfig, CryptoError, UpstreamConfig};
use authmux_storage::{generate_master_key, EncryptedRecord, TokenCipher, KEY_SIZE};

fn test_config(master_key_hex: String) -> AuthConfig {
    AuthConfig {
        master_key_hex,
        access_token_ttl_secs: 3600,
        refresh_token_ttl_secs: 30 * 24 * 3600,
        auth_code_ttl_secs: 600,
        token_retention_days: 30,
        upstream: UpstreamConfig {
            token_endpoint: "https://idp.example/oauth/token".to_string(),
            client_id: "gateway".to_string(),
            client_secret: None,
            scope: None,
            timeout_secs: 30,
        },
    }
}

#[test]
fn test_cipher_from_hex_config_key() {
    let key = generate_master_key().unwrap();
    let config = test_config(hex::encode(*key));

    let cipher = TokenCipher::new(&config.master_key().unwrap()).unwrap();
    let stored = cipher.encrypt_to_string("credential").unwrap();
    assert_eq!(cipher.decrypt(&stored).unwrap(), "credential");
}

#[test]
fn test_bad_config_keys_rejected() {
    assert!(matches!(
        test_config("not-hex".to_string()).master_key(),
        Err(CryptoError::InvalidKey(_))
    ));
    assert!(matches!(
        test_config("abcd".to_string()).master_key(),
        Err(CryptoError::InvalidKey(_))
    ));
}

#[test]
fn test_storage_form_roundtrip() {
    let key = generate_master_key().unwrap();
    let cipher = TokenCipher::new(&key).unwrap();

    let record = cipher.encrypt(b"payload").unwrap();
    let stored = record.to_storage_string();
    let reparsed = EncryptedRecord::from_storage_string(&stored).unwrap();

    assert_eq!(record, reparsed);
    assert_eq!(cipher.decrypt_record(&reparsed).unwrap(), b"payload");
}

#[test]
fn test_decryption_with_rotated_key_fails_loudly() {
    let cipher_a = TokenCipher::new(&generate_master_key().unwrap()).unwrap();
    let cipher_b = TokenCipher::new(&generate_master_key().unwrap()).unwrap();

    let stored = cipher_a.encrypt_to_string("secret").unwrap();
    assert!(matches!(
        cipher_b.decrypt(&stored),
        Err(CryptoError::Decryption(_))
    ));
}

#[test]
fn test_truncated_ciphertext_fails() {
    let cipher = TokenCipher::new(&generate_master_key().unwrap()).unwrap();
    let stored = cipher.encrypt_to_string("secret").unwrap();

    // Drop the data segment entirely
    let truncated: Vec<&str> = stored.splitn(3, '.').take(2).collect();
    assert!(cipher.decrypt(&truncated.join(".")).is_err());
}

#[test]
fn test_generated_keys_are_distinct() {
    let a = generate_master_key().unwrap();
    let b = generate_master_key().unwrap();
    assert_eq!(a.len(), KEY_SIZE);
    assert_ne!(*a, *b);
}
