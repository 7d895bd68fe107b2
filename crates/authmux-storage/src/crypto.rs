//! Envelope encryption for sensitive data.
//!
//! Uses AES-256-GCM for authenticated encryption of upstream token pairs
//! before storing in the database. Each call draws a fresh 96-bit random
//! nonce; the 128-bit tag is kept as a separate field so a stored record is
//! `iv.tag.data` (three base64 segments) in a single text column.

use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
use ring::aead::{Aad, LessSafeKey, Nonce, UnboundKey, AES_256_GCM};
use ring::rand::{SecureRandom, SystemRandom};
use zeroize::Zeroizing;

use authmux_core::CryptoError;

/// Size of the encryption key (32 bytes = 256 bits).
pub const KEY_SIZE: usize = 32;

/// Size of the nonce (12 bytes for AES-GCM).
const NONCE_SIZE: usize = 12;

/// Size of the authentication tag (16 bytes for AES-GCM).
const TAG_SIZE: usize = 16;

/// One encrypted payload: base64 nonce, tag, and ciphertext.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncryptedRecord {
    pub iv: String,
    pub tag: String,
    pub data: String,
}

impl EncryptedRecord {
    /// Join the three segments with `.` for storage in one text column.
    pub fn to_storage_string(&self) -> String {
        format!("{}.{}.{}", self.iv, self.tag, self.data)
    }

    /// Parse the `iv.tag.data` storage form. A missing segment is a
    /// decryption error, not a silent fallback.
    pub fn from_storage_string(s: &str) -> Result<Self, CryptoError> {
        let mut parts = s.splitn(3, '.');
        match (parts.next(), parts.next(), parts.next()) {
            (Some(iv), Some(tag), Some(data)) if !iv.is_empty() && !tag.is_empty() => {
                Ok(Self {
                    iv: iv.to_string(),
                    tag: tag.to_string(),
                    data: data.to_string(),
                })
            }
            _ => Err(CryptoError::Decryption(
                "malformed ciphertext record: expected iv.tag.data".to_string(),
            )),
        }
    }
}

/// Encryptor for sensitive field data.
pub struct TokenCipher {
    key: LessSafeKey,
    rng: SystemRandom,
}

impl TokenCipher {
    /// Create a new cipher with the given master key.
    ///
    /// The key must be exactly 32 bytes (256 bits). It is injected by the
    /// caller — there is no ambient key lookup.
    pub fn new(master_key: &[u8; KEY_SIZE]) -> Result<Self, CryptoError> {
        let unbound_key = UnboundKey::new(&AES_256_GCM, master_key)
            .map_err(|_| CryptoError::InvalidKey("failed to create encryption key".to_string()))?;
        let key = LessSafeKey::new(unbound_key);
        let rng = SystemRandom::new();

        Ok(Self { key, rng })
    }

    /// Encrypt a byte payload into a structured record.
    pub fn encrypt(&self, plaintext: &[u8]) -> Result<EncryptedRecord, CryptoError> {
        let mut nonce_bytes = [0u8; NONCE_SIZE];
        self.rng
            .fill(&mut nonce_bytes)
            .map_err(|_| CryptoError::Encryption)?;

        let nonce = Nonce::assume_unique_for_key(nonce_bytes);

        // Encrypt in-place; ring appends the tag to the buffer
        let mut in_out = plaintext.to_vec();
        self.key
            .seal_in_place_append_tag(nonce, Aad::empty(), &mut in_out)
            .map_err(|_| CryptoError::Encryption)?;

        let tag_start = in_out.len() - TAG_SIZE;
        let (data, tag) = in_out.split_at(tag_start);

        Ok(EncryptedRecord {
            iv: BASE64.encode(nonce_bytes),
            tag: BASE64.encode(tag),
            data: BASE64.encode(data),
        })
    }

    /// Encrypt a string payload into the `iv.tag.data` storage form.
    pub fn encrypt_to_string(&self, plaintext: &str) -> Result<String, CryptoError> {
        Ok(self.encrypt(plaintext.as_bytes())?.to_storage_string())
    }

    /// Decrypt a structured record.
    pub fn decrypt_record(&self, record: &EncryptedRecord) -> Result<Vec<u8>, CryptoError> {
        let decode = |field: &str, name: &str| {
            BASE64
                .decode(field)
                .map_err(|_| CryptoError::Decryption(format!("invalid base64 in {}", name)))
        };

        let nonce_bytes = decode(&record.iv, "iv")?;
        let tag = decode(&record.tag, "tag")?;
        let data = decode(&record.data, "data")?;

        let nonce_array: [u8; NONCE_SIZE] = nonce_bytes
            .try_into()
            .map_err(|_| CryptoError::Decryption("invalid nonce length".to_string()))?;
        let nonce = Nonce::assume_unique_for_key(nonce_array);

        if tag.len() != TAG_SIZE {
            return Err(CryptoError::Decryption("invalid tag length".to_string()));
        }

        // ring expects ciphertext followed by tag
        let mut in_out = data;
        in_out.extend_from_slice(&tag);

        let plaintext = self
            .key
            .open_in_place(nonce, Aad::empty(), &mut in_out)
            .map_err(|_| {
                CryptoError::Decryption("tag mismatch - wrong key or corrupted data".to_string())
            })?;

        Ok(plaintext.to_vec())
    }

    /// Decrypt the `iv.tag.data` storage form back into a string.
    pub fn decrypt(&self, stored: &str) -> Result<String, CryptoError> {
        let record = EncryptedRecord::from_storage_string(stored)?;
        let plaintext = self.decrypt_record(&record)?;
        String::from_utf8(plaintext)
            .map_err(|_| CryptoError::Decryption("decrypted data is not valid UTF-8".to_string()))
    }
}

/// Generate a random master key.
pub fn generate_master_key() -> Result<Zeroizing<[u8; KEY_SIZE]>, CryptoError> {
    let rng = SystemRandom::new();
    let mut key = Zeroizing::new([0u8; KEY_SIZE]);
    rng.fill(key.as_mut())
        .map_err(|_| CryptoError::InvalidKey("failed to generate random key".to_string()))?;
    Ok(key)
}
