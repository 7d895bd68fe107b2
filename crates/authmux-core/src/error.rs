//! Error taxonomy for the token store and refresh protocol.
//!
//! Callers deliberately cannot distinguish "unknown" from "expired" for
//! codes, tokens, and clients — both surface as `NotFound`. Cache failures
//! never appear here at all; they are swallowed with a store fallback.

use thiserror::Error;

/// Errors from the envelope encryption service.
#[derive(Debug, Error)]
pub enum CryptoError {
    #[error("invalid master key: {0}")]
    InvalidKey(String),

    /// Tag mismatch, truncated ciphertext, or a malformed stored record.
    /// Never recovered silently — corrupted plaintext must not leak through.
    #[error("decryption failed: {0}")]
    Decryption(String),

    #[error("encryption failed")]
    Encryption,
}

/// Service-level error taxonomy.
#[derive(Debug, Error)]
pub enum AuthError {
    /// Unknown or expired code/token/client. Indistinguishable on purpose.
    #[error("not found")]
    NotFound,

    /// A refresh token was presented a second time. The whole family has
    /// already been revoked by the time this error is returned.
    #[error("refresh token reuse detected for family {family_id}")]
    ReplayDetected { family_id: String },

    #[error(transparent)]
    Decryption(#[from] CryptoError),

    /// 401 from the upstream API after a failed or skipped refresh.
    #[error("upstream authentication failed (status {status})")]
    UpstreamAuth { status: u16 },

    /// Network error or timeout talking to the upstream token endpoint.
    #[error("upstream unavailable: {0}")]
    UpstreamUnavailable(String),

    /// Durable store failure. Fatal — never masked by the cache tier.
    #[error("store error: {0}")]
    Store(#[from] anyhow::Error),
}

pub type AuthResult<T> = Result<T, AuthError>;
