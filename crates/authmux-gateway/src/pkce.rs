//! PKCE (Proof Key for Code Exchange)
//!
//! RFC 7636, S256 only. The authorization request stores the challenge; the
//! exchange recomputes it from the presented verifier and compares.

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
use rand::Rng;
use sha2::{Digest, Sha256};

/// The only supported challenge method.
pub const CHALLENGE_METHOD: &str = "S256";

/// A verifier/challenge pair for one authorization flow.
#[derive(Debug, Clone)]
pub struct PkceChallenge {
    /// Kept secret by the client, presented at token exchange.
    pub verifier: String,
    /// Sent with the authorization request and stored alongside the code.
    pub challenge: String,
    pub method: String,
}

impl PkceChallenge {
    /// Generate a fresh pair: 32 random bytes → base64url verifier,
    /// SHA-256 of the verifier → base64url challenge.
    pub fn generate() -> Self {
        let mut rng = rand::thread_rng();
        let random_bytes: [u8; 32] = rng.gen();
        let verifier = URL_SAFE_NO_PAD.encode(random_bytes);
        let challenge = Self::compute_challenge(&verifier);

        Self {
            verifier,
            challenge,
            method: CHALLENGE_METHOD.to_string(),
        }
    }

    /// S256 transform of a verifier.
    pub fn compute_challenge(verifier: &str) -> String {
        let mut hasher = Sha256::new();
        hasher.update(verifier.as_bytes());
        URL_SAFE_NO_PAD.encode(hasher.finalize())
    }

    /// Check a presented verifier against a stored challenge.
    pub fn verify(verifier: &str, challenge: &str) -> bool {
        Self::compute_challenge(verifier) == challenge
    }
}

impl Default for PkceChallenge {
    fn default() -> Self {
        Self::generate()
    }
}
