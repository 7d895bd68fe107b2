//! Identity manager: upstream profile bindings plus explicit decryption.
//!
//! Profiles come out of the store with ciphertext token columns. The only
//! way to plaintext is through this service, so every decryption site is
//! visible in one place.

use std::sync::Arc;

use tracing::debug;

use authmux_core::{
    AuthError, AuthResult, ExternalProfile, UpstreamTokenPair, UserProfile, UserProfileRepository,
};
use authmux_storage::TokenCipher;

pub struct IdentityManager {
    profiles: Arc<dyn UserProfileRepository>,
    cipher: Arc<TokenCipher>,
}

impl IdentityManager {
    pub fn new(profiles: Arc<dyn UserProfileRepository>, cipher: Arc<TokenCipher>) -> Self {
        Self { profiles, cipher }
    }

    /// Bind (or re-bind) an upstream identity, encrypting the credential
    /// pair on the way in. Returns the internal profile id.
    pub async fn upsert_identity(
        &self,
        profile: &ExternalProfile,
        tokens: &UpstreamTokenPair,
    ) -> AuthResult<String> {
        let id = self.profiles.upsert_profile(profile, tokens).await?;
        debug!("[OAuth] Bound upstream identity to profile {}", id);
        Ok(id)
    }

    /// Fetch a profile. Token columns stay ciphertext.
    pub async fn get_profile(&self, id: &str) -> AuthResult<UserProfile> {
        self.profiles
            .get_profile(id)
            .await?
            .ok_or(AuthError::NotFound)
    }

    /// Fetch and decrypt the upstream credential pair for a profile.
    pub async fn upstream_tokens(&self, profile_id: &str) -> AuthResult<UpstreamTokenPair> {
        let profile = self.get_profile(profile_id).await?;
        Ok(UpstreamTokenPair {
            access_token: self.cipher.decrypt(&profile.access_token)?,
            refresh_token: self.cipher.decrypt(&profile.refresh_token)?,
        })
    }

    /// Persist a fresh upstream pair after a refresh. `None` refresh token
    /// keeps the existing ciphertext.
    pub async fn update_upstream_tokens(
        &self,
        profile_id: &str,
        access_token: &str,
        refresh_token: Option<&str>,
    ) -> AuthResult<()> {
        self.profiles
            .update_upstream_tokens(profile_id, access_token, refresh_token)
            .await?;
        Ok(())
    }
}
