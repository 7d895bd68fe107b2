//! Transparent 401-refresh-retry wrapper around `reqwest`.

use std::sync::Arc;

use reqwest::header::{HeaderMap, AUTHORIZATION};
use reqwest::{Request, StatusCode};
use tracing::{debug, warn};

use authmux_core::{AuthError, AuthResult};

use super::is_expiry_signal;
use super::token_client::UpstreamTokenClient;
use crate::identity::IdentityManager;

/// A fully-read upstream response. The body is buffered because the
/// expiry-signal check has to inspect it before deciding the request's fate.
#[derive(Debug)]
pub struct UpstreamResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Vec<u8>,
}

impl UpstreamResponse {
    async fn read(response: reqwest::Response) -> AuthResult<Self> {
        let status = response.status();
        let headers = response.headers().clone();
        let body = response
            .bytes()
            .await
            .map_err(|e| AuthError::UpstreamUnavailable(e.to_string()))?
            .to_vec();
        Ok(Self {
            status,
            headers,
            body,
        })
    }
}

/// Executes proxied upstream calls on behalf of a profile, refreshing the
/// profile's upstream credentials once when they come back expired.
///
/// The downstream caller never sees the refresh: either the retry's response
/// comes back, or (when the refresh itself fails) the original 401 does.
/// Concurrent 401s for the same profile may each refresh independently.
pub struct RefreshingClient {
    http: reqwest::Client,
    identity: Arc<IdentityManager>,
    token_client: Arc<UpstreamTokenClient>,
}

impl RefreshingClient {
    pub fn new(
        http: reqwest::Client,
        identity: Arc<IdentityManager>,
        token_client: Arc<UpstreamTokenClient>,
    ) -> Self {
        Self {
            http,
            identity,
            token_client,
        }
    }

    /// Send `request` with the profile's current upstream access token.
    ///
    /// On a 401 carrying an expiry signal: refresh the upstream pair,
    /// persist it, and retry the request exactly once with the new token.
    /// The retry's response is returned as-is, success or not. A failed
    /// refresh degrades to the original 401.
    pub async fn execute(
        &self,
        profile_id: &str,
        mut request: Request,
    ) -> AuthResult<UpstreamResponse> {
        let tokens = self.identity.upstream_tokens(profile_id).await?;

        // Clone before the body is consumed; streaming bodies cannot be
        // cloned and therefore cannot be retried.
        let retry_request = request.try_clone();

        set_bearer(&mut request, &tokens.access_token)?;

        let response = self
            .http
            .execute(request)
            .await
            .map_err(|e| AuthError::UpstreamUnavailable(e.to_string()))?;

        if response.status() != StatusCode::UNAUTHORIZED {
            return UpstreamResponse::read(response).await;
        }

        let original = UpstreamResponse::read(response).await?;

        if !is_expiry_signal(&original.body) {
            debug!("[OAuth] Upstream 401 is not an expiry signal, surfacing as-is");
            return Ok(original);
        }

        let Some(mut retry_request) = retry_request else {
            warn!("[OAuth] Cannot retry non-cloneable request after upstream 401");
            return Ok(original);
        };

        let new_access = match self.token_client.refresh(&tokens.refresh_token).await {
            Ok(refreshed) => {
                self.identity
                    .update_upstream_tokens(
                        profile_id,
                        &refreshed.access_token,
                        refreshed.refresh_token.as_deref(),
                    )
                    .await?;
                refreshed.access_token
            }
            Err(e) => {
                // Degrade to the original 401 rather than masking it with
                // a refresh error the downstream client cannot act on.
                warn!("[OAuth] Upstream refresh failed, returning original 401: {}", e);
                return Ok(original);
            }
        };

        debug!("[OAuth] Retrying upstream request with refreshed credentials");
        set_bearer(&mut retry_request, &new_access)?;

        let retried = self
            .http
            .execute(retry_request)
            .await
            .map_err(|e| AuthError::UpstreamUnavailable(e.to_string()))?;

        UpstreamResponse::read(retried).await
    }
}

fn set_bearer(request: &mut Request, access_token: &str) -> AuthResult<()> {
    let value = format!("Bearer {}", access_token)
        .parse()
        .map_err(|_| AuthError::UpstreamUnavailable("invalid access token bytes".to_string()))?;
    request.headers_mut().insert(AUTHORIZATION, value);
    Ok(())
}
