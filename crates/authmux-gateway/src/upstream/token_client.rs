//! Client for the upstream IdP's token endpoint.

use std::time::Duration;

use serde::Deserialize;
use tracing::{debug, warn};

use authmux_core::{AuthError, AuthResult, UpstreamConfig};

/// Response from the upstream token endpoint. Providers may omit the
/// refresh token when they rotate only the access token.
#[derive(Debug, Clone, Deserialize)]
pub struct UpstreamTokenResponse {
    pub access_token: String,
    pub refresh_token: Option<String>,
    pub expires_in: Option<i64>,
}

pub struct UpstreamTokenClient {
    http: reqwest::Client,
    config: UpstreamConfig,
}

impl UpstreamTokenClient {
    pub fn new(config: UpstreamConfig) -> AuthResult<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| AuthError::UpstreamUnavailable(e.to_string()))?;
        Ok(Self { http, config })
    }

    /// Exchange a refresh token for a fresh upstream pair.
    ///
    /// Anything other than a 2xx with a parsable token body is
    /// `UpstreamUnavailable` — the caller decides whether to degrade.
    pub async fn refresh(&self, refresh_token: &str) -> AuthResult<UpstreamTokenResponse> {
        let mut form: Vec<(&str, &str)> = vec![
            ("grant_type", "refresh_token"),
            ("refresh_token", refresh_token),
            ("client_id", &self.config.client_id),
        ];
        if let Some(secret) = &self.config.client_secret {
            form.push(("client_secret", secret));
        }
        if let Some(scope) = &self.config.scope {
            form.push(("scope", scope));
        }

        debug!("[OAuth] Refreshing upstream credentials");

        let response = self
            .http
            .post(&self.config.token_endpoint)
            .form(&form)
            .send()
            .await
            .map_err(|e| AuthError::UpstreamUnavailable(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            warn!(
                "[OAuth] Upstream token endpoint returned {}: {}",
                status,
                body.chars().take(200).collect::<String>()
            );
            return Err(AuthError::UpstreamUnavailable(format!(
                "token endpoint returned {}",
                status
            )));
        }

        response
            .json::<UpstreamTokenResponse>()
            .await
            .map_err(|e| AuthError::UpstreamUnavailable(format!("invalid token response: {}", e)))
    }
}
