//! Upstream credential-refresh protocol.
//!
//! Downstream tokens issued by this server outlive the upstream IdP's
//! access tokens. When a proxied call comes back 401 with an expiry-shaped
//! body, the gateway refreshes the upstream pair and retries the call once,
//! invisibly to the downstream client.

mod refresh;
mod token_client;

pub use refresh::{RefreshingClient, UpstreamResponse};
pub use token_client::{UpstreamTokenClient, UpstreamTokenResponse};

/// Substrings in an upstream error message that mean "token expired".
const EXPIRY_MESSAGE_MARKERS: &[&str] = &[
    "token is expired",
    "Lifetime validation failed",
    "80049228",
];

/// Decide whether a 401 body is an expired-token signal (refresh and retry)
/// as opposed to a genuine authorization failure (surface unchanged).
///
/// A body that does not parse as JSON counts as a signal: upstreams that
/// return bare 401s still deserve one refresh attempt.
pub(crate) fn is_expiry_signal(body: &[u8]) -> bool {
    let parsed: serde_json::Value = match serde_json::from_slice(body) {
        Ok(v) => v,
        Err(_) => return true,
    };

    let error = &parsed["error"];

    if error["code"].as_str() == Some("InvalidAuthenticationToken") {
        return true;
    }

    if let Some(message) = error["message"].as_str() {
        if EXPIRY_MESSAGE_MARKERS.iter().any(|m| message.contains(m)) {
            return true;
        }
    }

    false
}
