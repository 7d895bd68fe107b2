//! Role-claim extraction from an upstream JWT payload.
//!
//! The upstream IdP already authenticated these tokens; this module only
//! reads claims out of the payload segment, without signature verification.
//! Two shapes are understood: a plain `roles` array, and the nested
//! `realm_access.roles` array some providers emit.

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
use serde_json::Value;
use tracing::debug;

/// Decode the payload segment of a JWT without verifying the signature.
///
/// Returns `None` for anything that is not three dot-separated base64url
/// segments with a JSON object in the middle.
pub fn decode_payload(jwt: &str) -> Option<Value> {
    let mut parts = jwt.split('.');
    let (_header, payload, _sig) = (parts.next()?, parts.next()?, parts.next()?);
    if parts.next().is_some() {
        return None;
    }

    let bytes = URL_SAFE_NO_PAD.decode(payload).ok()?;
    serde_json::from_slice(&bytes).ok()
}

/// Pull role names out of a decoded JWT payload.
///
/// Unknown shapes yield an empty list, never an error — a token without
/// roles is a valid token.
pub fn extract_roles(payload: &Value) -> Vec<String> {
    if let Some(roles) = payload.get("roles").and_then(Value::as_array) {
        return string_items(roles);
    }

    if let Some(roles) = payload
        .pointer("/realm_access/roles")
        .and_then(Value::as_array)
    {
        return string_items(roles);
    }

    debug!("[OAuth] No recognized roles claim in upstream token");
    Vec::new()
}

/// Convenience: decode then extract in one step.
pub fn roles_from_jwt(jwt: &str) -> Vec<String> {
    decode_payload(jwt)
        .map(|payload| extract_roles(&payload))
        .unwrap_or_default()
}

fn string_items(values: &[Value]) -> Vec<String> {
    values
        .iter()
        .filter_map(Value::as_str)
        .map(String::from)
        .collect()
}
