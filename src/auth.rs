//! Authentication
//!
//! Verifies HTTP Basic credentials against an endpoint's configured users.
//! Only the yes/no verdict leaves this module; the challenge header is
//! attached where the error is turned into a response.

use axum::http::HeaderMap;
use axum::http::header::AUTHORIZATION;
use base64::Engine;
use base64::engine::general_purpose::STANDARD;

use crate::config::AuthRule;

/// Check the request's credentials against the endpoint's auth rule.
///
/// An absent rule (or one with no users) means the endpoint is open.
pub fn authenticate(headers: &HeaderMap, rule: Option<&AuthRule>) -> bool {
    let Some(rule) = rule else {
        return true;
    };
    if rule.users.is_empty() {
        return true;
    }

    let Some((name, password)) = decode_basic(headers) else {
        return false;
    };

    rule.users
        .iter()
        .any(|user| user.name == name && user.password == password)
}

/// Decode an `Authorization: Basic` header into a name/password pair.
fn decode_basic(headers: &HeaderMap) -> Option<(String, String)> {
    let value = headers.get(AUTHORIZATION)?.to_str().ok()?;
    let encoded = value.strip_prefix("Basic ")?;
    let decoded = STANDARD.decode(encoded.trim()).ok()?;
    let decoded = String::from_utf8(decoded).ok()?;
    let (name, password) = decoded.split_once(':')?;
    Some((name.to_string(), password.to_string()))
}
