//! User identity derived from the out-of-band auth token

use anyhow::{Context, Result};
use base64::Engine;
use chrono::Utc;
use serde::Deserialize;
use tracing::warn;

#[derive(Debug, Deserialize)]
struct Claims {
    sub: Option<serde_json::Value>,
}

/// Extract the `sub` claim from a JWT without verifying its signature.
/// Verification is the backend's job; the client only needs the subject.
pub fn subject_from_token(token: &str) -> Result<Option<String>> {
    let payload = token
        .split('.')
        .nth(1)
        .context("token is not a JWT (missing payload segment)")?;
    let bytes = base64::engine::general_purpose::URL_SAFE_NO_PAD
        .decode(payload.trim_end_matches('='))
        .context("JWT payload is not base64url")?;
    let claims: Claims = serde_json::from_slice(&bytes).context("JWT payload is not JSON")?;

    let subject = match claims.sub {
        Some(serde_json::Value::String(sub)) => Some(sub),
        Some(serde_json::Value::Number(sub)) => Some(sub.to_string()),
        Some(other) => {
            warn!("Ignoring non-scalar JWT subject: {}", other);
            None
        }
        None => None,
    };
    Ok(subject.filter(|sub| !sub.is_empty()))
}

/// `anon_<epoch ms>_<9 random chars>`
pub fn anonymous_user_id() -> String {
    let random = uuid::Uuid::new_v4().simple().to_string();
    format!("anon_{}_{}", Utc::now().timestamp_millis(), &random[..9])
}

/// The token subject when present, an anonymous id otherwise
pub fn resolve_user_id(token: Option<&str>) -> String {
    match token.map(subject_from_token) {
        Some(Ok(Some(sub))) => sub,
        Some(Ok(None)) => anonymous_user_id(),
        Some(Err(e)) => {
            warn!("Could not read subject from auth token: {:#}", e);
            anonymous_user_id()
        }
        None => anonymous_user_id(),
    }
}
