use std::time::{Duration, SystemTime, UNIX_EPOCH};

use base64::Engine;
use base64::engine::general_purpose::STANDARD;

#[derive(serde::Deserialize)]
struct TokenClaims {
    exp: Option<u64>,
}

/// Reads the `exp` claim out of a bearer token without verifying it.
///
/// The token must be three dot-separated segments; the middle segment is
/// base64url-encoded JSON. Any deviation (segment count, base64, JSON,
/// missing claim) yields `None` rather than an error — callers fall back to
/// a default TTL.
pub fn decode_expiry(token: &str) -> Option<SystemTime> {
    let mut segments = token.split('.');
    let payload = match (
        segments.next(),
        segments.next(),
        segments.next(),
        segments.next(),
    ) {
        (Some(header), Some(payload), Some(signature), None)
            if !header.is_empty() && !signature.is_empty() =>
        {
            payload
        }
        _ => return None,
    };

    // Translate URL-safe characters back to standard base64 and pad to a
    // multiple of four before decoding.
    let mut normalized: String = payload
        .chars()
        .map(|c| match c {
            '-' => '+',
            '_' => '/',
            other => other,
        })
        .collect();
    while normalized.len() % 4 != 0 {
        normalized.push('=');
    }

    let bytes = STANDARD.decode(normalized).ok()?;
    let claims: TokenClaims = serde_json::from_slice(&bytes).ok()?;
    let exp_secs = claims.exp?;
    Some(UNIX_EPOCH + Duration::from_secs(exp_secs))
}

/// Absolute expiry for a freshly issued token: the decoded `exp` claim when
/// it lies in the future, else `now + fallback_ttl`.
pub fn expiration_time(token: &str, now: SystemTime, fallback_ttl: Duration) -> SystemTime {
    match decode_expiry(token) {
        Some(expires_at) if expires_at > now => expires_at,
        _ => now + fallback_ttl,
    }
}
