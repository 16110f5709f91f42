//! Small helpers for identifier generation, secret comparison and client IPs.

use axum::{extract::ConnectInfo, http::HeaderMap};
use base64ct::{Base64UrlUnpadded, Encoding};
use rand::{rngs::OsRng, RngCore};
use sha2::{Digest, Sha256};
use std::net::SocketAddr;
use std::time::Duration;
use subtle::ConstantTimeEq;
use tokio::time::Instant;

/// Bytes of entropy behind a session token id.
pub(crate) const TOKEN_ID_BYTES: usize = 32;
/// Bytes of entropy behind an exchange code.
pub(crate) const EXCHANGE_CODE_BYTES: usize = 16;

/// Bucket used when no source address can be determined.
pub(crate) const UNKNOWN_CLIENT_IP: &str = "unknown";

/// Upper bound for every configured lifetime (token TTL, ban duration, window).
pub(crate) const MAX_LIFETIME: Duration = Duration::from_secs(10 * 365 * 24 * 60 * 60);

/// `now + ttl` without overflowing the platform clock.
///
/// `ttl` is capped at `MAX_LIFETIME`; if the clock still cannot represent the
/// sum the offset is halved until it can, so the result is never before `now`.
pub(crate) fn deadline_after(now: Instant, ttl: Duration) -> Instant {
    let mut offset = ttl.min(MAX_LIFETIME);
    loop {
        if let Some(deadline) = now.checked_add(offset) {
            return deadline;
        }
        offset /= 2;
    }
}

/// Create an opaque URL-safe identifier from the OS random source.
pub(crate) fn generate_random_id(len: usize) -> Result<String, rand::Error> {
    let mut bytes = vec![0u8; len];
    OsRng.try_fill_bytes(&mut bytes)?;
    Ok(Base64UrlUnpadded::encode_string(&bytes))
}

/// Fixed-length digest of a secret so comparisons do not depend on its length.
pub(crate) fn hash_secret(secret: &str) -> [u8; 32] {
    let mut hasher = Sha256::new();
    hasher.update(secret.as_bytes());
    hasher.finalize().into()
}

/// Constant-time comparison of a presented secret against a stored digest.
pub(crate) fn secret_matches(presented: &str, expected_digest: &[u8; 32]) -> bool {
    let presented_digest = hash_secret(presented);
    bool::from(presented_digest.as_slice().ct_eq(expected_digest.as_slice()))
}

/// Resolve the source IP used for failure counting and bans.
///
/// Proxy headers are only honoured when explicitly trusted; otherwise any
/// client could pick its own ban bucket.
pub(crate) fn client_ip(
    headers: &HeaderMap,
    peer: Option<&ConnectInfo<SocketAddr>>,
    trust_proxy_headers: bool,
) -> String {
    if trust_proxy_headers {
        if let Some(ip) = forwarded_ip(headers) {
            return ip;
        }
    }
    peer.map_or_else(
        || UNKNOWN_CLIENT_IP.to_string(),
        |ConnectInfo(addr)| addr.ip().to_string(),
    )
}

fn forwarded_ip(headers: &HeaderMap) -> Option<String> {
    let forwarded = headers
        .get("x-forwarded-for")
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.split(',').next())
        .map(str::trim)
        .filter(|value| !value.is_empty());
    if forwarded.is_some() {
        return forwarded.map(str::to_string);
    }
    headers
        .get("x-real-ip")
        .and_then(|value| value.to_str().ok())
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .map(str::to_string)
}
