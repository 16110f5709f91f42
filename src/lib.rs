//! # Dashgate (Dashboard Session & Access Control)
//!
//! `dashgate` guards the download dashboard that users reach from the chat bot.
//! It issues short-lived session tokens, trades them for one-time exchange codes,
//! authenticates every protected request and bans source IPs that keep guessing.
//!
//! ## Session Tokens
//!
//! A chat command mints a token bound to a fixed role (`admin` or `viewer`) and a
//! one-time exchange code. The user receives a dashboard URL carrying only the
//! code; the dashboard trades it once at `POST /v1/auth/exchange` for the token id
//! and presents that id on every following request.
//!
//! - **Exchange codes** live for one minute and are consumed by the first lookup,
//!   successful or not.
//! - **Tokens** expire after the configured TTL (60 minutes by default). Expired
//!   entries are dropped lazily on lookup and by a periodic sweep.
//!
//! ## Authentication
//!
//! Protected routes accept either a session token (`X-Session-Token` or
//! `Authorization: Bearer`) or the long-lived shared secret (`X-API-Key`). A
//! presented session token is never retried against the shared secret.
//! Shared-secret requests always act as `admin`.
//!
//! ## Brute-force Mitigation
//!
//! Every failed authentication is recorded per source IP. Reaching the failure
//! limit inside the trailing window bans the IP for the configured duration, and
//! banned IPs are rejected before their credentials are looked at.

pub mod api;
pub mod cli;

#[allow(clippy::doc_markdown, clippy::needless_raw_string_hashes)]
pub mod built_info {
    include!(concat!(env!("OUT_DIR"), "/built.rs"));
}

pub const GIT_COMMIT_HASH: &str = match built_info::GIT_COMMIT_HASH {
    Some(hash) => hash,
    None => "unknown",
};
