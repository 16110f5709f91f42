//! API handlers for Dashgate.
//!
//! `auth` owns the session registry, IP bans and request gates; `health` is
//! the unauthenticated liveness probe.

pub mod auth;
pub mod health;
