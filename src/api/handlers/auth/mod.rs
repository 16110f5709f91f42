//! Session tokens, exchange codes, request gates and IP bans.
//!
//! ## Session Handshake
//!
//! A chat command calls [`issue_dashboard_link`], which mints a role-bearing
//! token and a one-time exchange code and renders the dashboard URL. The client
//! trades the code at `POST /v1/auth/exchange` and presents the token id on
//! every later request.
//!
//! ## Gates
//!
//! [`protect`] puts routes behind [`ban_guard`] and [`authenticate`];
//! [`admin_routes`] adds [`admin_only`] for mutating routes.
//!
//! ## Brute-force Mitigation
//!
//! - **Failure window:** failures older than the window are dropped on every access.
//! - **Ban:** reaching the limit bans the source IP and clears its history.
//! - **Ordering:** the ban check runs before credentials are read.

mod ban;
mod error;
pub(crate) mod exchange;
mod gate;
mod link;
pub(crate) mod links;
mod registry;
mod role;
pub(crate) mod session;
mod state;
mod sweeper;
pub mod types;
mod utils;

pub use ban::{BanConfig, BanTracker};
pub use error::AuthError;
pub use gate::{
    admin_only, admin_routes, authenticate, ban_guard, protect, AuthContext, AuthGate, AuthMode,
    GateConfig, SESSION_TOKEN_HEADER, SHARED_SECRET_HEADER,
};
pub use link::{issue_dashboard_link, DashboardLink, EXCHANGE_CODE_PARAM};
pub use registry::{SessionConfig, SweepReport, Token, TokenOwner, TokenRegistry};
pub use role::Role;
pub use state::AuthState;
