//! Command-line argument dispatch.
//!
//! Maps validated CLI matches to an action, such as starting the API server
//! with its session and ban configuration.

use crate::cli::actions::{server::Args, Action};
use crate::cli::commands::{auth, ARG_PORT};
use anyhow::Result;

/// Map validated CLI matches to a server action.
///
/// # Errors
/// Returns an error if required arguments are missing.
pub fn handler(matches: &clap::ArgMatches) -> Result<Action> {
    let port = matches.get_one::<u16>(ARG_PORT).copied().unwrap_or(8080);
    let auth_opts = auth::Options::parse(matches)?;

    Ok(Action::Server(Args {
        port,
        shared_secret: auth_opts.shared_secret,
        dashboard_url: auth_opts.dashboard_url,
        token_ttl_minutes: auth_opts.token_ttl_minutes,
        fail_limit: auth_opts.fail_limit,
        fail_window_seconds: auth_opts.fail_window_seconds,
        ban_duration_seconds: auth_opts.ban_duration_seconds,
        trust_proxy_headers: auth_opts.trust_proxy_headers,
    }))
}
