use clap::{Arg, ArgAction, ArgMatches, Command};
use secrecy::SecretString;

pub const ARG_SHARED_SECRET: &str = "shared-secret";
pub const ARG_DASHBOARD_URL: &str = "dashboard-url";
pub const ARG_TOKEN_TTL_MINUTES: &str = "token-ttl-minutes";
pub const ARG_FAIL_LIMIT: &str = "fail-limit";
pub const ARG_FAIL_WINDOW_SECONDS: &str = "fail-window-seconds";
pub const ARG_BAN_DURATION_SECONDS: &str = "ban-duration-seconds";
pub const ARG_TRUST_PROXY_HEADERS: &str = "trust-proxy-headers";

// Ten years, matching the cap applied by the session and ban configs.
const MAX_LIFETIME_SECONDS: u64 = 10 * 365 * 24 * 60 * 60;
const MAX_TOKEN_TTL_MINUTES: u64 = MAX_LIFETIME_SECONDS / 60;

#[derive(Debug)]
pub struct Options {
    pub shared_secret: SecretString,
    pub dashboard_url: String,
    pub token_ttl_minutes: u64,
    pub fail_limit: u32,
    pub fail_window_seconds: u64,
    pub ban_duration_seconds: u64,
    pub trust_proxy_headers: bool,
}

impl Options {
    /// Parse auth arguments from matches.
    ///
    /// # Errors
    /// Returns an error if required arguments are missing.
    pub fn parse(matches: &ArgMatches) -> anyhow::Result<Self> {
        // An empty secret is accepted and disables the shared-secret path.
        let shared_secret = matches
            .get_one::<String>(ARG_SHARED_SECRET)
            .cloned()
            .map(SecretString::from)
            .ok_or_else(|| anyhow::anyhow!("missing required argument: --{ARG_SHARED_SECRET}"))?;

        let dashboard_url = matches
            .get_one::<String>(ARG_DASHBOARD_URL)
            .cloned()
            .filter(|v| !v.trim().is_empty())
            .ok_or_else(|| anyhow::anyhow!("missing required argument: --{ARG_DASHBOARD_URL}"))?;

        Ok(Self {
            shared_secret,
            dashboard_url,
            token_ttl_minutes: matches
                .get_one::<u64>(ARG_TOKEN_TTL_MINUTES)
                .copied()
                .unwrap_or(60),
            fail_limit: matches.get_one::<u32>(ARG_FAIL_LIMIT).copied().unwrap_or(5),
            fail_window_seconds: matches
                .get_one::<u64>(ARG_FAIL_WINDOW_SECONDS)
                .copied()
                .unwrap_or(60),
            ban_duration_seconds: matches
                .get_one::<u64>(ARG_BAN_DURATION_SECONDS)
                .copied()
                .unwrap_or(900),
            trust_proxy_headers: matches.get_flag(ARG_TRUST_PROXY_HEADERS),
        })
    }
}

#[must_use]
pub fn with_args(command: Command) -> Command {
    let command = with_session_args(command);
    with_ban_args(command)
}

fn with_session_args(command: Command) -> Command {
    command
        .arg(
            Arg::new(ARG_SHARED_SECRET)
                .long(ARG_SHARED_SECRET)
                .help("Long-lived shared secret accepted in X-API-Key (empty disables it)")
                .env("DASHGATE_SHARED_SECRET")
                .hide_env_values(true)
                .required(true),
        )
        .arg(
            Arg::new(ARG_DASHBOARD_URL)
                .long(ARG_DASHBOARD_URL)
                .help("Dashboard URL that receives the exchange code")
                .env("DASHGATE_DASHBOARD_URL")
                .default_value("http://localhost:8080/"),
        )
        .arg(
            Arg::new(ARG_TOKEN_TTL_MINUTES)
                .long(ARG_TOKEN_TTL_MINUTES)
                .help("Session token lifetime in minutes (0 means 60)")
                .env("DASHGATE_TOKEN_TTL_MINUTES")
                .default_value("60")
                .value_parser(clap::value_parser!(u64).range(0..=MAX_TOKEN_TTL_MINUTES)),
        )
}

fn with_ban_args(command: Command) -> Command {
    command
        .arg(
            Arg::new(ARG_FAIL_LIMIT)
                .long(ARG_FAIL_LIMIT)
                .help("Failed authentications inside the window before an IP is banned")
                .env("DASHGATE_FAIL_LIMIT")
                .default_value("5")
                .value_parser(clap::value_parser!(u32)),
        )
        .arg(
            Arg::new(ARG_FAIL_WINDOW_SECONDS)
                .long(ARG_FAIL_WINDOW_SECONDS)
                .help("Sliding window for counting failures, in seconds")
                .env("DASHGATE_FAIL_WINDOW_SECONDS")
                .default_value("60")
                .value_parser(clap::value_parser!(u64).range(0..=MAX_LIFETIME_SECONDS)),
        )
        .arg(
            Arg::new(ARG_BAN_DURATION_SECONDS)
                .long(ARG_BAN_DURATION_SECONDS)
                .help("How long a banned IP stays banned, in seconds")
                .env("DASHGATE_BAN_DURATION_SECONDS")
                .default_value("900")
                .value_parser(clap::value_parser!(u64).range(0..=MAX_LIFETIME_SECONDS)),
        )
        .arg(
            Arg::new(ARG_TRUST_PROXY_HEADERS)
                .long(ARG_TRUST_PROXY_HEADERS)
                .help("Take the client IP from X-Forwarded-For / X-Real-IP")
                .env("DASHGATE_TRUST_PROXY_HEADERS")
                .action(ArgAction::SetTrue),
        )
}
