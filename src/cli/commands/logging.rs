//! Log verbosity: a repeatable `-v` count and a named `--log-level`.
//!
//! Both resolve to the same 0..=4 scale; the louder one wins.

use clap::{builder::ValueParser, Arg, ArgAction, ArgMatches, Command};
use tracing::Level;

pub const ARG_VERBOSITY: &str = "verbosity";
pub const ARG_LOG_LEVEL: &str = "log-level";

// Position is the verbosity count.
const LEVEL_NAMES: [&str; 5] = ["error", "warn", "info", "debug", "trace"];

fn parse_level(value: &str) -> Result<u8, String> {
    let value = value.trim();
    let position = match value.parse::<usize>() {
        Ok(count) => (count < LEVEL_NAMES.len()).then_some(count),
        Err(_) => LEVEL_NAMES
            .iter()
            .position(|name| name.eq_ignore_ascii_case(value)),
    };
    position
        .and_then(|count| u8::try_from(count).ok())
        .ok_or_else(|| {
            format!(
                "unknown log level `{value}`; use 0-4 or one of {}",
                LEVEL_NAMES.join(", ")
            )
        })
}

/// Tracing level for a verbosity count. `None` leaves the ERROR default.
#[must_use]
pub const fn tracing_level(verbosity: u8) -> Option<Level> {
    match verbosity {
        0 => None,
        1 => Some(Level::WARN),
        2 => Some(Level::INFO),
        3 => Some(Level::DEBUG),
        _ => Some(Level::TRACE),
    }
}

/// Effective verbosity from parsed matches.
#[must_use]
pub fn verbosity(matches: &ArgMatches) -> u8 {
    let named = matches.get_one::<u8>(ARG_LOG_LEVEL).copied().unwrap_or(0);
    matches.get_count(ARG_VERBOSITY).max(named)
}

#[must_use]
pub fn with_args(command: Command) -> Command {
    command
        .arg(
            Arg::new(ARG_VERBOSITY)
                .short('v')
                .long("verbose")
                .help("Raise log verbosity, up to -vvvv for TRACE")
                .global(true)
                .action(ArgAction::Count),
        )
        .arg(
            Arg::new(ARG_LOG_LEVEL)
                .long("log-level")
                .value_name("LEVEL")
                .help("Log level by name or number: error, warn, info, debug, trace")
                .env("DASHGATE_LOG_LEVEL")
                .global(true)
                .value_parser(ValueParser::new(parse_level)),
        )
}
