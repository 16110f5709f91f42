use crate::cli::{
    actions::Action,
    commands::{self, logging},
    dispatch, telemetry,
};
use anyhow::Result;

/// Parse the command line, start telemetry and build the action to run.
///
/// # Errors
///
/// Returns an error if telemetry cannot start or the arguments do not describe
/// a runnable server.
pub fn start() -> Result<Action> {
    let matches = commands::new().get_matches();

    telemetry::init(logging::tracing_level(logging::verbosity(&matches)))?;

    dispatch::handler(&matches)
}
