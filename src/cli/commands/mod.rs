pub mod auth;
pub mod logging;

use clap::{
    builder::styling::{AnsiColor, Effects, Styles},
    Arg, ColorChoice, Command,
};

pub const ARG_PORT: &str = "port";

#[must_use]
pub fn new() -> Command {
    let styles = Styles::styled()
        .header(AnsiColor::Yellow.on_default() | Effects::BOLD)
        .usage(AnsiColor::Green.on_default() | Effects::BOLD)
        .literal(AnsiColor::Blue.on_default() | Effects::BOLD)
        .placeholder(AnsiColor::Green.on_default());

    let long_version: &'static str = Box::leak(
        format!("{} - {}", env!("CARGO_PKG_VERSION"), crate::GIT_COMMIT_HASH).into_boxed_str(),
    );

    let command = Command::new("dashgate")
        .about("Session and access control for the download dashboard")
        .version(env!("CARGO_PKG_VERSION"))
        .long_version(long_version)
        .color(ColorChoice::Auto)
        .styles(styles)
        .arg(
            Arg::new(ARG_PORT)
                .short('p')
                .long("port")
                .help("Port to listen on")
                .default_value("8080")
                .env("DASHGATE_PORT")
                .value_parser(clap::value_parser!(u16)),
        );

    let command = auth::with_args(command);
    logging::with_args(command)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new() {
        let command = new();

        assert_eq!(command.get_name(), "dashgate");
        assert_eq!(
            command.get_about().map(ToString::to_string),
            Some("Session and access control for the download dashboard".to_string())
        );
        assert_eq!(
            command.get_version().map(ToString::to_string),
            Some(env!("CARGO_PKG_VERSION").to_string())
        );
    }

    #[test]
    fn test_check_port() {
        temp_env::with_vars([("DASHGATE_PORT", None::<&str>)], || {
            let matches = new().get_matches_from(vec![
                "dashgate",
                "--port",
                "9090",
                "--shared-secret",
                "secret",
            ]);
            assert_eq!(matches.get_one::<u16>(ARG_PORT).copied(), Some(9090));
        });
    }

    #[test]
    fn test_check_env() {
        temp_env::with_vars(
            [
                ("DASHGATE_PORT", Some("443")),
                ("DASHGATE_SHARED_SECRET", Some("secret")),
                ("DASHGATE_LOG_LEVEL", Some("info")),
            ],
            || {
                let matches = new().get_matches_from(vec!["dashgate"]);
                assert_eq!(matches.get_one::<u16>(ARG_PORT).copied(), Some(443));
                assert_eq!(logging::verbosity(&matches), 2);
            },
        );
    }

    #[test]
    fn verbose_flag_is_global() {
        temp_env::with_vars(
            [
                ("DASHGATE_LOG_LEVEL", None::<&str>),
                ("DASHGATE_SHARED_SECRET", Some("secret")),
            ],
            || {
                let matches = new().get_matches_from(vec!["dashgate", "-vvvv", "--port", "9000"]);
                assert_eq!(logging::verbosity(&matches), 4);
                assert_eq!(
                    logging::tracing_level(logging::verbosity(&matches)),
                    Some(tracing::Level::TRACE)
                );
            },
        );
    }
}
