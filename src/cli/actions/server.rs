use crate::api::{
    self,
    handlers::auth::{AuthState, BanConfig, GateConfig, SessionConfig},
};
use anyhow::{Context, Result};
use secrecy::{ExposeSecret, SecretString};
use std::{sync::Arc, time::Duration};
use tracing::{info, warn};
use url::Url;

#[derive(Debug)]
pub struct Args {
    pub port: u16,
    pub shared_secret: SecretString,
    pub dashboard_url: String,
    pub token_ttl_minutes: u64,
    pub fail_limit: u32,
    pub fail_window_seconds: u64,
    pub ban_duration_seconds: u64,
    pub trust_proxy_headers: bool,
}

impl Args {
    /// Build the auth state described by these arguments.
    ///
    /// # Errors
    /// Returns an error if the dashboard URL is not a valid absolute URL.
    pub fn auth_state(&self) -> Result<AuthState> {
        let dashboard_url = Url::parse(&self.dashboard_url)
            .with_context(|| format!("Invalid dashboard URL: {}", self.dashboard_url))?;

        let session = SessionConfig::new().with_token_ttl_minutes(self.token_ttl_minutes);
        let bans = BanConfig::new()
            .with_fail_limit(self.fail_limit)
            .with_fail_window(Duration::from_secs(self.fail_window_seconds))
            .with_ban_duration(Duration::from_secs(self.ban_duration_seconds));
        let gate = GateConfig::new(self.shared_secret.clone())
            .with_trust_proxy_headers(self.trust_proxy_headers);

        Ok(AuthState::new(session, bans, &gate, dashboard_url))
    }
}

/// Execute the server action.
/// # Errors
/// Returns an error if the configuration is invalid or the server fails to start.
pub async fn execute(args: Args) -> Result<()> {
    log_startup_args(&args);

    let auth_state = Arc::new(args.auth_state()?);
    auth_state.spawn_sweepers();

    api::new(args.port, auth_state).await
}

fn log_startup_args(args: &Args) {
    info!(
        port = args.port,
        dashboard_url = %args.dashboard_url,
        token_ttl_minutes = args.token_ttl_minutes,
        fail_limit = args.fail_limit,
        fail_window_seconds = args.fail_window_seconds,
        ban_duration_seconds = args.ban_duration_seconds,
        trust_proxy_headers = args.trust_proxy_headers,
        "starting dashgate"
    );
    if args.shared_secret.expose_secret().is_empty() {
        warn!("shared secret is empty: X-API-Key authentication is disabled");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(dashboard_url: &str) -> Args {
        Args {
            port: 8080,
            shared_secret: SecretString::from("secret".to_string()),
            dashboard_url: dashboard_url.to_string(),
            token_ttl_minutes: 0,
            fail_limit: 0,
            fail_window_seconds: 30,
            ban_duration_seconds: 120,
            trust_proxy_headers: true,
        }
    }

    #[tokio::test]
    async fn auth_state_applies_arguments() -> Result<()> {
        let state = args("https://dash.example.com/").auth_state()?;
        assert_eq!(
            state.registry().config().token_ttl(),
            Duration::from_secs(60 * 60)
        );
        assert_eq!(state.bans().config().fail_limit(), 1);
        assert_eq!(
            state.bans().config().fail_window(),
            Duration::from_secs(30)
        );
        assert_eq!(
            state.bans().config().ban_duration(),
            Duration::from_secs(120)
        );
        Ok(())
    }

    #[test]
    fn auth_state_rejects_relative_dashboard_url() {
        assert!(args("/dashboard").auth_state().is_err());
    }
}
