//! Auth state shared by the gate middleware and the auth handlers.

use std::sync::Arc;
use url::Url;

use super::{
    ban::{BanConfig, BanTracker},
    gate::{AuthGate, GateConfig},
    registry::{SessionConfig, TokenRegistry},
};

#[derive(Debug)]
pub struct AuthState {
    gate: Arc<AuthGate>,
    dashboard_url: Url,
}

impl AuthState {
    #[must_use]
    pub fn new(
        session: SessionConfig,
        bans: BanConfig,
        gate: &GateConfig,
        dashboard_url: Url,
    ) -> Self {
        let registry = Arc::new(TokenRegistry::new(session));
        let bans = Arc::new(BanTracker::new(bans));
        Self {
            gate: Arc::new(AuthGate::new(gate, registry, bans)),
            dashboard_url,
        }
    }

    /// Start the registry and ban tracker sweeps on the current runtime.
    pub fn spawn_sweepers(&self) {
        self.gate.registry().spawn_sweeper();
        self.gate.bans().spawn_sweeper();
    }

    /// Stop both sweeps. Safe to call repeatedly.
    pub fn shutdown(&self) {
        self.gate.registry().stop();
        self.gate.bans().stop();
    }

    #[must_use]
    pub fn gate(&self) -> &Arc<AuthGate> {
        &self.gate
    }

    #[must_use]
    pub fn registry(&self) -> &TokenRegistry {
        self.gate.registry()
    }

    #[must_use]
    pub fn bans(&self) -> &BanTracker {
        self.gate.bans()
    }

    #[must_use]
    pub fn dashboard_url(&self) -> &Url {
        &self.dashboard_url
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use secrecy::SecretString;
    use std::time::Duration;

    #[tokio::test]
    async fn auth_state_wires_components() -> anyhow::Result<()> {
        let state = AuthState::new(
            SessionConfig::new().with_token_ttl_minutes(5),
            BanConfig::new().with_fail_limit(3),
            &GateConfig::new(SecretString::from("secret".to_string())),
            Url::parse("https://dash.example.com/")?,
        );
        assert_eq!(
            state.registry().config().token_ttl(),
            Duration::from_secs(300)
        );
        assert_eq!(state.bans().config().fail_limit(), 3);
        assert_eq!(state.dashboard_url().as_str(), "https://dash.example.com/");

        state.spawn_sweepers();
        state.shutdown();
        state.shutdown();
        Ok(())
    }
}
