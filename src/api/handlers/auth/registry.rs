//! In-memory registry of session tokens and one-time exchange codes.
//!
//! Flow Overview:
//! 1) A chat command mints a token (`issue_token`) and an exchange code for it
//!    (`issue_exchange_code`).
//! 2) The dashboard trades the code once (`exchange_code`) for the token id.
//! 3) Every protected request resolves the token id (`validate_token`).
//!
//! Both maps sit behind one lock. Expired entries are dropped by whichever
//! reader sees them first and by a periodic sweep. Nothing survives a restart.

use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;
use tracing::{debug, info};

use super::{
    error::AuthError,
    role::Role,
    sweeper::Sweeper,
    utils::{
        deadline_after, generate_random_id, EXCHANGE_CODE_BYTES, MAX_LIFETIME, TOKEN_ID_BYTES,
    },
};

const DEFAULT_TOKEN_TTL_MINUTES: u64 = 60;
const DEFAULT_EXCHANGE_CODE_TTL: Duration = Duration::from_secs(60);
const DEFAULT_SWEEP_INTERVAL: Duration = Duration::from_secs(5 * 60);

#[derive(Clone, Debug)]
pub struct SessionConfig {
    token_ttl: Duration,
    exchange_code_ttl: Duration,
    sweep_interval: Duration,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self::new()
    }
}

impl SessionConfig {
    #[must_use]
    pub fn new() -> Self {
        Self {
            token_ttl: Duration::from_secs(DEFAULT_TOKEN_TTL_MINUTES * 60),
            exchange_code_ttl: DEFAULT_EXCHANGE_CODE_TTL,
            sweep_interval: DEFAULT_SWEEP_INTERVAL,
        }
    }

    /// Token lifetime in minutes; zero falls back to the default.
    #[must_use]
    pub fn with_token_ttl_minutes(self, minutes: u64) -> Self {
        let minutes = if minutes == 0 {
            DEFAULT_TOKEN_TTL_MINUTES
        } else {
            minutes
        };
        self.with_token_ttl(Duration::from_secs(minutes.saturating_mul(60)))
    }

    /// Token lifetime, capped at `MAX_LIFETIME`; zero keeps the current value.
    #[must_use]
    pub fn with_token_ttl(mut self, ttl: Duration) -> Self {
        if !ttl.is_zero() {
            self.token_ttl = ttl.min(MAX_LIFETIME);
        }
        self
    }

    #[must_use]
    pub fn with_exchange_code_ttl(mut self, ttl: Duration) -> Self {
        self.exchange_code_ttl = ttl.min(MAX_LIFETIME);
        self
    }

    #[must_use]
    pub fn with_sweep_interval(mut self, interval: Duration) -> Self {
        if !interval.is_zero() {
            self.sweep_interval = interval;
        }
        self
    }

    #[must_use]
    pub fn token_ttl(&self) -> Duration {
        self.token_ttl
    }

    #[must_use]
    pub fn exchange_code_ttl(&self) -> Duration {
        self.exchange_code_ttl
    }

    #[must_use]
    pub fn sweep_interval(&self) -> Duration {
        self.sweep_interval
    }
}

/// Chat-platform identity a token is minted for.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct TokenOwner {
    pub user_id: i64,
    pub username: String,
    pub first_name: String,
}

impl TokenOwner {
    #[must_use]
    pub fn new(user_id: i64, username: impl Into<String>, first_name: impl Into<String>) -> Self {
        Self {
            user_id,
            username: username.into(),
            first_name: first_name.into(),
        }
    }
}

#[derive(Clone, Debug)]
pub struct Token {
    id: String,
    owner: TokenOwner,
    role: Role,
    created_at: Instant,
    expires_at: Instant,
}

impl Token {
    #[must_use]
    pub fn id(&self) -> &str {
        &self.id
    }

    #[must_use]
    pub fn owner(&self) -> &TokenOwner {
        &self.owner
    }

    #[must_use]
    pub fn role(&self) -> Role {
        self.role
    }

    #[must_use]
    pub fn created_at(&self) -> Instant {
        self.created_at
    }

    #[must_use]
    pub fn expires_at(&self) -> Instant {
        self.expires_at
    }

    #[must_use]
    pub fn is_expired_at(&self, now: Instant) -> bool {
        now >= self.expires_at
    }

    /// Time left before expiry, zero once expired.
    #[must_use]
    pub fn remaining(&self) -> Duration {
        self.expires_at.saturating_duration_since(Instant::now())
    }
}

#[derive(Debug)]
struct ExchangeCode {
    token_id: String,
    expires_at: Instant,
}

#[derive(Debug, Default)]
struct RegistryState {
    tokens: HashMap<String, Token>,
    codes: HashMap<String, ExchangeCode>,
}

impl RegistryState {
    fn purge_expired(&mut self, now: Instant) -> SweepReport {
        let tokens_before = self.tokens.len();
        let codes_before = self.codes.len();
        self.tokens.retain(|_, token| !token.is_expired_at(now));
        self.codes.retain(|_, code| now < code.expires_at);
        SweepReport {
            tokens: tokens_before - self.tokens.len(),
            codes: codes_before - self.codes.len(),
        }
    }
}

/// Entries removed by a sweep.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct SweepReport {
    pub tokens: usize,
    pub codes: usize,
}

#[derive(Debug)]
pub struct TokenRegistry {
    config: SessionConfig,
    state: Arc<Mutex<RegistryState>>,
    sweeper: Sweeper,
}

impl TokenRegistry {
    #[must_use]
    pub fn new(config: SessionConfig) -> Self {
        Self {
            config,
            state: Arc::new(Mutex::new(RegistryState::default())),
            sweeper: Sweeper::default(),
        }
    }

    #[must_use]
    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// Start the periodic sweep on the current tokio runtime.
    pub fn spawn_sweeper(&self) {
        let state = Arc::clone(&self.state);
        self.sweeper
            .spawn("token_registry", self.config.sweep_interval(), move || {
                let report = state.lock().purge_expired(Instant::now());
                if report != SweepReport::default() {
                    debug!(
                        tokens = report.tokens,
                        codes = report.codes,
                        "purged expired sessions"
                    );
                }
            });
    }

    /// Stop the periodic sweep. Safe to call repeatedly.
    pub fn stop(&self) {
        self.sweeper.stop();
    }

    /// Mint a session token for `owner`; the role is Admin iff `is_admin`.
    ///
    /// # Errors
    /// Returns `AuthError::Randomness` if the OS random source fails.
    pub fn issue_token(&self, owner: TokenOwner, is_admin: bool) -> Result<String, AuthError> {
        let id = generate_random_id(TOKEN_ID_BYTES)?;
        let now = Instant::now();
        let token = Token {
            id: id.clone(),
            role: Role::from_admin_flag(is_admin),
            created_at: now,
            expires_at: deadline_after(now, self.config.token_ttl()),
            owner,
        };
        info!(
            user_id = token.owner.user_id,
            role = %token.role,
            "issued session token"
        );
        self.state.lock().tokens.insert(id.clone(), token);
        Ok(id)
    }

    /// Mint a one-time exchange code for an existing token.
    ///
    /// Only presence is checked; a token that expires before its code is
    /// redeemed is rejected later by `validate_token`.
    ///
    /// # Errors
    /// Returns `AuthError::NotFound` if `token_id` is not in the registry, or
    /// `AuthError::Randomness` if the OS random source fails.
    pub fn issue_exchange_code(&self, token_id: &str) -> Result<String, AuthError> {
        if !self.state.lock().tokens.contains_key(token_id) {
            return Err(AuthError::NotFound);
        }
        let code = generate_random_id(EXCHANGE_CODE_BYTES)?;
        let entry = ExchangeCode {
            token_id: token_id.to_string(),
            expires_at: deadline_after(Instant::now(), self.config.exchange_code_ttl()),
        };

        let mut state = self.state.lock();
        // Revoked between the check and now: mint nothing.
        if !state.tokens.contains_key(token_id) {
            return Err(AuthError::NotFound);
        }
        state.codes.insert(code.clone(), entry);
        Ok(code)
    }

    /// Trade an exchange code for its token id.
    ///
    /// The code is removed before anything else is checked, so a second call
    /// with the same code always returns `None`. Unknown and elapsed codes are
    /// reported identically.
    pub fn exchange_code(&self, code: &str) -> Option<String> {
        let entry = self.state.lock().codes.remove(code)?;
        if Instant::now() >= entry.expires_at {
            return None;
        }
        Some(entry.token_id)
    }

    /// Resolve a token id, dropping it if it has expired.
    pub fn validate_token(&self, token_id: &str) -> Option<Token> {
        let now = Instant::now();
        let mut state = self.state.lock();
        let expired = state.tokens.get(token_id)?.is_expired_at(now);
        if expired {
            state.tokens.remove(token_id);
            return None;
        }
        state.tokens.get(token_id).cloned()
    }

    /// Remove a token. No-op if absent.
    pub fn revoke_token(&self, token_id: &str) {
        if self.state.lock().tokens.remove(token_id).is_some() {
            debug!("revoked session token");
        }
    }

    /// Remove every expired token and exchange code now.
    pub fn sweep(&self) -> SweepReport {
        self.state.lock().purge_expired(Instant::now())
    }

    #[must_use]
    pub fn token_count(&self) -> usize {
        self.state.lock().tokens.len()
    }

    #[must_use]
    pub fn code_count(&self) -> usize {
        self.state.lock().codes.len()
    }
}

impl Drop for TokenRegistry {
    fn drop(&mut self) {
        self.stop();
    }
}
