//! Request gates: ban guard, authentication and admin-only authorization.
//!
//! Flow Overview (per protected request, in this order):
//! 1) `ban_guard` rejects banned source IPs before credentials are read.
//! 2) `authenticate` resolves a session token (`X-Session-Token`, else
//!    `Authorization: Bearer`) or, only when no token was presented, the shared
//!    secret (`X-API-Key`). Failures are recorded against the source IP.
//! 3) `admin_only` (mutating routes) lets shared-secret and Admin requests
//!    through; Viewers get 403 and no failure is recorded.
//!
//! Security boundaries: a presented session token is never retried against the
//! shared secret, the shared secret is compared as a SHA-256 digest in constant
//! time, and rejections never say which credential failed.

use axum::{
    extract::{ConnectInfo, Request, State},
    http::{header::AUTHORIZATION, HeaderMap},
    middleware::{self, Next},
    response::{IntoResponse, Response},
    Router,
};
use secrecy::{ExposeSecret, SecretString};
use std::net::SocketAddr;
use std::sync::Arc;
use tracing::{debug, warn};

use super::{
    ban::BanTracker,
    error::AuthError,
    registry::{Token, TokenRegistry},
    role::Role,
    types::AuthModeKind,
    utils::{client_ip, hash_secret, secret_matches},
};

pub const SESSION_TOKEN_HEADER: &str = "x-session-token";
pub const SHARED_SECRET_HEADER: &str = "x-api-key";

#[derive(Clone, Debug)]
pub struct GateConfig {
    shared_secret: SecretString,
    trust_proxy_headers: bool,
}

impl GateConfig {
    #[must_use]
    pub fn new(shared_secret: SecretString) -> Self {
        Self {
            shared_secret,
            trust_proxy_headers: false,
        }
    }

    /// Take the client IP from `X-Forwarded-For` / `X-Real-IP` when present.
    #[must_use]
    pub fn with_trust_proxy_headers(mut self, trust: bool) -> Self {
        self.trust_proxy_headers = trust;
        self
    }

    #[must_use]
    pub fn trust_proxy_headers(&self) -> bool {
        self.trust_proxy_headers
    }
}

/// How a request was authenticated.
#[derive(Clone, Debug)]
pub enum AuthMode {
    Session(Token),
    SharedSecret,
}

/// Identity attached to a request by `authenticate`.
#[derive(Clone, Debug)]
pub struct AuthContext {
    role: Role,
    mode: AuthMode,
}

impl AuthContext {
    #[must_use]
    pub fn role(&self) -> Role {
        self.role
    }

    #[must_use]
    pub fn mode(&self) -> &AuthMode {
        &self.mode
    }

    #[must_use]
    pub fn mode_kind(&self) -> AuthModeKind {
        match self.mode {
            AuthMode::Session(_) => AuthModeKind::Session,
            AuthMode::SharedSecret => AuthModeKind::SharedSecret,
        }
    }

    /// Session token behind the request, if it used one.
    #[must_use]
    pub fn token(&self) -> Option<&Token> {
        match &self.mode {
            AuthMode::Session(token) => Some(token),
            AuthMode::SharedSecret => None,
        }
    }

    /// Shared secret always implies full privilege; otherwise the role decides.
    #[must_use]
    pub fn is_privileged(&self) -> bool {
        matches!(self.mode, AuthMode::SharedSecret) || self.role.is_admin()
    }
}

/// Shared state for the gate middleware.
#[derive(Debug)]
pub struct AuthGate {
    registry: Arc<TokenRegistry>,
    bans: Arc<BanTracker>,
    // `None` when no secret is configured: the shared-secret path never matches.
    secret_digest: Option<[u8; 32]>,
    trust_proxy_headers: bool,
}

impl AuthGate {
    #[must_use]
    pub fn new(config: &GateConfig, registry: Arc<TokenRegistry>, bans: Arc<BanTracker>) -> Self {
        let secret = config.shared_secret.expose_secret();
        let secret_digest = if secret.is_empty() {
            None
        } else {
            Some(hash_secret(secret))
        };
        Self {
            registry,
            bans,
            secret_digest,
            trust_proxy_headers: config.trust_proxy_headers,
        }
    }

    #[must_use]
    pub fn registry(&self) -> &Arc<TokenRegistry> {
        &self.registry
    }

    #[must_use]
    pub fn bans(&self) -> &Arc<BanTracker> {
        &self.bans
    }

    /// Resolve the credentials in `headers` without touching the ban tracker.
    ///
    /// # Errors
    /// Returns `AuthError::Unauthorized` for an invalid or unreadable session
    /// token, or for a missing or wrong shared secret when no session token was
    /// presented.
    pub fn authenticate(&self, headers: &HeaderMap) -> Result<AuthContext, AuthError> {
        match session_credential(headers) {
            SessionCredential::Present(token_id) => {
                return self
                    .registry
                    .validate_token(token_id)
                    .map(|token| AuthContext {
                        role: token.role(),
                        mode: AuthMode::Session(token),
                    })
                    .ok_or(AuthError::Unauthorized);
            }
            SessionCredential::Malformed => {
                debug!("unreadable session credential");
                return Err(AuthError::Unauthorized);
            }
            SessionCredential::Absent => {}
        }

        let presented = headers
            .get(SHARED_SECRET_HEADER)
            .and_then(|value| value.to_str().ok())
            .unwrap_or_default();
        match &self.secret_digest {
            Some(digest) if secret_matches(presented, digest) => Ok(AuthContext {
                role: Role::Admin,
                mode: AuthMode::SharedSecret,
            }),
            _ => Err(AuthError::Unauthorized),
        }
    }

    fn source_ip(&self, request: &Request) -> String {
        client_ip(
            request.headers(),
            request.extensions().get::<ConnectInfo<SocketAddr>>(),
            self.trust_proxy_headers,
        )
    }
}

/// Session token as presented on the request.
#[derive(Debug, PartialEq, Eq)]
enum SessionCredential<'a> {
    Absent,
    Present(&'a str),
    /// A session header was sent but holds no usable token.
    Malformed,
}

fn token_from(value: &[u8]) -> SessionCredential<'_> {
    match std::str::from_utf8(value).map(str::trim) {
        Ok(token) if !token.is_empty() => SessionCredential::Present(token),
        _ => SessionCredential::Malformed,
    }
}

/// Session token from the dedicated header, else from a bearer authorization.
/// Other authorization schemes count as absent.
fn session_credential(headers: &HeaderMap) -> SessionCredential<'_> {
    if let Some(value) = headers.get(SESSION_TOKEN_HEADER) {
        return token_from(value.as_bytes());
    }
    let Some(value) = headers.get(AUTHORIZATION) else {
        return SessionCredential::Absent;
    };
    let bytes = value.as_bytes();
    match bytes
        .strip_prefix(b"Bearer ".as_slice())
        .or_else(|| bytes.strip_prefix(b"bearer ".as_slice()))
    {
        Some(rest) => token_from(rest),
        None => SessionCredential::Absent,
    }
}

/// Reject requests from banned source IPs before any credential check.
pub async fn ban_guard(State(gate): State<Arc<AuthGate>>, request: Request, next: Next) -> Response {
    let ip = gate.source_ip(&request);
    if gate.bans.is_banned(&ip) {
        warn!(ip = %ip, "rejected request from banned source address");
        return AuthError::Banned.into_response();
    }
    next.run(request).await
}

/// Resolve the caller's identity and attach an `AuthContext` to the request.
pub async fn authenticate(
    State(gate): State<Arc<AuthGate>>,
    mut request: Request,
    next: Next,
) -> Response {
    match gate.authenticate(request.headers()) {
        Ok(context) => {
            debug!(role = %context.role(), mode = ?context.mode_kind(), "request authenticated");
            request.extensions_mut().insert(context);
            next.run(request).await
        }
        Err(err) => {
            let ip = gate.source_ip(&request);
            warn!(ip = %ip, "authentication failed");
            gate.bans.record_failure(&ip);
            err.into_response()
        }
    }
}

/// Allow only shared-secret or Admin requests; must run after `authenticate`.
pub async fn admin_only(request: Request, next: Next) -> Response {
    match request.extensions().get::<AuthContext>() {
        Some(context) if context.is_privileged() => next.run(request).await,
        Some(context) => {
            debug!(role = %context.role(), "admin route refused");
            AuthError::Forbidden.into_response()
        }
        // Router wired without `authenticate`: fail closed.
        None => AuthError::Unauthorized.into_response(),
    }
}

/// Put every route in `router` behind the ban guard and authentication.
pub fn protect<S>(router: Router<S>, gate: Arc<AuthGate>) -> Router<S>
where
    S: Clone + Send + Sync + 'static,
{
    router
        .route_layer(middleware::from_fn_with_state(gate.clone(), authenticate))
        .route_layer(middleware::from_fn_with_state(gate, ban_guard))
}

/// Restrict every route in `router` to privileged callers.
pub fn admin_routes<S>(router: Router<S>) -> Router<S>
where
    S: Clone + Send + Sync + 'static,
{
    router.route_layer(middleware::from_fn(admin_only))
}
