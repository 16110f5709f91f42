//! Session endpoints for authenticated callers.

use axum::{
    extract::Extension,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use std::sync::Arc;

use super::{
    error::AuthError,
    gate::AuthContext,
    state::AuthState,
    types::{ErrorResponse, SessionResponse},
};

#[utoipa::path(
    get,
    path = "/v1/auth/session",
    responses(
        (status = 200, description = "Caller identity", body = SessionResponse),
        (status = 401, description = "Invalid or missing credentials, or banned", body = ErrorResponse)
    ),
    security(("session_token" = []), ("bearer" = []), ("api_key" = [])),
    tag = "auth"
)]
pub async fn session(context: Option<Extension<AuthContext>>) -> Response {
    // Reaching this handler without a context means the router skipped the gate.
    let Some(Extension(context)) = context else {
        return AuthError::Unauthorized.into_response();
    };
    let token = context.token();
    let response = SessionResponse {
        success: true,
        role: context.role(),
        mode: context.mode_kind(),
        user_id: token.map(|token| token.owner().user_id),
        username: token.map(|token| token.owner().username.clone()),
        first_name: token.map(|token| token.owner().first_name.clone()),
        expires_in_seconds: token.map(|token| token.remaining().as_secs()),
    };
    (StatusCode::OK, Json(response)).into_response()
}

#[utoipa::path(
    post,
    path = "/v1/auth/logout",
    responses(
        (status = 204, description = "Session token revoked"),
        (status = 401, description = "Invalid or missing credentials, or banned", body = ErrorResponse)
    ),
    security(("session_token" = []), ("bearer" = []), ("api_key" = [])),
    tag = "auth"
)]
pub async fn logout(
    auth_state: Extension<Arc<AuthState>>,
    context: Option<Extension<AuthContext>>,
) -> Response {
    let Some(Extension(context)) = context else {
        return AuthError::Unauthorized.into_response();
    };
    // Shared-secret callers have nothing to revoke.
    if let Some(token) = context.token() {
        auth_state.registry().revoke_token(token.id());
    }
    StatusCode::NO_CONTENT.into_response()
}
