//! Public endpoint that trades a one-time exchange code for a token id.
//!
//! This is the only auth endpoint outside the gates. The returned id is not
//! re-validated here; an expired token is rejected by the next gated request.

use axum::{extract::Extension, http::StatusCode, response::IntoResponse, Json};
use std::sync::Arc;
use tracing::debug;

use super::{
    error::AuthError,
    state::AuthState,
    types::{ErrorResponse, ExchangeRequest, ExchangeResponse},
};

#[utoipa::path(
    post,
    path = "/v1/auth/exchange",
    request_body = ExchangeRequest,
    responses(
        (status = 200, description = "Code exchanged for a session token", body = ExchangeResponse),
        (status = 400, description = "Missing payload", body = ErrorResponse),
        (status = 401, description = "Unknown, used or expired code", body = ErrorResponse)
    ),
    tag = "auth"
)]
pub async fn exchange(
    auth_state: Extension<Arc<AuthState>>,
    payload: Option<Json<ExchangeRequest>>,
) -> impl IntoResponse {
    let Some(Json(request)) = payload else {
        return (
            StatusCode::BAD_REQUEST,
            Json(ErrorResponse::new("missing payload")),
        )
            .into_response();
    };

    match auth_state.registry().exchange_code(request.code.trim()) {
        Some(token) => {
            debug!("exchange code redeemed");
            (
                StatusCode::OK,
                Json(ExchangeResponse {
                    success: true,
                    token,
                }),
            )
                .into_response()
        }
        None => AuthError::NotFound.into_response(),
    }
}
