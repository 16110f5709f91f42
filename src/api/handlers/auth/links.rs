//! Admin endpoint that mints dashboard links on behalf of a chat user.

use axum::{
    extract::Extension,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use std::sync::Arc;
use tracing::info;

use super::{
    link::issue_dashboard_link,
    registry::TokenOwner,
    state::AuthState,
    types::{ErrorResponse, LinkRequest, LinkResponse},
};

#[utoipa::path(
    post,
    path = "/v1/auth/links",
    request_body = LinkRequest,
    responses(
        (status = 201, description = "Dashboard link issued", body = LinkResponse),
        (status = 400, description = "Missing payload", body = ErrorResponse),
        (status = 401, description = "Invalid or missing credentials, or banned", body = ErrorResponse),
        (status = 403, description = "Admin role required", body = ErrorResponse),
        (status = 500, description = "Random source failure", body = ErrorResponse)
    ),
    security(("session_token" = []), ("bearer" = []), ("api_key" = [])),
    tag = "auth"
)]
pub async fn create_link(
    auth_state: Extension<Arc<AuthState>>,
    payload: Option<Json<LinkRequest>>,
) -> Response {
    let Some(Json(request)) = payload else {
        return (
            StatusCode::BAD_REQUEST,
            Json(ErrorResponse::new("missing payload")),
        )
            .into_response();
    };

    let owner = TokenOwner::new(request.user_id, request.username, request.first_name);
    match issue_dashboard_link(
        auth_state.registry(),
        auth_state.dashboard_url(),
        owner,
        request.is_admin,
    ) {
        Ok(link) => {
            info!(
                user_id = request.user_id,
                is_admin = request.is_admin,
                "issued dashboard link"
            );
            (
                StatusCode::CREATED,
                Json(LinkResponse {
                    success: true,
                    url: link.url.to_string(),
                    code: link.code,
                    expires_in_seconds: link.expires_in.as_secs(),
                }),
            )
                .into_response()
        }
        Err(err) => err.into_response(),
    }
}
