//! Auth error taxonomy and its mapping to the uniform rejection body.
//!
//! Every variant is handled at the request boundary. Only `Randomness` is an
//! internal error; the rest are client outcomes and share generic messages so a
//! caller cannot tell which check failed.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use tracing::error;

use super::types::ErrorResponse;

pub(crate) const MSG_INVALID_CREDENTIALS: &str = "invalid or missing credentials";
pub(crate) const MSG_BANNED: &str = "too many failed attempts, try again later";
pub(crate) const MSG_FORBIDDEN: &str = "admin role required";
pub(crate) const MSG_NOT_FOUND: &str = "invalid or expired code";
pub(crate) const MSG_INTERNAL: &str = "internal error";

#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("token or code not found")]
    NotFound,
    #[error("token or code expired")]
    Expired,
    #[error("secure random generator failed: {0}")]
    Randomness(#[from] rand::Error),
    #[error("unauthorized")]
    Unauthorized,
    #[error("forbidden")]
    Forbidden,
    #[error("source address banned")]
    Banned,
}

impl AuthError {
    #[must_use]
    pub fn status(&self) -> StatusCode {
        match self {
            Self::NotFound | Self::Expired | Self::Unauthorized | Self::Banned => {
                StatusCode::UNAUTHORIZED
            }
            Self::Forbidden => StatusCode::FORBIDDEN,
            Self::Randomness(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Public message; `Expired` shares the `NotFound` text.
    #[must_use]
    pub fn public_message(&self) -> &'static str {
        match self {
            Self::NotFound | Self::Expired => MSG_NOT_FOUND,
            Self::Unauthorized => MSG_INVALID_CREDENTIALS,
            Self::Banned => MSG_BANNED,
            Self::Forbidden => MSG_FORBIDDEN,
            Self::Randomness(_) => MSG_INTERNAL,
        }
    }
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        if let Self::Randomness(err) = &self {
            error!("Failed to generate random identifier: {err}");
        }
        (self.status(), Json(ErrorResponse::new(self.public_message()))).into_response()
    }
}
