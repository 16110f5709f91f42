//! Request and response bodies for the auth endpoints.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::role::Role;

/// Uniform rejection body.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ErrorResponse {
    pub success: bool,
    pub error: String,
}

impl ErrorResponse {
    #[must_use]
    pub fn new(message: &str) -> Self {
        Self {
            success: false,
            error: message.to_string(),
        }
    }
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct ExchangeRequest {
    pub code: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ExchangeResponse {
    pub success: bool,
    pub token: String,
}

/// How the current request was authenticated.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum AuthModeKind {
    Session,
    SharedSecret,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct SessionResponse {
    pub success: bool,
    pub role: Role,
    pub mode: AuthModeKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_id: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub first_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expires_in_seconds: Option<u64>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct LinkRequest {
    pub user_id: i64,
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub is_admin: bool,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct LinkResponse {
    pub success: bool,
    pub url: String,
    pub code: String,
    pub expires_in_seconds: u64,
}
