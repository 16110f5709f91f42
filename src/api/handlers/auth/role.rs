//! Two-level role bound to every session token.

use serde::{Deserialize, Serialize};
use std::fmt;
use utoipa::ToSchema;

/// Access level attached to a token at issuance and never changed afterwards.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    /// Full access, including mutating routes.
    Admin,
    /// Read-only access.
    Viewer,
}

impl Role {
    /// Admin for privileged chat users, Viewer otherwise.
    #[must_use]
    pub const fn from_admin_flag(is_admin: bool) -> Self {
        if is_admin {
            Self::Admin
        } else {
            Self::Viewer
        }
    }

    #[must_use]
    pub const fn is_admin(self) -> bool {
        matches!(self, Self::Admin)
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Admin => "admin",
            Self::Viewer => "viewer",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
