// src/models/user.rs

use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

use crate::error::AppError;

/// Role of the acting user, injected upstream via the `X-User-Role` header.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Role {
    Admin,
    Moderator,
    /// Regular user submitting content.
    Creator,
}

impl Role {
    /// Roles whose submissions are approved on the spot.
    pub fn is_privileged(self) -> bool {
        matches!(self, Role::Admin | Role::Moderator)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Role::Admin => "Admin",
            Role::Moderator => "Moderator",
            Role::Creator => "Creator",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Admin" => Ok(Role::Admin),
            "Moderator" => Ok(Role::Moderator),
            "Creator" => Ok(Role::Creator),
            other => Err(AppError::Validation(format!("Unknown user role '{}'", other))),
        }
    }
}

/// The user on whose behalf a request runs.
///
/// Identity and role are trusted as delivered by the upstream gateway;
/// this service only branches on them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ActingUser {
    pub id: i64,
    pub role: Role,
}

impl ActingUser {
    pub fn new(id: i64, role: Role) -> Self {
        Self { id, role }
    }
}
