//! Records exchanged with the backend.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Permission level of a user, ordered from least to most privileged.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum Permission {
    Guest,
    #[default]
    User,
    Trusted,
    Administrator,
    Owner,
}

impl Permission {
    pub fn as_str(&self) -> &'static str {
        match self {
            Permission::Guest => "guest",
            Permission::User => "user",
            Permission::Trusted => "trusted",
            Permission::Administrator => "administrator",
            Permission::Owner => "owner",
        }
    }
}

impl TryFrom<u8> for Permission {
    type Error = String;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(Permission::Guest),
            1 => Ok(Permission::User),
            2 => Ok(Permission::Trusted),
            3 => Ok(Permission::Administrator),
            4 => Ok(Permission::Owner),
            other => Err(format!("unknown permission level {}", other)),
        }
    }
}

impl From<Permission> for u8 {
    fn from(permission: Permission) -> Self {
        permission as u8
    }
}

impl fmt::Display for Permission {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The signed-in user as the backend describes them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    pub username: String,
    /// Unix nanoseconds.
    #[serde(default)]
    pub joined_at: i64,
    #[serde(default)]
    pub permission: Permission,
}

impl Identity {
    pub fn new(username: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            joined_at: 0,
            permission: Permission::User,
        }
    }

    pub fn with_permission(mut self, permission: Permission) -> Self {
        self.permission = permission;
        self
    }

    pub fn is_admin(&self) -> bool {
        self.permission >= Permission::Administrator
    }

    pub fn joined(&self) -> DateTime<Utc> {
        DateTime::<Utc>::from_timestamp_nanos(self.joined_at)
    }
}

/// One signed-in device of a user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    pub id: i64,
    pub username: String,
    /// Unix nanoseconds.
    #[serde(default)]
    pub created_at: i64,
    /// Unix nanoseconds after which the session is no longer valid.
    #[serde(default)]
    pub deadline: i64,
    #[serde(default)]
    pub user_agent: String,
}

impl Session {
    pub fn new(id: i64, username: impl Into<String>) -> Self {
        Self {
            id,
            username: username.into(),
            created_at: 0,
            deadline: 0,
            user_agent: String::new(),
        }
    }

    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    pub fn created(&self) -> DateTime<Utc> {
        DateTime::<Utc>::from_timestamp_nanos(self.created_at)
    }

    pub fn expires(&self) -> DateTime<Utc> {
        DateTime::<Utc>::from_timestamp_nanos(self.deadline)
    }
}

/// A partial update of the current user. Unset fields are left alone.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserEditParams {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
}

impl UserEditParams {
    pub fn password(password: impl Into<String>) -> Self {
        Self {
            password: Some(password.into()),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.password.is_none()
    }
}
