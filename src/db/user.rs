//! Credential record and role model.

use std::fmt;
use std::str::FromStr;

use sqlx::sqlite::SqliteRow;
use sqlx::{FromRow, Row};

/// Account role.
///
/// Stored and displayed with the record; no operation in this crate is
/// gated on it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Role {
    /// Basic access.
    #[default]
    User,
    /// Domain analyst.
    Analyst,
    /// Administrator.
    Admin,
}

impl Role {
    /// All roles in menu order.
    pub const ALL: [Role; 3] = [Role::User, Role::Admin, Role::Analyst];

    /// Convert role to database string representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Analyst => "analyst",
            Role::Admin => "admin",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "user" => Ok(Role::User),
            "analyst" => Ok(Role::Analyst),
            "admin" => Ok(Role::Admin),
            _ => Err(format!("unknown role: {s}")),
        }
    }
}

/// Identifier of a stored credential record.
pub type CredentialId = i64;

/// A persisted credential record.
#[derive(Debug, Clone)]
pub struct Credential {
    /// Row ID.
    pub id: CredentialId,
    /// Unique login name.
    pub username: String,
    /// Encoded password hash. Never the plaintext.
    pub password_hash: String,
    /// Account role.
    pub role: Role,
    /// Creation timestamp (UTC, `YYYY-MM-DD HH:MM:SS`).
    pub created_at: String,
}

impl<'r> FromRow<'r, SqliteRow> for Credential {
    fn from_row(row: &'r SqliteRow) -> Result<Self, sqlx::Error> {
        let role: String = row.try_get("role")?;
        let role = role.parse().map_err(|e: String| sqlx::Error::ColumnDecode {
            index: "role".to_string(),
            source: e.into(),
        })?;

        Ok(Self {
            id: row.try_get("id")?,
            username: row.try_get("username")?,
            password_hash: row.try_get("password_hash")?,
            role,
            created_at: row.try_get("created_at")?,
        })
    }
}

/// Data for creating a new credential record.
#[derive(Debug, Clone)]
pub struct NewCredential {
    /// Login name.
    pub username: String,
    /// Pre-computed password hash.
    pub password_hash: String,
    /// Account role (defaults to `user`).
    pub role: Role,
}

impl NewCredential {
    /// Create a new record with the default role.
    pub fn new(username: impl Into<String>, password_hash: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password_hash: password_hash.into(),
            role: Role::User,
        }
    }

    /// Set the role.
    pub fn with_role(mut self, role: Role) -> Self {
        self.role = role;
        self
    }
}
