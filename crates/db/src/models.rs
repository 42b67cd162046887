//! Row structs that map 1-to-1 onto database tables.
//!
//! Only the tables this service reads directly have a row type. Everything
//! else arrives as JSON from a remote procedure.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

// ---------------------------------------------------------------------------
// admin_user_info
// ---------------------------------------------------------------------------

/// Role of an administrator inside their school.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AdminRole {
    Owner,
    Admin,
    Recruiter,
    Panelist,
}

impl std::fmt::Display for AdminRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Owner     => write!(f, "owner"),
            Self::Admin     => write!(f, "admin"),
            Self::Recruiter => write!(f, "recruiter"),
            Self::Panelist  => write!(f, "panelist"),
        }
    }
}

impl std::str::FromStr for AdminRole {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "owner"     => Ok(Self::Owner),
            "admin"     => Ok(Self::Admin),
            "recruiter" => Ok(Self::Recruiter),
            "panelist"  => Ok(Self::Panelist),
            other       => Err(format!("unknown admin role: {other}")),
        }
    }
}

/// Profile and school membership of an authenticated administrator.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct AdminUserInfoRow {
    pub id: Uuid,
    /// Identity id issued by the auth provider.
    pub user_id: Uuid,
    /// `None` until the admin creates or joins a school.
    pub school_id: Option<Uuid>,
    pub email: String,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub role: String,
    pub avatar_url: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl AdminUserInfoRow {
    /// Parsed role; unknown roles fall back to the least privileged one.
    pub fn role(&self) -> AdminRole {
        self.role.parse().unwrap_or(AdminRole::Panelist)
    }
}

// ---------------------------------------------------------------------------
// schools
// ---------------------------------------------------------------------------

/// A school (tenant) row.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct SchoolRow {
    pub id: Uuid,
    pub name: String,
    pub city: Option<String>,
    pub country: Option<String>,
    pub website: Option<String>,
    pub logo_url: Option<String>,
    pub created_at: DateTime<Utc>,
}
