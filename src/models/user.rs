use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// An authenticated portal account, optionally linked to a household.
///
/// The `Leader` role is derived state: role synchronization promotes a
/// `Resident` whose household holds the primary or backup slot on the current
/// year's schedule, and demotes a `Leader` whose household no longer does.
/// `Admin` is assigned manually and never touched by synchronization.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: Uuid,
    pub name: String,
    pub household_id: Option<String>,
    pub role: UserRole,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum UserRole {
    Resident,
    Leader,
    Admin,
}

impl UserRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Resident => "resident",
            Self::Leader => "leader",
            Self::Admin => "admin",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "resident" => Some(Self::Resident),
            "leader" => Some(Self::Leader),
            "admin" => Some(Self::Admin),
            _ => None,
        }
    }
}

/// Input for creating a user. Role defaults to `Resident`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateUserInput {
    pub name: String,
    pub household_id: Option<String>,
    pub role: Option<UserRole>,
}
