use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A household's request to be excused from leader duty for one year.
///
/// Requests start as `Pending` and are approved or rejected by an admin.
/// Only an `Approved` request whose `year` matches the target year removes
/// the household from rotation candidacy.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExemptionRequest {
    pub id: Uuid,
    pub household_id: String,
    pub year: i32,
    pub reason: Option<String>,
    pub status: ExemptionStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ExemptionStatus {
    Pending,
    Approved,
    Rejected,
}

impl ExemptionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Approved => "approved",
            Self::Rejected => "rejected",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "pending" => Some(Self::Pending),
            "approved" => Some(Self::Approved),
            "rejected" => Some(Self::Rejected),
            _ => None,
        }
    }
}

/// Input for submitting an exemption request. Status is always `Pending`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateExemptionInput {
    pub household_id: String,
    pub year: i32,
    pub reason: Option<String>,
}
