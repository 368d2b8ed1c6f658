use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// The leader assignment for one year: a primary household and its backup.
///
/// Entries are created by the rotation selector in `Draft` status and advance
/// one step at a time under admin review: `Draft → Conditional → Confirmed`.
///
/// The schema deliberately carries no unique constraint on `year`:
/// `calculate_next_year` appends without clearing prior rows (matching the
/// original behavior), while `recalculate_schedules` enforces
/// at-most-one-per-year by deleting before inserting. Readers take the most
/// recently created row for a year.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LeaderScheduleEntry {
    pub id: Uuid,
    pub year: i32,
    pub primary_household_id: String,
    pub backup_household_id: String,
    pub status: ScheduleStatus,
    /// Free-text summary of how the assignment was produced.
    pub reason: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ScheduleStatus {
    Draft,
    Conditional,
    Confirmed,
}

impl ScheduleStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Draft => "draft",
            Self::Conditional => "conditional",
            Self::Confirmed => "confirmed",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "draft" => Some(Self::Draft),
            "conditional" => Some(Self::Conditional),
            "confirmed" => Some(Self::Confirmed),
            _ => None,
        }
    }

    /// The next status in the confirmation sequence, or `None` once confirmed.
    pub fn next(&self) -> Option<Self> {
        match self {
            Self::Draft => Some(Self::Conditional),
            Self::Conditional => Some(Self::Confirmed),
            Self::Confirmed => None,
        }
    }
}

/// Result of `recalculate_schedules`.
///
/// Recalculation never fails on insufficient candidates: with zero eligible
/// households it deletes any existing entry and writes nothing, leaving the
/// year unscheduled. The `entry` field makes that outcome explicit.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecalculateOutcome {
    pub candidate_count: usize,
    pub entry: Option<LeaderScheduleEntry>,
}
