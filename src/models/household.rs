use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// A registered household in the association.
///
/// Households are keyed by their unit code rather than a surrogate id because
/// rotation tie-breaking is defined as lexicographic comparison over the unit
/// code (`"101" < "102" < "201"`). Rows persist indefinitely; nothing in the
/// rotation subsystem deletes them.
///
/// `leader_history_count` is maintained externally: it is incremented through
/// the complete-term endpoint when a household finishes a leader year, and the
/// rotation selector only ever reads it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Household {
    pub household_id: String,
    pub resident_name: String,
    pub move_in_date: Option<NaiveDate>,
    pub leader_history_count: i64,
    pub contact: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Input for registering a household. History starts at zero.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateHouseholdInput {
    pub household_id: String,
    pub resident_name: String,
    pub move_in_date: Option<NaiveDate>,
    pub contact: Option<String>,
}

/// Input for updating a household. All fields optional for partial updates.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdateHouseholdInput {
    pub resident_name: Option<String>,
    pub move_in_date: Option<NaiveDate>,
    pub contact: Option<String>,
}
