//! Annual leader rotation selection.
//!
//! Each year one household becomes the rotating leader (組長) and a second
//! becomes its backup. This module holds the pure decision procedure: an
//! eligibility filter, a deterministic ranking comparator, and the top-two
//! pick. Persistence lives in [`crate::db::Database`], which feeds this
//! module the household registry, the previous year's assignment, and the
//! approved exemption set.
//!
//! Two entry points intentionally apply different exclusion rules and must
//! not be unified (the divergence is observable behavior inherited from the
//! original rule set):
//!
//! - [`Database::calculate_next_year`](crate::db::Database::calculate_next_year)
//!   excludes only exempted households (code C) and fails when nobody is
//!   eligible.
//! - [`Database::recalculate_schedules`](crate::db::Database::recalculate_schedules)
//!   excludes exempted, recently-moved-in, and ever-served households
//!   (codes C, A, B) and never fails; with zero candidates the year is
//!   simply left unscheduled.
//!
//! The 12-month move-in window is measured from the evaluation instant, not
//! from the start of the target year. Scheduling several years ahead can
//! therefore exclude a household that would be eligible by then; tests pin
//! this behavior rather than correcting it.

use std::collections::HashSet;

use chrono::{DateTime, Months, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::models::{Household, LeaderScheduleEntry};

/// Errors surfaced by the rotation entry points.
///
/// `InsufficientCandidates` is raised only by `calculate_next_year`;
/// `recalculate_schedules` reports an empty candidate list through its
/// return value instead.
#[derive(Debug, Error)]
pub enum RotationError {
    #[error("data store unavailable: {0}")]
    DataStore(#[from] anyhow::Error),
    #[error("no eligible household remains for year {year}")]
    InsufficientCandidates { year: i32 },
}

/// Why a household is excluded from candidacy for a given year.
///
/// Serialized as the single-letter codes the UI displays. A household can
/// carry several at once; they are always reported in evaluation order
/// A, B, C.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum ExclusionReason {
    /// Moved in within the 12 months preceding evaluation time.
    #[serde(rename = "A")]
    RecentMoveIn,
    /// Has served as leader at least once (`leader_history_count > 0`).
    #[serde(rename = "B")]
    ServedBefore,
    /// Holds an approved exemption for the target year.
    #[serde(rename = "C")]
    Exempted,
}

/// The primary/backup pair produced by a selection pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Selection {
    pub primary_household_id: String,
    pub backup_household_id: String,
}

/// One row of the reason-annotated rotation overview.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HouseholdRotationStatus {
    pub household_id: String,
    pub move_in_date: Option<chrono::NaiveDate>,
    pub leader_history_count: i64,
    pub reasons: Vec<ExclusionReason>,
    pub is_candidate: bool,
}

/// Read-only projection returned by `get_rotation_with_reasons`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RotationOverview {
    pub households: Vec<HouseholdRotationStatus>,
    pub schedule: Option<LeaderScheduleEntry>,
}

/// All exclusion reasons applying to one household, in evaluation order.
pub fn exclusion_reasons(
    household: &Household,
    now: DateTime<Utc>,
    exempted: &HashSet<String>,
) -> Vec<ExclusionReason> {
    let mut reasons = Vec::new();
    if moved_in_recently(household, now) {
        reasons.push(ExclusionReason::RecentMoveIn);
    }
    if household.leader_history_count > 0 {
        reasons.push(ExclusionReason::ServedBefore);
    }
    if exempted.contains(&household.household_id) {
        reasons.push(ExclusionReason::Exempted);
    }
    reasons
}

/// Whether the household moved in within the 12 months before `now`.
///
/// Compares against wall-clock evaluation time regardless of the target
/// year. A missing move-in date never counts as recent.
pub fn moved_in_recently(household: &Household, now: DateTime<Utc>) -> bool {
    let Some(move_in) = household.move_in_date else {
        return false;
    };
    let threshold = now
        .checked_sub_months(Months::new(12))
        .map(|t| t.date_naive());
    match threshold {
        Some(threshold) => move_in > threshold,
        None => false,
    }
}

/// Rank candidates into selection order.
///
/// Ascending by: (1) was this household the previous year's primary —
/// last year's leader is pushed to the back, not removed; (2) move-in
/// date, households without a recorded date after all that have one;
/// (3) household id, lexicographic. The sort is stable and the key is a
/// total order, so identical input always yields identical output.
pub fn rank_candidates(mut candidates: Vec<Household>, previous_primary: Option<&str>) -> Vec<Household> {
    candidates.sort_by(|a, b| {
        let a_led = Some(a.household_id.as_str()) == previous_primary;
        let b_led = Some(b.household_id.as_str()) == previous_primary;
        a_led
            .cmp(&b_led)
            .then_with(|| match (a.move_in_date, b.move_in_date) {
                (Some(a_date), Some(b_date)) => a_date.cmp(&b_date),
                (Some(_), None) => std::cmp::Ordering::Less,
                (None, Some(_)) => std::cmp::Ordering::Greater,
                (None, None) => std::cmp::Ordering::Equal,
            })
            .then_with(|| a.household_id.cmp(&b.household_id))
    });
    candidates
}

/// Pick primary and backup from a ranked candidate list.
///
/// Returns `None` for an empty list. A sole candidate serves as both
/// primary and backup.
pub fn select(ranked: &[Household]) -> Option<Selection> {
    let primary = ranked.first()?;
    let backup = ranked.get(1).unwrap_or(primary);
    Some(Selection {
        primary_household_id: primary.household_id.clone(),
        backup_household_id: backup.household_id.clone(),
    })
}
