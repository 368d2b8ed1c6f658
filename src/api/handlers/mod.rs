use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use serde::Deserialize;
use uuid::Uuid;

use crate::models::*;
use crate::notify::notify_best_effort;
use crate::rotation::{RotationError, RotationOverview};

use super::AppState;

// ============================================================
// Error Handling
// ============================================================

/// Log an internal error and return a sanitized response to the client.
/// The full error is logged server-side for debugging, but clients only
/// see a generic message to avoid leaking internal details.
///
/// Some errors are validation errors that should be exposed to the client
/// (e.g., "Household 101 already registered"). These are returned as-is
/// with a BAD_REQUEST status.
fn internal_error(e: impl std::fmt::Display) -> (StatusCode, String) {
    let msg = e.to_string();

    // Known validation errors that are safe to expose
    if msg.contains("not found")
        || msg.contains("already registered")
        || msg.contains("already confirmed")
    {
        tracing::warn!("Validation error: {}", msg);
        return (StatusCode::BAD_REQUEST, msg);
    }

    tracing::error!("Internal error: {}", msg);
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        "Internal server error".to_string(),
    )
}

/// Map rotation errors: an exhausted candidate list is a conflict the admin
/// must resolve (approve fewer exemptions), not a server fault.
fn rotation_error(e: RotationError) -> (StatusCode, String) {
    match e {
        RotationError::InsufficientCandidates { .. } => (StatusCode::CONFLICT, e.to_string()),
        RotationError::DataStore(inner) => internal_error(inner),
    }
}

// ============================================================
// Health
// ============================================================

pub async fn health() -> impl IntoResponse {
    Json(serde_json::json!({ "status": "ok" }))
}

// ============================================================
// Households
// ============================================================

pub async fn list_households(
    State(state): State<AppState>,
) -> Result<Json<Vec<Household>>, (StatusCode, String)> {
    state
        .db
        .get_all_households()
        .map(Json)
        .map_err(internal_error)
}

pub async fn get_household(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Household>, (StatusCode, String)> {
    state
        .db
        .get_household(&id)
        .map_err(internal_error)?
        .map(Json)
        .ok_or((StatusCode::NOT_FOUND, "Household not found".to_string()))
}

pub async fn create_household(
    State(state): State<AppState>,
    Json(input): Json<CreateHouseholdInput>,
) -> Result<(StatusCode, Json<Household>), (StatusCode, String)> {
    state
        .db
        .create_household(input)
        .map(|h| (StatusCode::CREATED, Json(h)))
        .map_err(internal_error)
}

pub async fn update_household(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(input): Json<UpdateHouseholdInput>,
) -> Result<Json<Household>, (StatusCode, String)> {
    state
        .db
        .update_household(&id, input)
        .map_err(internal_error)?
        .map(Json)
        .ok_or((StatusCode::NOT_FOUND, "Household not found".to_string()))
}

pub async fn delete_household(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<StatusCode, (StatusCode, String)> {
    if state.db.delete_household(&id).map_err(internal_error)? {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err((StatusCode::NOT_FOUND, "Household not found".to_string()))
    }
}

pub async fn complete_leader_term(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Household>, (StatusCode, String)> {
    state
        .db
        .complete_leader_term(&id)
        .map_err(internal_error)?
        .map(Json)
        .ok_or((StatusCode::NOT_FOUND, "Household not found".to_string()))
}

// ============================================================
// Exemptions
// ============================================================

/// Query parameters for listing exemption requests.
#[derive(Debug, Deserialize)]
pub struct ListExemptionsQuery {
    pub year: Option<i32>,
    pub status: Option<ExemptionStatus>,
}

pub async fn list_exemptions(
    State(state): State<AppState>,
    Query(query): Query<ListExemptionsQuery>,
) -> Result<Json<Vec<ExemptionRequest>>, (StatusCode, String)> {
    state
        .db
        .list_exemptions(query.year, query.status)
        .map(Json)
        .map_err(internal_error)
}

pub async fn create_exemption(
    State(state): State<AppState>,
    Json(input): Json<CreateExemptionInput>,
) -> Result<(StatusCode, Json<ExemptionRequest>), (StatusCode, String)> {
    state
        .db
        .create_exemption(input)
        .map(|e| (StatusCode::CREATED, Json(e)))
        .map_err(internal_error)
}

pub async fn approve_exemption(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<ExemptionRequest>, (StatusCode, String)> {
    state
        .db
        .set_exemption_status(id, ExemptionStatus::Approved)
        .map_err(internal_error)?
        .map(Json)
        .ok_or((StatusCode::NOT_FOUND, "Exemption not found".to_string()))
}

pub async fn reject_exemption(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<ExemptionRequest>, (StatusCode, String)> {
    state
        .db
        .set_exemption_status(id, ExemptionStatus::Rejected)
        .map_err(internal_error)?
        .map(Json)
        .ok_or((StatusCode::NOT_FOUND, "Exemption not found".to_string()))
}

// ============================================================
// Schedules & Rotation
// ============================================================

pub async fn list_schedules(
    State(state): State<AppState>,
) -> Result<Json<Vec<LeaderScheduleEntry>>, (StatusCode, String)> {
    state
        .db
        .get_all_schedules()
        .map(Json)
        .map_err(internal_error)
}

pub async fn get_schedule(
    State(state): State<AppState>,
    Path(year): Path<i32>,
) -> Result<Json<LeaderScheduleEntry>, (StatusCode, String)> {
    state
        .db
        .get_schedule_for_year(year)
        .map_err(internal_error)?
        .map(Json)
        .ok_or((StatusCode::NOT_FOUND, "Schedule not found".to_string()))
}

pub async fn calculate_next_year(
    State(state): State<AppState>,
    Path(year): Path<i32>,
) -> Result<(StatusCode, Json<LeaderScheduleEntry>), (StatusCode, String)> {
    state
        .db
        .calculate_next_year(year)
        .map(|entry| (StatusCode::CREATED, Json(entry)))
        .map_err(rotation_error)
}

pub async fn recalculate_schedules(
    State(state): State<AppState>,
    Path(year): Path<i32>,
) -> Result<Json<RecalculateOutcome>, (StatusCode, String)> {
    state
        .db
        .recalculate_schedules(year)
        .map(Json)
        .map_err(rotation_error)
}

pub async fn get_rotation_with_reasons(
    State(state): State<AppState>,
    Path(year): Path<i32>,
) -> Result<Json<RotationOverview>, (StatusCode, String)> {
    state
        .db
        .get_rotation_with_reasons(year)
        .map(Json)
        .map_err(rotation_error)
}

pub async fn advance_schedule(
    State(state): State<AppState>,
    Path(year): Path<i32>,
) -> Result<Json<LeaderScheduleEntry>, (StatusCode, String)> {
    state
        .db
        .advance_schedule_status(year)
        .map_err(internal_error)?
        .map(Json)
        .ok_or((StatusCode::NOT_FOUND, "Schedule not found".to_string()))
}

// ============================================================
// Inquiries
// ============================================================

pub async fn list_inquiries(
    State(state): State<AppState>,
) -> Result<Json<Vec<Inquiry>>, (StatusCode, String)> {
    state
        .db
        .get_all_inquiries()
        .map(Json)
        .map_err(internal_error)
}

pub async fn get_inquiry(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Inquiry>, (StatusCode, String)> {
    state
        .db
        .get_inquiry(id)
        .map_err(internal_error)?
        .map(Json)
        .ok_or((StatusCode::NOT_FOUND, "Inquiry not found".to_string()))
}

pub async fn create_inquiry(
    State(state): State<AppState>,
    Json(input): Json<CreateInquiryInput>,
) -> Result<(StatusCode, Json<Inquiry>), (StatusCode, String)> {
    let inquiry = state.db.create_inquiry(input).map_err(internal_error)?;

    notify_best_effort(
        &state.notifier,
        &format!("New inquiry from {}", inquiry.household_id),
        &inquiry.title,
    );

    Ok((StatusCode::CREATED, Json(inquiry)))
}

pub async fn answer_inquiry(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(input): Json<AnswerInquiryInput>,
) -> Result<Json<Inquiry>, (StatusCode, String)> {
    let inquiry = state
        .db
        .answer_inquiry(id, input)
        .map_err(internal_error)?
        .ok_or((StatusCode::NOT_FOUND, "Inquiry not found".to_string()))?;

    notify_best_effort(
        &state.notifier,
        &format!("Inquiry answered: {}", inquiry.title),
        inquiry.answer.as_deref().unwrap_or(""),
    );

    Ok(Json(inquiry))
}

// ============================================================
// FAQ
// ============================================================

pub async fn list_faq(
    State(state): State<AppState>,
) -> Result<Json<Vec<FaqArticle>>, (StatusCode, String)> {
    state.db.get_all_faq().map(Json).map_err(internal_error)
}

pub async fn get_faq(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<FaqArticle>, (StatusCode, String)> {
    state
        .db
        .get_faq(id)
        .map_err(internal_error)?
        .map(Json)
        .ok_or((StatusCode::NOT_FOUND, "Article not found".to_string()))
}

pub async fn create_faq(
    State(state): State<AppState>,
    Json(input): Json<CreateFaqInput>,
) -> Result<(StatusCode, Json<FaqArticle>), (StatusCode, String)> {
    state
        .db
        .create_faq(input)
        .map(|a| (StatusCode::CREATED, Json(a)))
        .map_err(internal_error)
}

pub async fn update_faq(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(input): Json<UpdateFaqInput>,
) -> Result<Json<FaqArticle>, (StatusCode, String)> {
    state
        .db
        .update_faq(id, input)
        .map_err(internal_error)?
        .map(Json)
        .ok_or((StatusCode::NOT_FOUND, "Article not found".to_string()))
}

pub async fn delete_faq(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, (StatusCode, String)> {
    if state.db.delete_faq(id).map_err(internal_error)? {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err((StatusCode::NOT_FOUND, "Article not found".to_string()))
    }
}

// ============================================================
// Users
// ============================================================

pub async fn create_user(
    State(state): State<AppState>,
    Json(input): Json<CreateUserInput>,
) -> Result<(StatusCode, Json<User>), (StatusCode, String)> {
    state
        .db
        .create_user(input)
        .map(|u| (StatusCode::CREATED, Json(u)))
        .map_err(internal_error)
}

pub async fn get_user(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<User>, (StatusCode, String)> {
    state
        .db
        .get_user(id)
        .map_err(internal_error)?
        .map(Json)
        .ok_or((StatusCode::NOT_FOUND, "User not found".to_string()))
}
