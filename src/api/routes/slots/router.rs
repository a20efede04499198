//! Router for raw slots and admin blocks

use std::collections::BTreeSet;
use std::sync::{Arc, RwLock};

use axum::{
    Json, Router,
    extract::State,
    routing::{delete, get},
};
use chrono::{Duration, Local};
use http::StatusCode;

use super::db as slots_db;
use super::public;
use crate::api::extract::{ApiJson, ApiPath, ApiQuery};
use crate::api::public::ApiError;
use crate::api::routes::appointments::db as appointments_db;
use crate::api::state::AppState;
use crate::scheduling::merge::generate_slots;
use crate::scheduling::slot_key::iterate_slot_starts;
use crate::scheduling::rules::{
    BLOCKED_APPOINTMENT_TYPE, DEFAULT_SLOT_DURATION_MINUTES, SLOT_RANGE_DAYS, Span,
    is_admin_email, validate_span,
};

type SharedState = Arc<RwLock<AppState>>;

fn require_admin(email: &str, detail: &str) -> Result<(), ApiError> {
    if is_admin_email(email) {
        Ok(())
    } else {
        Err(ApiError::forbidden(detail))
    }
}

// Generated slots for the next four weeks
async fn list_slots(
    State(state): State<SharedState>,
    ApiQuery(params): ApiQuery<public::SlotsQuery>,
) -> Result<Json<Vec<public::AvailabilitySlot>>, ApiError> {
    let db = state.read().expect("Unable to read share state").db.clone();
    let now = Local::now().naive_local();
    let range_end = now + Duration::days(SLOT_RANGE_DAYS);

    let block_starts: BTreeSet<_> = slots_db::list_blocks(&db, now, Some(range_end))
        .await?
        .into_iter()
        .flat_map(|b| iterate_slot_starts(b.start_time, b.end_time))
        .collect();
    let bookings = appointments_db::overlapping_booking_spans(&db, Span::new(now, range_end), None)
        .await?;

    Ok(Json(generate_slots(
        now,
        SLOT_RANGE_DAYS,
        &block_starts,
        &bookings,
        params.students_only,
    )))
}

// Admin blocks a time
async fn create_blocked_time(
    State(state): State<SharedState>,
    ApiJson(req): ApiJson<public::CreateBlockedTimeRequest>,
) -> Result<(StatusCode, Json<public::BlockedTime>), ApiError> {
    require_admin(&req.admin_email, "Only admins can block appointment times.")?;

    let (Some(date), Some(time)) = (req.date, req.time) else {
        return Err(ApiError::bad_request("Date and time are required."));
    };

    let appointment_type = req
        .appointment_type
        .as_deref()
        .map(|t| t.trim().to_lowercase())
        .unwrap_or_else(|| BLOCKED_APPOINTMENT_TYPE.to_string());
    if appointment_type != BLOCKED_APPOINTMENT_TYPE {
        return Err(ApiError::bad_request(
            "Only blocked times can be created on this endpoint.",
        ));
    }

    let duration = req.duration_minutes.unwrap_or(DEFAULT_SLOT_DURATION_MINUTES);
    let start = date.and_time(time);
    let span =
        validate_span(start, duration).map_err(|v| ApiError::bad_request(v.detail("blocked")))?;
    if span.start <= Local::now().naive_local() {
        return Err(ApiError::bad_request("Past times cannot be blocked."));
    }

    let db = state.read().expect("Unable to read share state").db.clone();
    let block = slots_db::create_block(&db, span).await?;
    tracing::info!("Blocked {} by {}", block.start_time, req.admin_email.trim());

    Ok((StatusCode::CREATED, Json(block)))
}

// Admin removes a block
async fn remove_blocked_time(
    State(state): State<SharedState>,
    ApiPath(id): ApiPath<i64>,
    ApiQuery(params): ApiQuery<public::AdminQuery>,
) -> Result<StatusCode, ApiError> {
    require_admin(&params.admin_email, "Only admins can unblock appointment times.")?;
    let db = state.read().expect("Unable to read share state").db.clone();
    slots_db::delete_block(&db, id).await?;
    tracing::info!("Unblocked {} by {}", id, params.admin_email.trim());
    Ok(StatusCode::NO_CONTENT)
}

// Upcoming blocks
async fn list_blocked_times(
    State(state): State<SharedState>,
) -> Result<Json<Vec<public::BlockedTime>>, ApiError> {
    let db = state.read().expect("Unable to read share state").db.clone();
    let blocks = slots_db::list_blocks(&db, Local::now().naive_local(), None).await?;
    Ok(Json(blocks))
}

/// Create the slots router
pub fn router() -> Router<SharedState> {
    Router::new()
        .route("/slots", get(list_slots).post(create_blocked_time))
        .route("/slots/{id}", delete(remove_blocked_time))
        .route("/blocked-times", get(list_blocked_times))
}
