//! Router for the merged calendar and appointment types

use std::sync::{Arc, RwLock};

use axum::{Json, Router, extract::State, routing::get};
use chrono::{Duration, Local, NaiveTime};

use super::db as calendar_db;
use super::public;
use crate::api::extract::ApiQuery;
use crate::api::public::ApiError;
use crate::api::state::AppState;
use crate::scheduling::merge::build_calendar;
use crate::scheduling::rules::{
    GENERAL_APPOINTMENT_TYPE, SLOT_RANGE_DAYS, Span, appointment_types, find_appointment_type,
};

type SharedState = Arc<RwLock<AppState>>;

async fn list_appointment_types() -> Json<Vec<public::AppointmentType>> {
    Json(appointment_types())
}

async fn calendar_handler(
    State(state): State<SharedState>,
    ApiQuery(params): ApiQuery<public::CalendarQuery>,
) -> Result<Json<Vec<public::CalendarSlot>>, ApiError> {
    let (db, default_days) = {
        let shared_state = state.read().expect("Unable to read share state");
        (shared_state.db.clone(), shared_state.config.calendar_days)
    };

    let days = params.days.unwrap_or(default_days);
    if !(1..=SLOT_RANGE_DAYS).contains(&days) {
        return Err(ApiError::bad_request(format!(
            "days must be between 1 and {}.",
            SLOT_RANGE_DAYS
        )));
    }

    let type_name = params
        .appointment_type
        .unwrap_or_else(|| GENERAL_APPOINTMENT_TYPE.to_string());
    let appointment_type = find_appointment_type(&type_name)
        .ok_or_else(|| ApiError::bad_request("Unknown appointment type."))?;

    let now = Local::now().naive_local();
    let window = Span::new(
        now.date().and_time(NaiveTime::default()),
        (now.date() + Duration::days(days)).and_time(NaiveTime::default()),
    );
    let (blocks, bookings) = calendar_db::busy_spans(&db, window, params.exclude_appointment_id).await?;

    Ok(Json(build_calendar(
        now,
        days,
        &appointment_type,
        &blocks,
        &bookings,
    )))
}

/// Create the calendar router
pub fn router() -> Router<SharedState> {
    Router::new()
        .route("/calendar", get(calendar_handler))
        .route("/appointment-types", get(list_appointment_types))
}
