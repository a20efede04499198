//! Router for student appointments

use std::sync::{Arc, RwLock};

use axum::{
    Json, Router,
    extract::State,
    routing::{delete, get, patch},
};
use chrono::{Local, NaiveDateTime};
use http::StatusCode;

use super::db::{self as appointments_db, NewAppointment};
use super::public;
use crate::api::extract::{ApiJson, ApiPath, ApiQuery};
use crate::api::public::ApiError;
use crate::api::state::AppState;
use crate::scheduling::rules::{find_appointment_type, is_admin_email, normalize_email, validate_span};
use crate::scheduling::slot_key::parse_instant;

type SharedState = Arc<RwLock<AppState>>;

/// Normalized student email, rejecting blanks and admin addresses
fn student_email(raw: &str, admin_detail: &str) -> Result<String, ApiError> {
    let email = normalize_email(raw);
    if email.is_empty() {
        return Err(ApiError::bad_request("Student email is required."));
    }
    if is_admin_email(&email) {
        return Err(ApiError::forbidden(admin_detail));
    }
    Ok(email)
}

fn parse_start(raw: &str) -> Result<NaiveDateTime, ApiError> {
    parse_instant(raw, &Local)
        .ok_or_else(|| ApiError::bad_request("start_time must be an ISO 8601 timestamp."))
}

fn clean_notes(notes: Option<String>) -> Option<String> {
    notes
        .map(|n| n.trim().to_string())
        .filter(|n| !n.is_empty())
}

// Admin view of every booking
async fn list_all_appointments(
    State(state): State<SharedState>,
    ApiQuery(params): ApiQuery<public::AdminQuery>,
) -> Result<Json<Vec<public::BookedAppointment>>, ApiError> {
    if !is_admin_email(&params.admin_email) {
        return Err(ApiError::forbidden("Only admins can view all appointments."));
    }
    let db = state.read().expect("Unable to read share state").db.clone();
    Ok(Json(appointments_db::list_appointments(&db, None).await?))
}

// A student's own bookings
async fn list_my_appointments(
    State(state): State<SharedState>,
    ApiQuery(params): ApiQuery<public::StudentQuery>,
) -> Result<Json<Vec<public::BookedAppointment>>, ApiError> {
    let email = student_email(
        &params.student_email,
        "Only students can view their own appointments.",
    )?;
    let db = state.read().expect("Unable to read share state").db.clone();
    Ok(Json(appointments_db::list_appointments(&db, Some(email)).await?))
}

async fn book_appointment(
    State(state): State<SharedState>,
    ApiJson(req): ApiJson<public::CreateAppointmentRequest>,
) -> Result<(StatusCode, Json<public::BookedAppointment>), ApiError> {
    let email = student_email(&req.student_email, "Only students can book appointments.")?;
    let appointment_type = find_appointment_type(&req.appointment_type)
        .ok_or_else(|| ApiError::bad_request("Unknown appointment type."))?;
    let start = parse_start(&req.start_time)?;
    let span = validate_span(start, appointment_type.duration_minutes)
        .map_err(|v| ApiError::bad_request(v.detail("booked")))?;
    if span.start <= Local::now().naive_local() {
        return Err(ApiError::bad_request(
            "Appointments cannot be booked in the past.",
        ));
    }

    let db = state.read().expect("Unable to read share state").db.clone();
    let appt = appointments_db::create_appointment(
        &db,
        NewAppointment {
            student_email: email,
            appointment_type: appointment_type.name,
            duration_minutes: appointment_type.duration_minutes,
            span,
            notes: clean_notes(req.notes),
        },
    )
    .await?;
    tracing::info!("Booked appointment {} at {}", appt.id, appt.start_time);

    Ok((StatusCode::CREATED, Json(appt)))
}

async fn update_notes(
    State(state): State<SharedState>,
    ApiPath(id): ApiPath<i64>,
    ApiJson(req): ApiJson<public::UpdateNotesRequest>,
) -> Result<Json<public::BookedAppointment>, ApiError> {
    let email = student_email(&req.student_email, "Only students can edit appointment notes.")?;
    let db = state.read().expect("Unable to read share state").db.clone();
    let appt = appointments_db::update_notes(&db, id, email, clean_notes(req.notes)).await?;
    Ok(Json(appt))
}

async fn reschedule(
    State(state): State<SharedState>,
    ApiPath(id): ApiPath<i64>,
    ApiJson(req): ApiJson<public::RescheduleRequest>,
) -> Result<Json<public::BookedAppointment>, ApiError> {
    let email = student_email(&req.student_email, "Only students can reschedule appointments.")?;
    let start = parse_start(&req.start_time)?;
    let db = state.read().expect("Unable to read share state").db.clone();
    let appt = appointments_db::reschedule_appointment(
        &db,
        id,
        email,
        start,
        Local::now().naive_local(),
    )
    .await?;
    tracing::info!("Rescheduled appointment {} to {}", appt.id, appt.start_time);
    Ok(Json(appt))
}

async fn cancel(
    State(state): State<SharedState>,
    ApiPath(id): ApiPath<i64>,
    ApiQuery(params): ApiQuery<public::StudentQuery>,
) -> Result<StatusCode, ApiError> {
    let email = student_email(
        &params.student_email,
        "Only students can cancel appointments.",
    )?;
    let db = state.read().expect("Unable to read share state").db.clone();
    appointments_db::delete_appointment(&db, id, email).await?;
    tracing::info!("Cancelled appointment {}", id);
    Ok(StatusCode::NO_CONTENT)
}

/// Create the appointments router
pub fn router() -> Router<SharedState> {
    Router::new()
        .route(
            "/appointments",
            get(list_all_appointments).post(book_appointment),
        )
        .route("/appointments/mine", get(list_my_appointments))
        .route("/appointments/{id}", delete(cancel))
        .route("/appointments/{id}/notes", patch(update_notes))
        .route("/appointments/{id}/reschedule", patch(reschedule))
}
