//! Database queries for student appointments
use chrono::NaiveDateTime;
use rusqlite::OptionalExtension;
use tokio_rusqlite::{Connection, params};

use crate::api::public::ApiError;
use crate::api::utils::{APPOINTMENT_COLUMNS, appointment_from_row, to_sql_time};
use crate::scheduling::BookedAppointment;
use crate::scheduling::rules::{BLOCKED_APPOINTMENT_TYPE, Span, normalize_email, validate_span};

pub const SCHEDULED_STATUS: &str = "scheduled";

const NOT_FOUND: &str = "Appointment not found.";

pub struct NewAppointment {
    pub student_email: String,
    pub appointment_type: String,
    pub duration_minutes: i64,
    pub span: Span,
    pub notes: Option<String>,
}

fn conflict_for(
    conn: &rusqlite::Connection,
    span: Span,
    exclude_id: Option<i64>,
) -> rusqlite::Result<Option<ApiError>> {
    let start = to_sql_time(span.start);
    let end = to_sql_time(span.end);
    let blocked: i64 = conn.query_row(
        r"
        SELECT COUNT(*) FROM availability
        WHERE appointment_type = ?1 AND start_time < ?2 AND end_time > ?3
        ",
        params![BLOCKED_APPOINTMENT_TYPE, end, start],
        |row| row.get(0),
    )?;
    if blocked > 0 {
        return Ok(Some(ApiError::conflict("This time is blocked.")));
    }
    let booked: i64 = conn.query_row(
        r"
        SELECT COUNT(*) FROM appointment
        WHERE start_time < ?1 AND end_time > ?2 AND id != ?3
        ",
        params![end, start, exclude_id.unwrap_or(0)],
        |row| row.get(0),
    )?;
    if booked > 0 {
        return Ok(Some(ApiError::conflict("This time is already booked.")));
    }
    Ok(None)
}

fn find_owned(
    conn: &rusqlite::Connection,
    id: i64,
    student_email: &str,
) -> rusqlite::Result<Result<BookedAppointment, ApiError>> {
    let found = conn
        .query_row(
            &format!("SELECT {APPOINTMENT_COLUMNS} FROM appointment WHERE id = ?1"),
            [id],
            appointment_from_row,
        )
        .optional()?;
    Ok(match found {
        None => Err(ApiError::not_found(NOT_FOUND)),
        Some(appt) if normalize_email(&appt.student_email) != normalize_email(student_email) => Err(
            ApiError::forbidden("You can only change your own appointments."),
        ),
        Some(appt) => Ok(appt),
    })
}

fn get_by_id(conn: &rusqlite::Connection, id: i64) -> rusqlite::Result<BookedAppointment> {
    conn.query_row(
        &format!("SELECT {APPOINTMENT_COLUMNS} FROM appointment WHERE id = ?1"),
        [id],
        appointment_from_row,
    )
}

/// Bookings overlapping `span`, optionally ignoring one appointment
pub async fn overlapping_booking_spans(
    db: &Connection,
    span: Span,
    exclude_id: Option<i64>,
) -> Result<Vec<Span>, ApiError> {
    let start = to_sql_time(span.start);
    let end = to_sql_time(span.end);
    let rows = db
        .call(move |conn| {
            let mut stmt = conn.prepare(&format!(
                r"
                SELECT {APPOINTMENT_COLUMNS} FROM appointment
                WHERE start_time < ?1 AND end_time > ?2 AND id != ?3
                ORDER BY start_time ASC
                "
            ))?;
            let rows = stmt
                .query_map(
                    params![end, start, exclude_id.unwrap_or(0)],
                    appointment_from_row,
                )?
                .collect::<Result<Vec<_>, _>>()?;
            Ok(rows)
        })
        .await?;
    Ok(rows
        .into_iter()
        .map(|a| Span::new(a.start_time, a.end_time))
        .collect())
}

pub async fn list_appointments(
    db: &Connection,
    student_email: Option<String>,
) -> Result<Vec<BookedAppointment>, ApiError> {
    let rows = db
        .call(move |conn| {
            let rows = match student_email {
                Some(email) => {
                    let mut stmt = conn.prepare(&format!(
                        r"
                        SELECT {APPOINTMENT_COLUMNS} FROM appointment
                        WHERE student_email = ?1
                        ORDER BY start_time ASC
                        "
                    ))?;
                    stmt.query_map([email], appointment_from_row)?
                        .collect::<Result<Vec<_>, _>>()?
                }
                None => {
                    let mut stmt = conn.prepare(&format!(
                        "SELECT {APPOINTMENT_COLUMNS} FROM appointment ORDER BY start_time ASC"
                    ))?;
                    stmt.query_map([], appointment_from_row)?
                        .collect::<Result<Vec<_>, _>>()?
                }
            };
            Ok(rows)
        })
        .await?;
    Ok(rows)
}

/// Insert a booking after checking blocks and other bookings in the
/// same transaction.
pub async fn create_appointment(
    db: &Connection,
    new: NewAppointment,
) -> Result<BookedAppointment, ApiError> {
    db.call(move |conn| {
        let tx = conn.transaction()?;
        if let Some(conflict) = conflict_for(&tx, new.span, None)? {
            return Ok(Err(conflict));
        }
        tx.execute(
            r"
            INSERT INTO appointment
                (student_email, appointment_type, duration_minutes, start_time, end_time, status, notes)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
            ",
            params![
                new.student_email,
                new.appointment_type,
                new.duration_minutes,
                to_sql_time(new.span.start),
                to_sql_time(new.span.end),
                SCHEDULED_STATUS,
                new.notes,
            ],
        )?;
        let appt = get_by_id(&tx, tx.last_insert_rowid())?;
        tx.commit()?;
        Ok(Ok(appt))
    })
    .await?
}

pub async fn update_notes(
    db: &Connection,
    id: i64,
    student_email: String,
    notes: Option<String>,
) -> Result<BookedAppointment, ApiError> {
    db.call(move |conn| {
        let tx = conn.transaction()?;
        if let Err(e) = find_owned(&tx, id, &student_email)? {
            return Ok(Err(e));
        }
        tx.execute(
            "UPDATE appointment SET notes = ?1 WHERE id = ?2",
            params![notes, id],
        )?;
        let appt = get_by_id(&tx, id)?;
        tx.commit()?;
        Ok(Ok(appt))
    })
    .await?
}

/// Move an appointment keeping its duration. The new time gets the same
/// rules as a new booking but never conflicts with itself.
pub async fn reschedule_appointment(
    db: &Connection,
    id: i64,
    student_email: String,
    start: NaiveDateTime,
    now: NaiveDateTime,
) -> Result<BookedAppointment, ApiError> {
    db.call(move |conn| {
        let tx = conn.transaction()?;
        let existing = match find_owned(&tx, id, &student_email)? {
            Ok(appt) => appt,
            Err(e) => return Ok(Err(e)),
        };
        let span = match validate_span(start, existing.duration_minutes) {
            Ok(span) => span,
            Err(v) => return Ok(Err(ApiError::bad_request(v.detail("booked")))),
        };
        if span.start <= now {
            return Ok(Err(ApiError::bad_request(
                "Appointments cannot be moved into the past.",
            )));
        }
        if let Some(conflict) = conflict_for(&tx, span, Some(id))? {
            return Ok(Err(conflict));
        }
        tx.execute(
            "UPDATE appointment SET start_time = ?1, end_time = ?2 WHERE id = ?3",
            params![to_sql_time(span.start), to_sql_time(span.end), id],
        )?;
        let appt = get_by_id(&tx, id)?;
        tx.commit()?;
        Ok(Ok(appt))
    })
    .await?
}

pub async fn delete_appointment(
    db: &Connection,
    id: i64,
    student_email: String,
) -> Result<(), ApiError> {
    db.call(move |conn| {
        let tx = conn.transaction()?;
        if let Err(e) = find_owned(&tx, id, &student_email)? {
            return Ok(Err(e));
        }
        tx.execute("DELETE FROM appointment WHERE id = ?1", [id])?;
        tx.commit()?;
        Ok(Ok(()))
    })
    .await?
}
