//! Row mapping shared by the route `db` modules
use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use rusqlite::Row;
use rusqlite::types::Type;

use crate::scheduling::slot_key::{KEY_FORMAT, instant_key};
use crate::scheduling::{BlockedTime, BookedAppointment};

pub const APPOINTMENT_COLUMNS: &str =
    "id, student_email, appointment_type, duration_minutes, start_time, end_time, status, notes";

pub const BLOCK_COLUMNS: &str = "id, start_time, end_time";

pub fn to_sql_time(t: NaiveDateTime) -> String {
    instant_key(t)
}

fn parse_err(idx: usize, err: chrono::ParseError) -> rusqlite::Error {
    rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(err))
}

pub fn get_datetime(row: &Row, idx: usize) -> rusqlite::Result<NaiveDateTime> {
    let raw: String = row.get(idx)?;
    NaiveDateTime::parse_from_str(&raw, KEY_FORMAT).map_err(|e| parse_err(idx, e))
}

pub fn appointment_from_row(row: &Row) -> rusqlite::Result<BookedAppointment> {
    Ok(BookedAppointment {
        id: row.get(0)?,
        student_email: row.get(1)?,
        appointment_type: row.get(2)?,
        duration_minutes: row.get(3)?,
        start_time: get_datetime(row, 4)?,
        end_time: get_datetime(row, 5)?,
        status: row.get(6)?,
        notes: row.get(7)?,
    })
}

pub fn block_from_row(row: &Row) -> rusqlite::Result<BlockedTime> {
    let start_time = get_datetime(row, 1)?;
    Ok(BlockedTime {
        id: row.get(0)?,
        date: start_time.date(),
        time: start_time.time(),
        start_time,
        end_time: get_datetime(row, 2)?,
    })
}

pub fn date_column(date: NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}

pub fn time_column(time: NaiveTime) -> String {
    time.format("%H:%M:%S").to_string()
}
