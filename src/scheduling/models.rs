//! Records exchanged between the clinic API and its clients
use chrono::{Duration, NaiveDate, NaiveDateTime, NaiveTime};
use serde::{Deserialize, Serialize};

/// One bookable unit as listed by `GET /availability/slots`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AvailabilitySlot {
    pub id: i64,
    pub date: NaiveDate,
    pub time: NaiveTime,
    pub duration_minutes: i64,
    pub appointment_type: String,
    pub start_time: NaiveDateTime,
    pub end_time: NaiveDateTime,
    pub is_booked: bool,
}

/// An admin-created exclusion. Stored as an availability row with the
/// `blocked` appointment type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockedTime {
    pub id: i64,
    pub date: NaiveDate,
    pub time: NaiveTime,
    pub start_time: NaiveDateTime,
    pub end_time: NaiveDateTime,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BookedAppointment {
    pub id: i64,
    pub student_email: String,
    pub appointment_type: String,
    pub duration_minutes: i64,
    pub start_time: NaiveDateTime,
    pub end_time: NaiveDateTime,
    pub status: String,
    #[serde(default)]
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SlotStatus {
    Available,
    Blocked,
    Booked,
}

/// Display-only merge of slot, block and booking state for one bucket
/// and one appointment type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CalendarSlot {
    pub date: NaiveDate,
    pub time: NaiveTime,
    pub duration_minutes: i64,
    pub appointment_type: String,
    pub start_time: NaiveDateTime,
    pub end_time: NaiveDateTime,
    pub status: SlotStatus,
    pub is_available: bool,
    pub is_blocked: bool,
    pub is_booked: bool,
}

impl CalendarSlot {
    pub fn new(
        start_time: NaiveDateTime,
        duration_minutes: i64,
        appointment_type: &str,
        status: SlotStatus,
    ) -> Self {
        Self {
            date: start_time.date(),
            time: start_time.time(),
            duration_minutes,
            appointment_type: appointment_type.to_string(),
            start_time,
            end_time: start_time + Duration::minutes(duration_minutes),
            status,
            is_available: status == SlotStatus::Available,
            is_blocked: status == SlotStatus::Blocked,
            is_booked: status == SlotStatus::Booked,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppointmentType {
    pub name: String,
    pub label: String,
    pub duration_minutes: i64,
}
