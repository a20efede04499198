//! Clinic hours and the rules every block or booking must satisfy
use chrono::{Datelike, Duration, NaiveDate, NaiveDateTime, NaiveTime, Timelike, Weekday};

use super::models::AppointmentType;
use super::slot_key::SLOT_MINUTES;

pub const OPEN_HOUR: u32 = 9;
pub const CLOSE_HOUR: u32 = 16;
pub const LUNCH_HOUR: u32 = 12;
/// How far ahead `GET /availability/slots` generates slots
pub const SLOT_RANGE_DAYS: i64 = 28;
pub const DEFAULT_CALENDAR_DAYS: i64 = 14;
pub const DEFAULT_SLOT_DURATION_MINUTES: i64 = SLOT_MINUTES;
pub const BLOCKED_APPOINTMENT_TYPE: &str = "blocked";
pub const GENERAL_APPOINTMENT_TYPE: &str = "general";
pub const ADMIN_EMAIL_DOMAIN: &str = "@admin.edu";

pub fn open_time() -> NaiveTime {
    NaiveTime::from_hms_opt(OPEN_HOUR, 0, 0).expect("valid opening time")
}

pub fn last_start_time() -> NaiveTime {
    close_time() - Duration::minutes(SLOT_MINUTES)
}

pub fn close_time() -> NaiveTime {
    NaiveTime::from_hms_opt(CLOSE_HOUR, 0, 0).expect("valid closing time")
}

/// Half-open time span `[start, end)`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Span {
    pub start: NaiveDateTime,
    pub end: NaiveDateTime,
}

impl Span {
    pub fn new(start: NaiveDateTime, end: NaiveDateTime) -> Self {
        Self { start, end }
    }

    pub fn minutes(start: NaiveDateTime, duration_minutes: i64) -> Self {
        Self::new(start, start + Duration::minutes(duration_minutes))
    }

    pub fn overlaps(&self, other: &Span) -> bool {
        self.start < other.end && self.end > other.start
    }
}

/// The lunch hour is never bookable.
pub fn lunch_span(date: NaiveDate) -> Span {
    let start = date.and_time(
        NaiveTime::from_hms_opt(LUNCH_HOUR, 0, 0).expect("valid lunch time"),
    );
    Span::new(start, start + Duration::hours(1))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SlotRuleViolation {
    Weekend,
    OutsideHours,
    OffBoundary,
    Lunch,
    PastClosing,
    InvalidDuration,
}

impl SlotRuleViolation {
    /// Human readable message. `verb` is what the caller tried to do
    /// with the time, e.g. "blocked" or "booked".
    pub fn detail(&self, verb: &str) -> String {
        match self {
            SlotRuleViolation::Weekend => {
                format!("Times can only be {verb} on weekdays (Monday through Friday).")
            }
            SlotRuleViolation::OutsideHours => {
                format!("Times can only be {verb} between 9:00 AM and 3:45 PM.")
            }
            SlotRuleViolation::OffBoundary => "Times must be on 15-minute boundaries.".to_string(),
            SlotRuleViolation::Lunch => {
                "12:00 PM to 1:00 PM is reserved for lunch and is always blocked.".to_string()
            }
            SlotRuleViolation::PastClosing => "Appointments must end by 4:00 PM.".to_string(),
            SlotRuleViolation::InvalidDuration => {
                "Duration must be a positive multiple of 15 minutes.".to_string()
            }
        }
    }
}

pub fn validate_slot_start(date: NaiveDate, time: NaiveTime) -> Result<(), SlotRuleViolation> {
    if matches!(date.weekday(), Weekday::Sat | Weekday::Sun) {
        return Err(SlotRuleViolation::Weekend);
    }
    if time < open_time() || time > last_start_time() {
        return Err(SlotRuleViolation::OutsideHours);
    }
    if time.minute() as i64 % SLOT_MINUTES != 0 || time.second() != 0 || time.nanosecond() != 0 {
        return Err(SlotRuleViolation::OffBoundary);
    }
    if time.hour() == LUNCH_HOUR {
        return Err(SlotRuleViolation::Lunch);
    }
    Ok(())
}

/// Checks a full `[start, start + duration)` span: the start rules, a
/// sane duration, closing time and the lunch hour.
pub fn validate_span(start: NaiveDateTime, duration_minutes: i64) -> Result<Span, SlotRuleViolation> {
    validate_slot_start(start.date(), start.time())?;
    if duration_minutes <= 0 || duration_minutes % SLOT_MINUTES != 0 {
        return Err(SlotRuleViolation::InvalidDuration);
    }
    let span = Span::minutes(start, duration_minutes);
    if span.end > start.date().and_time(close_time()) {
        return Err(SlotRuleViolation::PastClosing);
    }
    if span.overlaps(&lunch_span(start.date())) {
        return Err(SlotRuleViolation::Lunch);
    }
    Ok(span)
}

pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

pub fn is_admin_email(email: &str) -> bool {
    normalize_email(email).ends_with(ADMIN_EMAIL_DOMAIN)
}

/// Appointment types students can book, with their default durations.
pub fn appointment_types() -> Vec<AppointmentType> {
    [
        ("general", "General visit", 30),
        ("immunization", "Immunization", 15),
        ("testing", "Testing", 15),
        ("counseling", "Counseling", 45),
    ]
    .into_iter()
    .map(|(name, label, duration_minutes)| AppointmentType {
        name: name.to_string(),
        label: label.to_string(),
        duration_minutes,
    })
    .collect()
}

pub fn find_appointment_type(name: &str) -> Option<AppointmentType> {
    let name = name.trim().to_lowercase();
    appointment_types().into_iter().find(|t| t.name == name)
}
