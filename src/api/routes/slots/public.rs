//! Public types for the slots API
use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};

pub use crate::scheduling::{AvailabilitySlot, BlockedTime};

#[derive(Debug, Default, Serialize, Deserialize)]
pub struct SlotsQuery {
    #[serde(default)]
    pub students_only: bool,
}

#[derive(Debug, Default, Serialize, Deserialize)]
pub struct CreateBlockedTimeRequest {
    #[serde(default)]
    pub admin_email: String,
    pub date: Option<NaiveDate>,
    pub time: Option<NaiveTime>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration_minutes: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub appointment_type: Option<String>,
}

#[derive(Debug, Default, Serialize, Deserialize)]
pub struct AdminQuery {
    #[serde(default)]
    pub admin_email: String,
}
