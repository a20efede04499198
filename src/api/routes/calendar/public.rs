//! Public types for the calendar API
use serde::{Deserialize, Serialize};

pub use crate::scheduling::{AppointmentType, CalendarSlot};

#[derive(Debug, Default, Serialize, Deserialize)]
pub struct CalendarQuery {
    pub days: Option<i64>,
    pub appointment_type: Option<String>,
    /// Treat this appointment as free, for picking its new time
    pub exclude_appointment_id: Option<i64>,
}
