//! Public types for the appointments API
use serde::{Deserialize, Serialize};

pub use crate::scheduling::BookedAppointment;

#[derive(Debug, Default, Serialize, Deserialize)]
pub struct AdminQuery {
    #[serde(default)]
    pub admin_email: String,
}

#[derive(Debug, Default, Serialize, Deserialize)]
pub struct StudentQuery {
    #[serde(default)]
    pub student_email: String,
}

#[derive(Debug, Default, Serialize, Deserialize)]
pub struct CreateAppointmentRequest {
    #[serde(default)]
    pub student_email: String,
    #[serde(default)]
    pub appointment_type: String,
    /// ISO 8601, with or without an offset
    #[serde(default)]
    pub start_time: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

#[derive(Debug, Default, Serialize, Deserialize)]
pub struct UpdateNotesRequest {
    #[serde(default)]
    pub student_email: String,
    #[serde(default)]
    pub notes: Option<String>,
}

#[derive(Debug, Default, Serialize, Deserialize)]
pub struct RescheduleRequest {
    #[serde(default)]
    pub student_email: String,
    #[serde(default)]
    pub start_time: String,
}
