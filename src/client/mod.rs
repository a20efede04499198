//! Typed HTTP client for the clinic availability API
//!
//! Every response body is decoded into the shared scheduling models so
//! a malformed payload fails here instead of deeper in a view.
use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use reqwest::{Client, Method, RequestBuilder};
use serde::Serialize;
use serde::de::DeserializeOwned;
use thiserror::Error;

use crate::api::public::ErrorBody;
use crate::api::public::appointments::{
    CreateAppointmentRequest, RescheduleRequest, UpdateNotesRequest,
};
use crate::api::public::slots::CreateBlockedTimeRequest;
use crate::scheduling::slot_key::instant_key;
use crate::scheduling::{
    AppointmentType, AvailabilitySlot, BlockedTime, BookedAppointment, CalendarSlot,
};

#[derive(Error, Debug)]
pub enum ClientError {
    #[error("HTTP {status}: {}", .detail.as_deref().unwrap_or("no detail"))]
    Http { status: u16, detail: Option<String> },

    #[error("Request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Unexpected response body: {0}")]
    Decode(#[from] serde_json::Error),
}

impl ClientError {
    /// Message shown to the user when `action` (e.g. "book appointment")
    /// fails. The server's `detail` wins when there is one.
    pub fn user_message(&self, action: &str) -> String {
        match self {
            ClientError::Http {
                detail: Some(detail),
                ..
            } => detail.clone(),
            ClientError::Http {
                status,
                detail: None,
            } => format!("Unable to {} (HTTP {}).", action, status),
            ClientError::Transport(_) | ClientError::Decode(_) => {
                format!("Unable to {}. Please try again.", action)
            }
        }
    }
}

pub type ClientResult<T> = Result<T, ClientError>;

#[derive(Debug, Clone)]
pub struct ClinicClient {
    client: Client,
    base_url: String,
}

impl ClinicClient {
    pub fn new(base_url: &str) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        self.client
            .request(method, format!("{}/availability{}", self.base_url, path))
    }

    /// Send and return the body of a successful response
    async fn send(&self, req: RequestBuilder) -> ClientResult<String> {
        let res = req.send().await?;
        let status = res.status();
        let text = res.text().await?;
        if !status.is_success() {
            let detail = serde_json::from_str::<ErrorBody>(&text)
                .ok()
                .map(|body| body.detail)
                .filter(|detail| !detail.trim().is_empty());
            tracing::debug!("Request failed with {}: {}", status, text);
            return Err(ClientError::Http {
                status: status.as_u16(),
                detail,
            });
        }
        Ok(text)
    }

    async fn send_json<T: DeserializeOwned>(&self, req: RequestBuilder) -> ClientResult<T> {
        let text = self.send(req).await?;
        Ok(serde_json::from_str(&text)?)
    }

    async fn send_body<B: Serialize, T: DeserializeOwned>(
        &self,
        method: Method,
        path: &str,
        body: &B,
    ) -> ClientResult<T> {
        self.send_json(self.request(method, path).json(body)).await
    }

    pub async fn list_slots(&self, students_only: bool) -> ClientResult<Vec<AvailabilitySlot>> {
        let mut req = self.request(Method::GET, "/slots");
        if students_only {
            req = req.query(&[("students_only", "true")]);
        }
        self.send_json(req).await
    }

    pub async fn create_block(
        &self,
        admin_email: &str,
        date: NaiveDate,
        time: NaiveTime,
        duration_minutes: Option<i64>,
    ) -> ClientResult<BlockedTime> {
        let body = CreateBlockedTimeRequest {
            admin_email: admin_email.to_string(),
            date: Some(date),
            time: Some(time),
            duration_minutes,
            appointment_type: None,
        };
        self.send_body(Method::POST, "/slots", &body).await
    }

    pub async fn delete_block(&self, id: i64, admin_email: &str) -> ClientResult<()> {
        let req = self
            .request(Method::DELETE, &format!("/slots/{}", id))
            .query(&[("admin_email", admin_email)]);
        self.send(req).await?;
        Ok(())
    }

    pub async fn blocked_times(&self) -> ClientResult<Vec<BlockedTime>> {
        self.send_json(self.request(Method::GET, "/blocked-times"))
            .await
    }

    pub async fn appointment_types(&self) -> ClientResult<Vec<AppointmentType>> {
        self.send_json(self.request(Method::GET, "/appointment-types"))
            .await
    }

    /// `exclude_appointment_id` lets a reschedule see its own time as free
    pub async fn calendar(
        &self,
        days: i64,
        appointment_type: &str,
        exclude_appointment_id: Option<i64>,
    ) -> ClientResult<Vec<CalendarSlot>> {
        let mut req = self.request(Method::GET, "/calendar").query(&[
            ("days", days.to_string()),
            ("appointment_type", appointment_type.to_string()),
        ]);
        if let Some(id) = exclude_appointment_id {
            req = req.query(&[("exclude_appointment_id", id)]);
        }
        self.send_json(req).await
    }

    pub async fn all_appointments(&self, admin_email: &str) -> ClientResult<Vec<BookedAppointment>> {
        let req = self
            .request(Method::GET, "/appointments")
            .query(&[("admin_email", admin_email)]);
        self.send_json(req).await
    }

    pub async fn my_appointments(
        &self,
        student_email: &str,
    ) -> ClientResult<Vec<BookedAppointment>> {
        let req = self
            .request(Method::GET, "/appointments/mine")
            .query(&[("student_email", student_email)]);
        self.send_json(req).await
    }

    pub async fn book(
        &self,
        student_email: &str,
        appointment_type: &str,
        start_time: NaiveDateTime,
        notes: Option<String>,
    ) -> ClientResult<BookedAppointment> {
        let body = CreateAppointmentRequest {
            student_email: student_email.to_string(),
            appointment_type: appointment_type.to_string(),
            start_time: instant_key(start_time),
            notes,
        };
        self.send_body(Method::POST, "/appointments", &body).await
    }

    pub async fn update_notes(
        &self,
        id: i64,
        student_email: &str,
        notes: Option<String>,
    ) -> ClientResult<BookedAppointment> {
        let body = UpdateNotesRequest {
            student_email: student_email.to_string(),
            notes,
        };
        self.send_body(Method::PATCH, &format!("/appointments/{}/notes", id), &body)
            .await
    }

    pub async fn reschedule(
        &self,
        id: i64,
        student_email: &str,
        start_time: NaiveDateTime,
    ) -> ClientResult<BookedAppointment> {
        let body = RescheduleRequest {
            student_email: student_email.to_string(),
            start_time: instant_key(start_time),
        };
        self.send_body(
            Method::PATCH,
            &format!("/appointments/{}/reschedule", id),
            &body,
        )
        .await
    }

    pub async fn cancel(&self, id: i64, student_email: &str) -> ClientResult<()> {
        let req = self
            .request(Method::DELETE, &format!("/appointments/{}", id))
            .query(&[("student_email", student_email)]);
        self.send(req).await?;
        Ok(())
    }
}
