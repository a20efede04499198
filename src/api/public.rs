//! Public API types

use axum::Json;
use axum::extract::rejection::{JsonRejection, PathRejection};
use axum::response::{IntoResponse, Response};
use axum_extra::extract::QueryRejection;
use http::StatusCode;
use serde::{Deserialize, Serialize};

// Errors

pub const DATABASE_UNAVAILABLE: &str = "Database unavailable. Verify the database path.";

/// Body of every error response
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorBody {
    pub detail: String,
}

#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub detail: String,
}

impl ApiError {
    pub fn new(status: StatusCode, detail: impl Into<String>) -> Self {
        Self {
            status,
            detail: detail.into(),
        }
    }

    pub fn bad_request(detail: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, detail)
    }

    pub fn forbidden(detail: impl Into<String>) -> Self {
        Self::new(StatusCode::FORBIDDEN, detail)
    }

    pub fn not_found(detail: impl Into<String>) -> Self {
        Self::new(StatusCode::NOT_FOUND, detail)
    }

    pub fn conflict(detail: impl Into<String>) -> Self {
        Self::new(StatusCode::CONFLICT, detail)
    }
}

/// Convert `ApiError` into an Axum compatible response.
impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        if self.status.is_server_error() {
            tracing::error!("{}: {}", self.status, self.detail);
        } else {
            tracing::debug!("{}: {}", self.status, self.detail);
        }
        (self.status, Json(ErrorBody { detail: self.detail })).into_response()
    }
}

/// Enables using `?` on storage calls and lets extractors reject with
/// `ApiError`. Extractor rejections keep their status and message,
/// anything else means the database could not be used.
impl<E> From<E> for ApiError
where
    E: Into<anyhow::Error>,
{
    fn from(err: E) -> Self {
        let err: anyhow::Error = err.into();
        if let Some(rejection) = err.downcast_ref::<JsonRejection>() {
            return Self::new(rejection.status(), rejection.body_text());
        }
        if let Some(rejection) = err.downcast_ref::<PathRejection>() {
            return Self::new(rejection.status(), rejection.body_text());
        }
        if let Some(rejection) = err.downcast_ref::<QueryRejection>() {
            return Self::new(rejection.status(), rejection.body_text());
        }
        tracing::error!("Storage error: {:#}", err);
        Self::new(StatusCode::SERVICE_UNAVAILABLE, DATABASE_UNAVAILABLE)
    }
}

// Re-export public types from each route

pub mod appointments {
    pub use crate::api::routes::appointments::public::*;
}

pub mod calendar {
    pub use crate::api::routes::calendar::public::*;
}

pub mod slots {
    pub use crate::api::routes::slots::public::*;
}
