//! API routes module

pub mod appointments;
pub mod calendar;
pub mod slots;

use std::sync::{Arc, RwLock};

use crate::api::state::AppState;
use axum::Router;

type SharedState = Arc<RwLock<AppState>>;

/// Create the combined availability router. Every route shares the
/// same prefix so the sub routers are merged rather than nested.
pub fn router() -> Router<SharedState> {
    Router::new()
        // Raw slots and admin blocks
        .merge(slots::router())
        // Appointment types and the merged calendar
        .merge(calendar::router())
        // Student bookings
        .merge(appointments::router())
}
