//! Database queries for the merged calendar
use tokio_rusqlite::Connection;

use crate::api::public::ApiError;
use crate::api::routes::appointments::db::overlapping_booking_spans;
use crate::api::routes::slots::db::overlapping_block_spans;
use crate::scheduling::rules::Span;

/// Blocks and bookings overlapping `window`, in that order
pub async fn busy_spans(
    db: &Connection,
    window: Span,
    exclude_appointment_id: Option<i64>,
) -> Result<(Vec<Span>, Vec<Span>), ApiError> {
    let blocks = overlapping_block_spans(db, window).await?;
    let bookings = overlapping_booking_spans(db, window, exclude_appointment_id).await?;
    Ok((blocks, bookings))
}
