//! Database queries for admin blocks
use chrono::NaiveDateTime;
use tokio_rusqlite::{Connection, params};

use crate::api::public::ApiError;
use crate::api::utils::{BLOCK_COLUMNS, block_from_row, date_column, time_column, to_sql_time};
use crate::scheduling::BlockedTime;
use crate::scheduling::rules::{BLOCKED_APPOINTMENT_TYPE, Span};

/// Blocks starting in `[from, to)` ordered by start
pub async fn list_blocks(
    db: &Connection,
    from: NaiveDateTime,
    to: Option<NaiveDateTime>,
) -> Result<Vec<BlockedTime>, ApiError> {
    let from = to_sql_time(from);
    // Keys sort lexicographically so a far-future sentinel works as "no end"
    let to = to.map(to_sql_time).unwrap_or_else(|| "9999-12-31T23:59:59".to_string());
    let blocks = db
        .call(move |conn| {
            let mut stmt = conn.prepare(&format!(
                r"
                SELECT {BLOCK_COLUMNS}
                FROM availability
                WHERE appointment_type = ?1
                  AND start_time >= ?2
                  AND start_time < ?3
                ORDER BY start_time ASC
                "
            ))?;
            let rows = stmt
                .query_map(params![BLOCKED_APPOINTMENT_TYPE, from, to], block_from_row)?
                .collect::<Result<Vec<_>, _>>()?;
            Ok(rows)
        })
        .await?;
    Ok(blocks)
}

/// Blocks overlapping `span`
pub async fn overlapping_block_spans(db: &Connection, span: Span) -> Result<Vec<Span>, ApiError> {
    let start = to_sql_time(span.start);
    let end = to_sql_time(span.end);
    let spans = db
        .call(move |conn| {
            let mut stmt = conn.prepare(&format!(
                r"
                SELECT {BLOCK_COLUMNS}
                FROM availability
                WHERE appointment_type = ?1
                  AND start_time < ?2
                  AND end_time > ?3
                ORDER BY start_time ASC
                "
            ))?;
            let rows = stmt
                .query_map(params![BLOCKED_APPOINTMENT_TYPE, end, start], block_from_row)?
                .collect::<Result<Vec<_>, _>>()?;
            Ok(rows)
        })
        .await?;
    Ok(spans
        .into_iter()
        .map(|b| Span::new(b.start_time, b.end_time))
        .collect())
}

/// Insert a block unless it overlaps another block or a booking. The
/// check and the insert share one transaction.
pub async fn create_block(db: &Connection, span: Span) -> Result<BlockedTime, ApiError> {
    let start = to_sql_time(span.start);
    let end = to_sql_time(span.end);
    let date = date_column(span.start.date());
    let time = time_column(span.start.time());
    let duration = (span.end - span.start).num_minutes();

    db.call(move |conn| {
        let tx = conn.transaction()?;

        let blocked: i64 = tx.query_row(
            r"
            SELECT COUNT(*) FROM availability
            WHERE appointment_type = ?1 AND start_time < ?2 AND end_time > ?3
            ",
            params![BLOCKED_APPOINTMENT_TYPE, end, start],
            |row| row.get(0),
        )?;
        if blocked > 0 {
            return Ok(Err(ApiError::conflict("This time is already blocked.")));
        }

        let booked: i64 = tx.query_row(
            "SELECT COUNT(*) FROM appointment WHERE start_time < ?1 AND end_time > ?2",
            params![end, start],
            |row| row.get(0),
        )?;
        if booked > 0 {
            return Ok(Err(ApiError::conflict(
                "This time is already booked and cannot be blocked.",
            )));
        }

        tx.execute(
            r"
            INSERT INTO availability
                (start_time, end_time, is_booked, date, time, duration_minutes, appointment_type)
            VALUES (?1, ?2, 0, ?3, ?4, ?5, ?6)
            ",
            params![start, end, date, time, duration, BLOCKED_APPOINTMENT_TYPE],
        )?;
        let id = tx.last_insert_rowid();
        let block = tx.query_row(
            &format!("SELECT {BLOCK_COLUMNS} FROM availability WHERE id = ?1"),
            [id],
            block_from_row,
        )?;
        tx.commit()?;
        Ok(Ok(block))
    })
    .await?
}

pub async fn delete_block(db: &Connection, id: i64) -> Result<(), ApiError> {
    db.call(move |conn| {
        let deleted = conn.execute(
            "DELETE FROM availability WHERE id = ?1 AND appointment_type = ?2",
            params![id, BLOCKED_APPOINTMENT_TYPE],
        )?;
        if deleted == 0 {
            return Ok(Err(ApiError::not_found("Blocked time not found.")));
        }
        Ok(Ok(()))
    })
    .await?
}
