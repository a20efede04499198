//! Admin block-time calendar
use std::collections::{BTreeMap, BTreeSet};

use chrono::{Duration, NaiveDate, NaiveDateTime};

use crate::client::ClinicClient;
use crate::scheduling::grid::{CalendarGrid, ToggleAction, build_grid, plan_toggle};
use crate::scheduling::slot_key::occupied_keys;
use crate::scheduling::week::week_start;
use crate::scheduling::{BlockedTime, BookedAppointment};
use crate::session::Session;

pub struct BlockTimeView {
    client: ClinicClient,
    session: Session,
    pub blocks: BTreeMap<String, i64>,
    pub bookings: Vec<BookedAppointment>,
    pub occupied: BTreeSet<String>,
    pub week_anchor: NaiveDate,
    pub message: Option<String>,
    pub loading: bool,
}

/// Every bucket a block covers maps to that block's id
fn block_map(blocks: &[BlockedTime]) -> BTreeMap<String, i64> {
    blocks
        .iter()
        .flat_map(|b| {
            occupied_keys(b.start_time, b.end_time)
                .into_iter()
                .map(move |key| (key, b.id))
        })
        .collect()
}

impl BlockTimeView {
    pub fn new(client: ClinicClient, session: Session, today: NaiveDate) -> Self {
        Self {
            client,
            session,
            blocks: BTreeMap::new(),
            bookings: vec![],
            occupied: BTreeSet::new(),
            week_anchor: week_start(today),
            message: None,
            loading: false,
        }
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn is_admin(&self) -> bool {
        self.session.is_admin()
    }

    /// Reload blocks and bookings
    pub async fn load(&mut self) {
        self.loading = true;
        match self.client.blocked_times().await {
            Ok(blocks) => self.blocks = block_map(&blocks),
            Err(e) => self.message = Some(e.user_message("load blocked times")),
        }
        self.refresh_bookings().await;
        self.loading = false;
    }

    /// Only bookings change under an admin's feet, so this is what the
    /// poller calls.
    pub async fn refresh_bookings(&mut self) {
        if !self.is_admin() {
            return;
        }
        match self.client.all_appointments(&self.session.email).await {
            Ok(bookings) => {
                self.occupied = bookings
                    .iter()
                    .flat_map(|b| occupied_keys(b.start_time, b.end_time))
                    .collect();
                self.bookings = bookings;
            }
            Err(e) => self.message = Some(e.user_message("load appointments")),
        }
    }

    pub fn grid(&self, now: NaiveDateTime) -> CalendarGrid {
        build_grid(self.week_anchor, now, &self.blocks, &self.occupied)
    }

    pub fn set_week_anchor(&mut self, date: NaiveDate) {
        self.week_anchor = week_start(date);
    }

    pub fn next_week(&mut self) {
        self.week_anchor += Duration::days(7);
    }

    pub fn previous_week(&mut self) {
        self.week_anchor -= Duration::days(7);
    }

    /// Block or unblock the cell starting at `start`.
    ///
    /// Past, booked and lunch cells are refused here without a request.
    /// Otherwise the local map is updated as soon as the server accepts
    /// the change and then everything is reloaded.
    pub async fn toggle(&mut self, start: NaiveDateTime, now: NaiveDateTime) -> Option<ToggleAction> {
        self.message = None;
        let grid = self.grid(now);
        let Some(cell) = grid.cell(start) else {
            self.message = Some("That time is not on this week's calendar.".to_string());
            return None;
        };

        let action = match plan_toggle(cell) {
            Ok(action) => action,
            Err(rejection) => {
                self.message = Some(rejection.to_string());
                return None;
            }
        };

        let applied = match &action {
            ToggleAction::Block { date, time } => {
                match self
                    .client
                    .create_block(&self.session.email, *date, *time, None)
                    .await
                {
                    Ok(block) => {
                        self.blocks.extend(block_map(std::slice::from_ref(&block)));
                        self.message = Some("Time blocked.".to_string());
                        true
                    }
                    Err(e) => {
                        self.message = Some(e.user_message("block time"));
                        false
                    }
                }
            }
            ToggleAction::Unblock { id } => {
                match self.client.delete_block(*id, &self.session.email).await {
                    Ok(()) => {
                        self.blocks.retain(|_, block_id| *block_id != *id);
                        self.message = Some("Time unblocked.".to_string());
                        true
                    }
                    Err(e) => {
                        self.message = Some(e.user_message("unblock time"));
                        false
                    }
                }
            }
        };

        if !applied {
            return None;
        }
        tracing::debug!("Applied {:?}", action);
        let message = self.message.take();
        self.load().await;
        // A reload failure replaces the success message
        if self.message.is_none() {
            self.message = message;
        }
        Some(action)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::Role;

    fn monday() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, 8).unwrap()
    }

    fn at(h: u32, m: u32) -> NaiveDateTime {
        monday().and_hms_opt(h, m, 0).unwrap()
    }

    fn admin_view(server: &mockito::Server) -> BlockTimeView {
        BlockTimeView::new(
            ClinicClient::new(&server.url()),
            Session::new("nurse@admin.edu", Role::Admin),
            monday(),
        )
    }

    #[tokio::test]
    async fn it_rejects_locally_without_requests() {
        let mut server = mockito::Server::new_async().await;
        let create = server.mock("POST", "/availability/slots").expect(0).create();
        let mut view = admin_view(&server);
        view.occupied = occupied_keys(at(10, 0), at(10, 30));
        let now = at(9, 30);

        assert!(view.toggle(at(9, 0), now).await.is_none());
        assert_eq!(view.message.as_deref(), Some("Past times cannot be changed."));

        assert!(view.toggle(at(10, 15), now).await.is_none());
        assert_eq!(
            view.message.as_deref(),
            Some("This time is already booked and cannot be blocked.")
        );

        assert!(view.toggle(at(12, 30), now).await.is_none());
        assert_eq!(
            view.message.as_deref(),
            Some("12:00 PM to 1:00 PM is reserved for lunch and is always blocked.")
        );
        create.assert();
    }

    #[tokio::test]
    async fn it_blocks_then_reloads() {
        let mut server = mockito::Server::new_async().await;
        let _create = server
            .mock("POST", "/availability/slots")
            .with_status(201)
            .with_body(
                r#"{"id": 3, "date": "2024-01-08", "time": "11:00:00",
                    "start_time": "2024-01-08T11:00:00", "end_time": "2024-01-08T11:15:00"}"#,
            )
            .create();
        let _blocks = server
            .mock("GET", "/availability/blocked-times")
            .with_status(200)
            .with_body(
                r#"[{"id": 3, "date": "2024-01-08", "time": "11:00:00",
                    "start_time": "2024-01-08T11:00:00", "end_time": "2024-01-08T11:15:00"}]"#,
            )
            .create();
        let _appointments = server
            .mock("GET", "/availability/appointments")
            .match_query(mockito::Matcher::Any)
            .with_status(200)
            .with_body("[]")
            .create();

        let mut view = admin_view(&server);
        let action = view.toggle(at(11, 0), at(8, 0)).await;

        assert!(matches!(action, Some(ToggleAction::Block { .. })));
        assert_eq!(view.blocks.get("2024-01-08T11:00:00"), Some(&3));
        assert_eq!(view.message.as_deref(), Some("Time blocked."));
        let grid = view.grid(at(8, 0));
        assert_eq!(grid.cell(at(11, 0)).unwrap().block_id, Some(3));
    }

    #[tokio::test]
    async fn it_marks_every_cell_a_long_block_covers() {
        let mut server = mockito::Server::new_async().await;
        let _blocks = server
            .mock("GET", "/availability/blocked-times")
            .with_status(200)
            .with_body(
                r#"[{"id": 5, "date": "2024-01-08", "time": "09:00:00",
                    "start_time": "2024-01-08T09:00:00", "end_time": "2024-01-08T09:30:00"}]"#,
            )
            .create();
        let _appointments = server
            .mock("GET", "/availability/appointments")
            .match_query(mockito::Matcher::Any)
            .with_status(200)
            .with_body("[]")
            .create();
        let create = server.mock("POST", "/availability/slots").expect(0).create();
        let delete = server
            .mock("DELETE", "/availability/slots/5")
            .match_query(mockito::Matcher::Any)
            .with_status(204)
            .create();

        let mut view = admin_view(&server);
        view.load().await;
        let grid = view.grid(at(8, 0));
        assert_eq!(grid.cell(at(9, 0)).unwrap().block_id, Some(5));
        assert_eq!(grid.cell(at(9, 15)).unwrap().block_id, Some(5));
        assert_eq!(grid.cell(at(9, 30)).unwrap().block_id, None);

        // The second half unblocks the whole block rather than posting
        let action = view.toggle(at(9, 15), at(8, 0)).await;
        assert_eq!(action, Some(ToggleAction::Unblock { id: 5 }));
        create.assert();
        delete.assert();
    }

    #[tokio::test]
    async fn it_skips_booking_refresh_for_students() {
        let mut server = mockito::Server::new_async().await;
        let appointments = server
            .mock("GET", "/availability/appointments")
            .match_query(mockito::Matcher::Any)
            .expect(0)
            .create();
        let mut view = BlockTimeView::new(
            ClinicClient::new(&server.url()),
            Session::default(),
            monday(),
        );
        view.refresh_bookings().await;
        appointments.assert();
    }

    #[test]
    fn it_moves_between_weeks() {
        let server_url = "http://127.0.0.1:9";
        let mut view = BlockTimeView::new(
            ClinicClient::new(server_url),
            Session::default(),
            monday() + Duration::days(3),
        );
        assert_eq!(view.week_anchor, monday());
        view.next_week();
        assert_eq!(view.week_anchor, monday() + Duration::days(7));
        view.previous_week();
        view.set_week_anchor(monday() + Duration::days(20));
        assert_eq!(view.week_anchor, monday() + Duration::days(14));
    }
}
