use std::sync::{Arc, Weak};
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::Mutex;

use super::{JobOutcome, PeriodicJob};
use crate::views::BlockTimeView;

/// Keeps the admin grid's booked cells fresh while the view is alive
#[derive(Debug)]
pub struct RefreshBookings {
    view: Weak<Mutex<BlockTimeView>>,
    interval: Duration,
}

impl RefreshBookings {
    pub fn new(view: &Arc<Mutex<BlockTimeView>>, interval_secs: u64) -> Self {
        Self {
            view: Arc::downgrade(view),
            interval: Duration::from_secs(interval_secs.max(1)),
        }
    }
}

#[async_trait]
impl PeriodicJob for RefreshBookings {
    fn interval(&self) -> Duration {
        self.interval
    }

    async fn run_job(&self) -> JobOutcome {
        let Some(view) = self.view.upgrade() else {
            tracing::debug!("Block time view is gone, stopping booking refresh");
            return JobOutcome::Finished;
        };
        let mut view = view.lock().await;
        if view.is_admin() {
            view.refresh_bookings().await;
        }
        JobOutcome::Continue
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::ClinicClient;
    use crate::session::{Role, Session};
    use chrono::NaiveDate;

    fn view(url: &str, session: Session) -> Arc<Mutex<BlockTimeView>> {
        Arc::new(Mutex::new(BlockTimeView::new(
            ClinicClient::new(url),
            session,
            NaiveDate::from_ymd_opt(2024, 1, 8).unwrap(),
        )))
    }

    #[tokio::test]
    async fn it_finishes_once_the_view_is_dropped() {
        let view = view("http://127.0.0.1:9", Session::default());
        let job = RefreshBookings::new(&view, 5);
        assert_eq!(job.interval(), Duration::from_secs(5));
        // A zero period would panic in the ticker
        assert_eq!(
            RefreshBookings::new(&view, 0).interval(),
            Duration::from_secs(1)
        );
        assert_eq!(job.run_job().await, JobOutcome::Continue);

        drop(view);
        assert_eq!(job.run_job().await, JobOutcome::Finished);
    }

    #[tokio::test]
    async fn it_refreshes_occupied_cells_for_admins() {
        let mut server = mockito::Server::new_async().await;
        let appointments = server
            .mock("GET", "/availability/appointments")
            .match_query(mockito::Matcher::UrlEncoded(
                "admin_email".into(),
                "nurse@admin.edu".into(),
            ))
            .with_status(200)
            .with_body(
                r#"[{"id": 1, "student_email": "kim@school.edu", "appointment_type": "general",
                     "duration_minutes": 30, "start_time": "2024-01-08T09:00:00",
                     "end_time": "2024-01-08T09:30:00", "status": "scheduled", "notes": null}]"#,
            )
            .create();

        let view = view(&server.url(), Session::new("nurse@admin.edu", Role::Admin));
        let job = RefreshBookings::new(&view, 5);
        job.run_job().await;

        appointments.assert();
        let view = view.lock().await;
        assert_eq!(view.occupied.len(), 2);
        assert!(view.occupied.contains("2024-01-08T09:15:00"));
    }
}
