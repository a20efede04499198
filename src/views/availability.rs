//! Student availability: pick a type, filter, stage a slot and book it
use chrono::{NaiveDate, NaiveDateTime};
use itertools::Itertools;

use crate::client::ClinicClient;
use crate::scheduling::rules::GENERAL_APPOINTMENT_TYPE;
use crate::scheduling::week::{TimeOfDay, WeekIndex, week_window};
use crate::scheduling::{AppointmentType, BookedAppointment, CalendarSlot};
use crate::session::Session;

pub struct AvailabilityView {
    client: ClinicClient,
    session: Session,
    days: i64,
    pub appointment_types: Vec<AppointmentType>,
    pub appointment_type: String,
    pub time_filter: TimeOfDay,
    pub week: WeekIndex,
    pub slots: Vec<CalendarSlot>,
    pub staged: Option<CalendarSlot>,
    pub confirmation: Option<BookedAppointment>,
    pub error: Option<String>,
    pub loading: bool,
    pub booking: bool,
}

impl AvailabilityView {
    pub fn new(client: ClinicClient, session: Session, days: i64) -> Self {
        Self {
            client,
            session,
            days,
            appointment_types: vec![],
            appointment_type: GENERAL_APPOINTMENT_TYPE.to_string(),
            time_filter: TimeOfDay::default(),
            week: WeekIndex::default(),
            slots: vec![],
            staged: None,
            confirmation: None,
            error: None,
            loading: false,
            booking: false,
        }
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub async fn load_types(&mut self) {
        match self.client.appointment_types().await {
            Ok(types) => self.appointment_types = types,
            Err(e) => self.error = Some(e.user_message("load appointment types")),
        }
    }

    /// Fetch a fresh calendar for the selected type. The week index is
    /// left alone.
    pub async fn load(&mut self) {
        self.loading = true;
        let result = self
            .client
            .calendar(self.days, &self.appointment_type, None)
            .await;
        self.loading = false;

        match result {
            Ok(slots) => {
                self.slots = slots;
                self.error = None;
            }
            Err(e) => {
                tracing::debug!("Loading availability failed: {}", e);
                self.error = Some(e.user_message("load availability"));
            }
        }
        self.reconcile_staged();
    }

    pub async fn set_appointment_type(&mut self, name: &str) {
        self.appointment_type = name.trim().to_lowercase();
        self.load().await;
    }

    pub fn set_time_filter(&mut self, filter: TimeOfDay) {
        self.time_filter = filter;
        self.reconcile_staged();
    }

    pub fn set_week(&mut self, week: WeekIndex) {
        self.week = week;
    }

    /// Available slots of the selected type passing the time filter
    pub fn available_slots(&self) -> Vec<&CalendarSlot> {
        self.slots
            .iter()
            .filter(|s| {
                s.is_available
                    && s.appointment_type == self.appointment_type
                    && self.time_filter.matches(s.time)
            })
            .sorted_by_key(|s| s.start_time)
            .collect()
    }

    /// The seven days of the selected week with their available slots
    pub fn week_days(&self, today: NaiveDate) -> Vec<(NaiveDate, Vec<&CalendarSlot>)> {
        let available = self.available_slots();
        week_window(today, self.week)
            .into_iter()
            .map(|day| {
                let slots = available
                    .iter()
                    .filter(|s| s.date == day)
                    .copied()
                    .collect();
                (day, slots)
            })
            .collect()
    }

    /// Stage the available slot starting at `start`. No request is made.
    pub fn select(&mut self, start: NaiveDateTime) -> bool {
        let found = self
            .available_slots()
            .into_iter()
            .find(|s| s.start_time == start)
            .cloned();
        match found {
            Some(slot) => {
                self.staged = Some(slot);
                self.error = None;
                true
            }
            None => {
                self.error = Some("That time is no longer available.".to_string());
                false
            }
        }
    }

    pub fn clear_selection(&mut self) {
        self.staged = None;
    }

    pub async fn confirm_booking(&mut self, notes: Option<String>) {
        self.error = None;
        self.confirmation = None;

        let Some(slot) = self.staged.clone() else {
            self.error = Some("Please select a time slot.".to_string());
            return;
        };

        self.booking = true;
        let result = self
            .client
            .book(
                &self.session.email,
                &slot.appointment_type,
                slot.start_time,
                notes,
            )
            .await;
        self.booking = false;

        match result {
            Ok(appt) => {
                tracing::info!("Booked {} at {}", appt.appointment_type, appt.start_time);
                self.staged = None;
                self.load().await;
                self.confirmation = Some(appt);
            }
            Err(e) => self.error = Some(e.user_message("book appointment")),
        }
    }

    fn reconcile_staged(&mut self) {
        let still_offered = self.staged.as_ref().is_some_and(|staged| {
            self.available_slots()
                .iter()
                .any(|s| s.start_time == staged.start_time)
        });
        if !still_offered {
            self.staged = None;
        }
    }
}
