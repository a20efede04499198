//! A student's own appointments: notes, guided reschedule and cancel
use std::collections::{BTreeMap, HashSet};

use chrono::{NaiveDate, NaiveDateTime};

use crate::client::ClinicClient;
use crate::scheduling::{BookedAppointment, CalendarSlot};
use crate::session::Session;

/// Open reschedule picker for one appointment
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RescheduleDraft {
    pub appointment_id: i64,
    pub options: BTreeMap<NaiveDate, Vec<CalendarSlot>>,
    pub selected: Option<NaiveDateTime>,
}

impl RescheduleDraft {
    pub fn contains(&self, start: NaiveDateTime) -> bool {
        self.options
            .get(&start.date())
            .is_some_and(|slots| slots.iter().any(|s| s.start_time == start))
    }
}

pub struct MyAppointmentsView {
    client: ClinicClient,
    session: Session,
    days: i64,
    pub appointments: Vec<BookedAppointment>,
    pub saving_notes: HashSet<i64>,
    pub rescheduling: HashSet<i64>,
    pub cancelling: HashSet<i64>,
    pub reschedule: Option<RescheduleDraft>,
    pub error: Option<String>,
    pub success: Option<String>,
    pub loading: bool,
}

impl MyAppointmentsView {
    pub fn new(client: ClinicClient, session: Session, days: i64) -> Self {
        Self {
            client,
            session,
            days,
            appointments: vec![],
            saving_notes: HashSet::new(),
            rescheduling: HashSet::new(),
            cancelling: HashSet::new(),
            reschedule: None,
            error: None,
            success: None,
            loading: false,
        }
    }

    fn clear_messages(&mut self) {
        self.error = None;
        self.success = None;
    }

    fn sort(&mut self) {
        self.appointments.sort_by_key(|a| (a.start_time, a.id));
    }

    fn replace(&mut self, updated: BookedAppointment) {
        if let Some(existing) = self.appointments.iter_mut().find(|a| a.id == updated.id) {
            *existing = updated;
        }
    }

    pub async fn load(&mut self) {
        self.loading = true;
        let result = self.client.my_appointments(&self.session.email).await;
        self.loading = false;
        match result {
            Ok(appointments) => {
                self.appointments = appointments;
                self.sort();
            }
            Err(e) => self.error = Some(e.user_message("load your appointments")),
        }
    }

    pub async fn update_notes(&mut self, id: i64, notes: Option<String>) {
        self.clear_messages();
        self.saving_notes.insert(id);
        let result = self
            .client
            .update_notes(id, &self.session.email, notes)
            .await;
        self.saving_notes.remove(&id);

        match result {
            Ok(updated) => {
                self.replace(updated);
                self.success = Some("Notes saved.".to_string());
            }
            Err(e) => self.error = Some(e.user_message("save notes")),
        }
    }

    /// Fetch a fresh calendar for the appointment's type, counting the
    /// appointment's own time as free, and offer every available start
    /// except the one it already has.
    pub async fn open_reschedule(&mut self, id: i64) {
        self.clear_messages();
        let Some(appt) = self.appointments.iter().find(|a| a.id == id).cloned() else {
            self.error = Some("Appointment not found.".to_string());
            return;
        };

        self.rescheduling.insert(id);
        let result = self
            .client
            .calendar(self.days, &appt.appointment_type, Some(id))
            .await;
        self.rescheduling.remove(&id);

        match result {
            Ok(slots) => {
                let mut options: BTreeMap<NaiveDate, Vec<CalendarSlot>> = BTreeMap::new();
                for slot in slots.into_iter().filter(|s| {
                    s.is_available
                        && s.appointment_type == appt.appointment_type
                        && s.start_time != appt.start_time
                }) {
                    options.entry(slot.date).or_default().push(slot);
                }
                for day in options.values_mut() {
                    day.sort_by_key(|s| s.start_time);
                }
                self.reschedule = Some(RescheduleDraft {
                    appointment_id: id,
                    options,
                    selected: None,
                });
            }
            Err(e) => self.error = Some(e.user_message("load available times")),
        }
    }

    pub fn choose_reschedule_slot(&mut self, start: NaiveDateTime) -> bool {
        match self.reschedule.as_mut() {
            Some(draft) if draft.contains(start) => {
                draft.selected = Some(start);
                self.error = None;
                true
            }
            Some(_) => {
                self.error = Some("That time is no longer available.".to_string());
                false
            }
            None => {
                self.error = Some("Please choose a new time.".to_string());
                false
            }
        }
    }

    pub async fn confirm_reschedule(&mut self) {
        self.clear_messages();
        let Some((id, start)) = self
            .reschedule
            .as_ref()
            .and_then(|draft| draft.selected.map(|start| (draft.appointment_id, start)))
        else {
            self.error = Some("Please choose a new time.".to_string());
            return;
        };

        self.rescheduling.insert(id);
        let result = self
            .client
            .reschedule(id, &self.session.email, start)
            .await;
        self.rescheduling.remove(&id);

        match result {
            Ok(updated) => {
                self.replace(updated);
                self.sort();
                self.reschedule = None;
                self.success = Some("Appointment rescheduled.".to_string());
            }
            Err(e) => self.error = Some(e.user_message("reschedule appointment")),
        }
    }

    pub fn cancel_reschedule(&mut self) {
        self.reschedule = None;
    }

    pub async fn cancel(&mut self, id: i64) {
        self.clear_messages();
        self.cancelling.insert(id);
        let result = self.client.cancel(id, &self.session.email).await;
        self.cancelling.remove(&id);

        match result {
            Ok(()) => {
                self.appointments.retain(|a| a.id != id);
                if self.reschedule.as_ref().is_some_and(|d| d.appointment_id == id) {
                    self.reschedule = None;
                }
                self.success = Some("Appointment cancelled.".to_string());
            }
            Err(e) => self.error = Some(e.user_message("cancel appointment")),
        }
    }
}
