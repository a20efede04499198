use anyhow::{Result, anyhow};
use chrono::NaiveDateTime;

use crate::client::ClinicClient;
use crate::core::AppConfig;
use crate::scheduling::week::format_time_label;
use crate::session::SessionStore;
use crate::views::MyAppointmentsView;

async fn loaded_view(config: &AppConfig) -> Result<MyAppointmentsView> {
    let session = SessionStore::new(config.session_path()).load();
    let mut view = MyAppointmentsView::new(
        ClinicClient::new(&config.api_base_url),
        session,
        config.calendar_days,
    );
    view.load().await;
    match view.error.take() {
        Some(error) => Err(anyhow!(error)),
        None => Ok(view),
    }
}

fn finish(view: &mut MyAppointmentsView) -> Result<()> {
    if let Some(error) = view.error.take() {
        return Err(anyhow!(error));
    }
    if let Some(success) = view.success.take() {
        println!("{}", success);
    }
    Ok(())
}

pub async fn mine(config: &AppConfig) -> Result<()> {
    let view = loaded_view(config).await?;
    if view.appointments.is_empty() {
        println!("No upcoming appointments");
    }
    for appt in &view.appointments {
        println!(
            "#{}  {} {}  {} ({} min){}",
            appt.id,
            appt.start_time.format("%a %m/%d"),
            format_time_label(appt.start_time.time()),
            appt.appointment_type,
            appt.duration_minutes,
            appt.notes
                .as_deref()
                .map(|n| format!("  notes: {}", n))
                .unwrap_or_default()
        );
    }
    Ok(())
}

pub async fn notes(config: &AppConfig, id: i64, notes: Option<String>) -> Result<()> {
    let mut view = loaded_view(config).await?;
    view.update_notes(id, notes).await;
    finish(&mut view)
}

/// Without `start` the open times are listed, with it the move is made.
pub async fn reschedule(config: &AppConfig, id: i64, start: Option<NaiveDateTime>) -> Result<()> {
    let mut view = loaded_view(config).await?;
    view.open_reschedule(id).await;
    if let Some(error) = view.error.take() {
        return Err(anyhow!(error));
    }

    let Some(start) = start else {
        if let Some(draft) = &view.reschedule {
            for (day, slots) in &draft.options {
                let times = slots
                    .iter()
                    .map(|s| format_time_label(s.time))
                    .collect::<Vec<_>>();
                println!("{}  {}", day.format("%a %m/%d"), times.join(", "));
            }
        }
        println!("Pick one with --start");
        return Ok(());
    };

    view.choose_reschedule_slot(start);
    view.confirm_reschedule().await;
    finish(&mut view)
}

pub async fn cancel(config: &AppConfig, id: i64) -> Result<()> {
    let mut view = loaded_view(config).await?;
    view.cancel(id).await;
    finish(&mut view)
}
