use anyhow::{Result, anyhow};
use chrono::{Local, NaiveDateTime};

use crate::client::ClinicClient;
use crate::core::AppConfig;
use crate::scheduling::week::{TimeOfDay, WeekIndex, format_time_label};
use crate::session::SessionStore;
use crate::views::AvailabilityView;

fn view(config: &AppConfig) -> AvailabilityView {
    let session = SessionStore::new(config.session_path()).load();
    AvailabilityView::new(
        ClinicClient::new(&config.api_base_url),
        session,
        config.calendar_days,
    )
}

pub async fn calendar(
    config: &AppConfig,
    appointment_type: &str,
    filter: TimeOfDay,
    week: WeekIndex,
) -> Result<()> {
    let mut view = view(config);
    view.load_types().await;
    view.set_time_filter(filter);
    view.set_week(week);
    view.set_appointment_type(appointment_type).await;
    if let Some(error) = view.error.take() {
        return Err(anyhow!(error));
    }

    let label = view
        .appointment_types
        .iter()
        .find(|t| t.name == view.appointment_type)
        .map(|t| format!("{} ({} min)", t.label, t.duration_minutes))
        .unwrap_or_else(|| view.appointment_type.clone());
    println!("{}", label);

    for (day, slots) in view.week_days(Local::now().date_naive()) {
        let times = slots
            .iter()
            .map(|s| format_time_label(s.time))
            .collect::<Vec<_>>();
        if times.is_empty() {
            println!("{}  no available times", day.format("%a %m/%d"));
        } else {
            println!("{}  {}", day.format("%a %m/%d"), times.join(", "));
        }
    }
    Ok(())
}

pub async fn book(
    config: &AppConfig,
    appointment_type: &str,
    start: NaiveDateTime,
    notes: Option<String>,
) -> Result<()> {
    let mut view = view(config);
    view.set_appointment_type(appointment_type).await;
    if let Some(error) = view.error.take() {
        return Err(anyhow!(error));
    }
    if !view.select(start) {
        return Err(anyhow!(view.error.take().unwrap_or_default()));
    }
    view.confirm_booking(notes).await;

    if let Some(error) = view.error.take() {
        return Err(anyhow!(error));
    }
    if let Some(appt) = view.confirmation {
        println!(
            "Booked {} on {} at {} (appointment {})",
            appt.appointment_type,
            appt.start_time.format("%a %m/%d"),
            format_time_label(appt.start_time.time()),
            appt.id
        );
    }
    Ok(())
}
