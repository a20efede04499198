use std::sync::Arc;
use std::time::Duration;

use anyhow::{Result, anyhow};
use chrono::{Local, NaiveDate, NaiveDateTime};
use tokio::sync::Mutex;

use crate::client::ClinicClient;
use crate::core::AppConfig;
use crate::jobs::{RefreshBookings, spawn_periodic_job};
use crate::scheduling::grid::{CalendarGrid, GridCell};
use crate::session::SessionStore;
use crate::views::BlockTimeView;

fn now() -> NaiveDateTime {
    Local::now().naive_local()
}

async fn admin_view(config: &AppConfig, week: Option<NaiveDate>) -> Result<BlockTimeView> {
    let session = SessionStore::new(config.session_path()).load();
    if !session.is_admin() {
        return Err(anyhow!("Only admins can block appointment times."));
    }
    let today = now().date();
    let mut view = BlockTimeView::new(
        ClinicClient::new(&config.api_base_url),
        session,
        week.unwrap_or(today),
    );
    view.load().await;
    Ok(view)
}

fn cell_marker(cell: &GridCell) -> &'static str {
    if cell.is_lunch {
        "lunch"
    } else if cell.is_past {
        "-"
    } else if cell.is_booked {
        "booked"
    } else if cell.is_blocked() {
        "blocked"
    } else {
        "open"
    }
}

pub fn render_grid(grid: &CalendarGrid) -> String {
    let mut out = format!("Week of {}\n", grid.week_start.format("%b %-d, %Y"));
    out.push_str(&format!("{:>9}", ""));
    for day in &grid.days {
        out.push_str(&format!("{:>10}", day.format("%a %m/%d")));
    }
    out.push('\n');

    for row in &grid.rows {
        out.push_str(&format!("{:>9}", row.label));
        for cell in &row.cells {
            out.push_str(&format!("{:>10}", cell_marker(cell)));
        }
        out.push('\n');
    }
    if grid.rows.is_empty() {
        out.push_str("No times left this week\n");
    }
    out
}

fn print_view(view: &mut BlockTimeView) {
    println!("{}", render_grid(&view.grid(now())));
    if let Some(message) = view.message.take() {
        println!("{}", message);
    }
}

pub async fn grid(config: &AppConfig, week: Option<NaiveDate>) -> Result<()> {
    let mut view = admin_view(config, week).await?;
    print_view(&mut view);
    Ok(())
}

pub async fn toggle(config: &AppConfig, start: NaiveDateTime) -> Result<()> {
    let mut view = admin_view(config, Some(start.date())).await?;
    let action = view.toggle(start, now()).await;
    let message = view.message.take().unwrap_or_default();
    match action {
        Some(_) => {
            println!("{}", message);
            Ok(())
        }
        None => Err(anyhow!(message)),
    }
}

/// Redraw the grid every poll interval until ctrl-c
pub async fn watch(config: &AppConfig, week: Option<NaiveDate>) -> Result<()> {
    let view = Arc::new(Mutex::new(admin_view(config, week).await?));
    let handle = spawn_periodic_job(RefreshBookings::new(&view, config.poll_interval_secs));

    let mut redraw = tokio::time::interval(Duration::from_secs(config.poll_interval_secs));
    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                tracing::info!("Stopping watch");
                break;
            }
            _ = redraw.tick() => {
                print_view(&mut *view.lock().await);
            }
        }
    }

    handle.stop();
    Ok(())
}
