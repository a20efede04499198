//! Week math and the fixed time-of-day buckets shown on calendars
use chrono::{Datelike, Duration, NaiveDate, NaiveDateTime, NaiveTime, Timelike};
use serde::{Deserialize, Serialize};

use super::rules::{last_start_time, open_time};
use super::slot_key::SLOT_MINUTES;

/// Monday of the week containing `date`. Sunday belongs to the week
/// that started six days earlier.
pub fn week_start(date: NaiveDate) -> NaiveDate {
    let offset = date.weekday().num_days_from_monday() as i64;
    date - Duration::days(offset)
}

/// Same as [`week_start`] with the time zeroed.
pub fn week_start_at(t: NaiveDateTime) -> NaiveDateTime {
    week_start(t.date()).and_time(NaiveTime::default())
}

/// 09:00 through 15:45 in 15 minute steps.
pub fn time_buckets() -> Vec<NaiveTime> {
    let last = last_start_time();
    let mut buckets = vec![];
    let mut cursor = open_time();
    while cursor <= last {
        buckets.push(cursor);
        cursor += Duration::minutes(SLOT_MINUTES);
    }
    buckets
}

/// `9:00 AM`, `12:15 PM`
pub fn format_time_label(t: NaiveTime) -> String {
    let (is_pm, hour) = t.hour12();
    format!(
        "{}:{:02} {}",
        hour,
        t.minute(),
        if is_pm { "PM" } else { "AM" }
    )
}

/// Students can only look at this week or the next one.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum WeekIndex {
    #[default]
    This,
    Next,
}

impl WeekIndex {
    pub fn offset_days(self) -> i64 {
        match self {
            WeekIndex::This => 0,
            WeekIndex::Next => 7,
        }
    }
}

impl TryFrom<u8> for WeekIndex {
    type Error = anyhow::Error;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(WeekIndex::This),
            1 => Ok(WeekIndex::Next),
            other => Err(anyhow::anyhow!("Week index must be 0 or 1, got {}", other)),
        }
    }
}

/// The seven dates of the selected week, Monday first.
pub fn week_window(today: NaiveDate, index: WeekIndex) -> Vec<NaiveDate> {
    let monday = week_start(today) + Duration::days(index.offset_days());
    (0..7).map(|i| monday + Duration::days(i)).collect()
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum TimeOfDay {
    #[default]
    All,
    Morning,
    Afternoon,
}

impl TimeOfDay {
    pub fn matches(self, t: NaiveTime) -> bool {
        match self {
            TimeOfDay::All => true,
            TimeOfDay::Morning => t.hour() < 12,
            TimeOfDay::Afternoon => t.hour() >= 12,
        }
    }
}
