//! Admin block-time grid: time rows by weekday columns
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use chrono::{Datelike, Duration, NaiveDate, NaiveDateTime, NaiveTime, Timelike};
use serde::Serialize;

use super::rules::LUNCH_HOUR;
use super::slot_key::instant_key;
use super::week::{format_time_label, time_buckets, week_start};

/// Block id reported for lunch cells. There is no stored record behind it.
pub const LUNCH_BLOCK_ID: i64 = -1;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GridCell {
    pub date: NaiveDate,
    pub time: NaiveTime,
    pub key: String,
    pub label: String,
    pub is_lunch: bool,
    pub is_past: bool,
    pub is_booked: bool,
    pub block_id: Option<i64>,
}

impl GridCell {
    pub fn start(&self) -> NaiveDateTime {
        self.date.and_time(self.time)
    }

    pub fn is_blocked(&self) -> bool {
        self.block_id.is_some()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GridRow {
    pub time: NaiveTime,
    pub label: String,
    pub cells: Vec<GridCell>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CalendarGrid {
    pub week_start: NaiveDate,
    pub days: Vec<NaiveDate>,
    pub rows: Vec<GridRow>,
}

impl CalendarGrid {
    pub fn cell(&self, start: NaiveDateTime) -> Option<&GridCell> {
        self.rows
            .iter()
            .flat_map(|row| row.cells.iter())
            .find(|cell| cell.start() == start)
    }
}

/// Build the grid for the week containing `week_anchor`.
///
/// `blocks` maps slot keys to block ids and `occupied` holds every key
/// covered by a booking. Days before `now` are left out entirely and
/// rows with nothing left but past cells are dropped.
pub fn build_grid(
    week_anchor: NaiveDate,
    now: NaiveDateTime,
    blocks: &BTreeMap<String, i64>,
    occupied: &BTreeSet<String>,
) -> CalendarGrid {
    let monday = week_start(week_anchor);
    let days: Vec<NaiveDate> = (0..5)
        .map(|i| monday + Duration::days(i))
        .filter(|day| *day >= now.date())
        .collect();

    let rows = time_buckets()
        .into_iter()
        .map(|time| {
            let cells = days
                .iter()
                .map(|date| {
                    let start = date.and_time(time);
                    let key = instant_key(start);
                    let is_lunch = time.hour() == LUNCH_HOUR;
                    let block_id = if is_lunch {
                        Some(LUNCH_BLOCK_ID)
                    } else {
                        blocks.get(&key).copied()
                    };
                    GridCell {
                        date: *date,
                        time,
                        is_lunch,
                        is_past: start < now,
                        is_booked: occupied.contains(&key),
                        block_id,
                        label: format_time_label(time),
                        key,
                    }
                })
                .collect::<Vec<_>>();
            GridRow {
                time,
                label: format_time_label(time),
                cells,
            }
        })
        .filter(|row| row.cells.iter().any(|cell| !cell.is_past))
        .collect();

    CalendarGrid {
        week_start: monday,
        days,
        rows,
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ToggleAction {
    Block { date: NaiveDate, time: NaiveTime },
    Unblock { id: i64 },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToggleRejection {
    Past,
    Booked,
    Lunch,
}

impl fmt::Display for ToggleRejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let msg = match self {
            ToggleRejection::Past => "Past times cannot be changed.",
            ToggleRejection::Booked => "This time is already booked and cannot be blocked.",
            ToggleRejection::Lunch => {
                "12:00 PM to 1:00 PM is reserved for lunch and is always blocked."
            }
        };
        write!(f, "{}", msg)
    }
}

impl std::error::Error for ToggleRejection {}

/// Decide what toggling `cell` should do without touching the network.
pub fn plan_toggle(cell: &GridCell) -> Result<ToggleAction, ToggleRejection> {
    if cell.is_past {
        return Err(ToggleRejection::Past);
    }
    if cell.is_booked {
        return Err(ToggleRejection::Booked);
    }
    if cell.is_lunch {
        return Err(ToggleRejection::Lunch);
    }
    match cell.block_id {
        Some(id) => Ok(ToggleAction::Unblock { id }),
        None => Ok(ToggleAction::Block {
            date: cell.date,
            time: cell.time,
        }),
    }
}

/// Weekday columns only ever hold Monday through Friday.
pub fn is_weekday(date: NaiveDate) -> bool {
    date.weekday().num_days_from_monday() < 5
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scheduling::slot_key::occupied_keys;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn at(d: NaiveDate, h: u32, m: u32) -> NaiveDateTime {
        d.and_hms_opt(h, m, 0).unwrap()
    }

    #[test]
    fn it_builds_a_full_week_before_it_starts() {
        let monday = date(2024, 1, 8);
        let now = at(date(2024, 1, 5), 8, 0);
        let grid = build_grid(monday, now, &BTreeMap::new(), &BTreeSet::new());
        assert_eq!(grid.week_start, monday);
        assert_eq!(grid.days.len(), 5);
        assert_eq!(grid.rows.len(), 28);
        assert_eq!(grid.rows[0].label, "9:00 AM");
        assert!(grid.days.iter().all(|d| is_weekday(*d)));
    }

    #[test]
    fn it_drops_past_days_and_all_past_rows() {
        let wednesday = date(2024, 1, 10);
        let now = at(wednesday, 10, 5);
        let grid = build_grid(wednesday, now, &BTreeMap::new(), &BTreeSet::new());

        assert_eq!(grid.days, vec![wednesday, date(2024, 1, 11), date(2024, 1, 12)]);
        // Every row still has future cells on Thursday and Friday
        assert_eq!(grid.rows.len(), 28);
        let nine = grid.cell(at(wednesday, 9, 0)).unwrap();
        assert!(nine.is_past);
        assert!(!grid.cell(at(wednesday, 10, 15)).unwrap().is_past);
    }

    #[test]
    fn it_keeps_a_row_with_any_future_cell() {
        let friday = date(2024, 1, 12);
        let now = at(friday, 10, 5);
        let grid = build_grid(friday, now, &BTreeMap::new(), &BTreeSet::new());

        assert_eq!(grid.days, vec![friday]);
        assert_eq!(grid.rows.first().unwrap().label, "10:15 AM");
        assert!(grid.rows.iter().all(|row| row.cells.iter().any(|c| !c.is_past)));
    }

    #[test]
    fn it_forces_lunch_cells_to_the_sentinel_block() {
        let monday = date(2024, 1, 8);
        let now = at(date(2024, 1, 1), 8, 0);
        let mut blocks = BTreeMap::new();
        blocks.insert(instant_key(at(monday, 12, 15)), 42);
        blocks.insert(instant_key(at(monday, 9, 30)), 7);
        let grid = build_grid(monday, now, &blocks, &BTreeSet::new());

        let lunch = grid.cell(at(monday, 12, 15)).unwrap();
        assert!(lunch.is_lunch);
        assert_eq!(lunch.block_id, Some(LUNCH_BLOCK_ID));
        assert_eq!(plan_toggle(lunch), Err(ToggleRejection::Lunch));

        let blocked = grid.cell(at(monday, 9, 30)).unwrap();
        assert_eq!(plan_toggle(blocked), Ok(ToggleAction::Unblock { id: 7 }));
    }

    #[test]
    fn it_marks_booked_cells_and_rejects_toggles() {
        let monday = date(2024, 1, 8);
        let now = at(date(2024, 1, 1), 8, 0);
        let occupied = occupied_keys(at(monday, 10, 0), at(monday, 10, 30));
        let grid = build_grid(monday, now, &BTreeMap::new(), &occupied);

        let booked = grid.cell(at(monday, 10, 15)).unwrap();
        assert!(booked.is_booked);
        assert_eq!(plan_toggle(booked), Err(ToggleRejection::Booked));
        assert!(!grid.cell(at(monday, 10, 30)).unwrap().is_booked);
    }

    #[test]
    fn it_checks_past_before_booked_before_lunch() {
        let monday = date(2024, 1, 8);
        let now = at(monday, 14, 0);
        let occupied: BTreeSet<String> = [instant_key(at(monday, 12, 0))].into();
        let grid = build_grid(monday, now, &BTreeMap::new(), &occupied);
        let cell = grid.cell(at(monday, 12, 0)).unwrap();
        assert_eq!(plan_toggle(cell), Err(ToggleRejection::Past));
    }

    #[test]
    fn it_plans_a_block_for_a_free_cell() {
        let monday = date(2024, 1, 8);
        let now = at(date(2024, 1, 1), 8, 0);
        let grid = build_grid(monday, now, &BTreeMap::new(), &BTreeSet::new());
        let cell = grid.cell(at(monday, 15, 45)).unwrap();
        assert_eq!(
            plan_toggle(cell),
            Ok(ToggleAction::Block {
                date: monday,
                time: NaiveTime::from_hms_opt(15, 45, 0).unwrap(),
            })
        );
    }
}
