//! Merges generated slots, admin blocks and bookings into per-slot status
use std::collections::BTreeSet;

use chrono::{Datelike, Duration, NaiveDateTime, Timelike, Weekday};

use super::models::{AppointmentType, AvailabilitySlot, CalendarSlot, SlotStatus};
use super::rules::{
    DEFAULT_SLOT_DURATION_MINUTES, GENERAL_APPOINTMENT_TYPE, LUNCH_HOUR, Span, close_time,
    last_start_time, lunch_span, open_time,
};
use super::slot_key::{SLOT_MINUTES, iterate_slot_starts};

fn is_weekend(weekday: Weekday) -> bool {
    matches!(weekday, Weekday::Sat | Weekday::Sun)
}

/// Status of one candidate span. Lunch and blocks win over bookings.
pub fn slot_status(span: &Span, blocks: &[Span], bookings: &[Span]) -> SlotStatus {
    if span.overlaps(&lunch_span(span.start.date())) || blocks.iter().any(|b| span.overlaps(b)) {
        SlotStatus::Blocked
    } else if bookings.iter().any(|b| span.overlaps(b)) {
        SlotStatus::Booked
    } else {
        SlotStatus::Available
    }
}

/// Calendar of `appointment_type` for the weekdays in
/// `[today, today + days)`. Starts at or before `now` are skipped and a
/// start is only offered if the whole appointment ends by closing time.
pub fn build_calendar(
    now: NaiveDateTime,
    days: i64,
    appointment_type: &AppointmentType,
    blocks: &[Span],
    bookings: &[Span],
) -> Vec<CalendarSlot> {
    let duration = Duration::minutes(appointment_type.duration_minutes);
    let today = now.date();
    let mut slots = vec![];

    for offset in 0..days {
        let day = today + Duration::days(offset);
        if is_weekend(day.weekday()) {
            continue;
        }
        let closing = day.and_time(close_time());
        let mut start = day.and_time(open_time());
        while start + duration <= closing {
            if start > now {
                let span = Span::new(start, start + duration);
                let status = slot_status(&span, blocks, bookings);
                slots.push(CalendarSlot::new(
                    start,
                    appointment_type.duration_minutes,
                    &appointment_type.name,
                    status,
                ));
            }
            start += Duration::minutes(SLOT_MINUTES);
        }
    }

    slots
}

/// Raw 15 minute `general` slots for the next `range_days`.
///
/// Slots are generated rather than stored so they carry negative ids.
/// Blocked starts and the lunch hour are removed; a slot is flagged
/// booked when any booking covers its start.
pub fn generate_slots(
    now: NaiveDateTime,
    range_days: i64,
    block_starts: &BTreeSet<NaiveDateTime>,
    bookings: &[Span],
    students_only: bool,
) -> Vec<AvailabilitySlot> {
    let range_end = now + Duration::days(range_days);
    let booked_starts: BTreeSet<NaiveDateTime> = bookings
        .iter()
        .flat_map(|b| iterate_slot_starts(b.start, b.end))
        .collect();

    let mut slots = vec![];
    let mut generated_id = -1;
    let mut day = now.date();
    while day <= range_end.date() {
        if !is_weekend(day.weekday()) {
            let last_start = day.and_time(last_start_time());
            let mut start = day.and_time(open_time());
            while start <= last_start {
                let is_lunch = start.hour() == LUNCH_HOUR;
                if start > now && !is_lunch && !block_starts.contains(&start) {
                    let is_booked = booked_starts.contains(&start);
                    if !(students_only && is_booked) {
                        slots.push(AvailabilitySlot {
                            id: generated_id,
                            date: start.date(),
                            time: start.time(),
                            duration_minutes: DEFAULT_SLOT_DURATION_MINUTES,
                            appointment_type: GENERAL_APPOINTMENT_TYPE.to_string(),
                            start_time: start,
                            end_time: start + Duration::minutes(DEFAULT_SLOT_DURATION_MINUTES),
                            is_booked,
                        });
                    }
                    generated_id -= 1;
                }
                start += Duration::minutes(SLOT_MINUTES);
            }
        }
        day += Duration::days(1);
    }

    slots
}
