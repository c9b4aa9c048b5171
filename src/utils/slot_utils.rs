//! Slot planning: which start times can be offered for a day, a duration and a
//! set of availability windows.
//!
//! Everything here is pure. Callers pass `now` in, so the same inputs always give
//! the same ordered output.

use std::collections::BTreeSet;

use chrono::{DateTime, NaiveDate};
use chrono_tz::Tz;
use tracing::warn;

use crate::{
    error::{BookingRejection, RejectionKind},
    structs::{
        remote_struct::Availability,
        util_struct::{CandidateSlot, Window},
    },
    utils::time_utils::{local_day, minutes, minutes_between},
};

/// Distance between two offered start times.
pub const SLOT_STEP_MINUTES: u32 = 60;

/// Idle time that must fit after a massage before the window end.
pub const BUFFER_MINUTES: u32 = 60;

/// Minimum time between sending a request and the massage start.
pub const LEAD_TIME_MINUTES: u32 = 120;

/// Days offered when the list of open dates cannot be fetched.
pub const FALLBACK_DAYS: u32 = 7;

/// Converts backend records into zoned windows, dropping the ones that cannot be
/// pinned to the practice timezone or that are empty.
pub fn windows_from(availabilities: &[Availability], tz: &Tz) -> Vec<Window> {
    availabilities
        .iter()
        .filter_map(|availability| {
            let window = Window::from_availability(availability, tz);
            if window.is_none() {
                warn!(
                    availability_id = availability.id,
                    start = %availability.start_datetime,
                    end = %availability.end_datetime,
                    "Skipping availability that has no valid local span"
                );
            }
            window
        })
        .collect()
}

/// Windows that can host at least one booking of `duration_minutes` on `date`.
pub fn filter_windows<'a>(
    windows: &'a [Window],
    date: NaiveDate,
    duration_minutes: u32,
    now: &DateTime<Tz>,
) -> Vec<&'a Window> {
    windows
        .iter()
        .filter(|window| local_day(&window.start) == date)
        .filter(|window| !window.is_booked)
        .filter(|window| window.end > *now)
        .filter(|window| {
            minutes_between(&window.start, &window.end) >= i64::from(duration_minutes)
        })
        .collect()
}

/// Start times inside one window, stepping by [`SLOT_STEP_MINUTES`], as long as
/// the massage and the trailing buffer still end by the window end.
pub fn expand_window(window: &Window, duration_minutes: u32) -> Vec<CandidateSlot> {
    let occupied = minutes(duration_minutes) + minutes(BUFFER_MINUTES);
    let step = minutes(SLOT_STEP_MINUTES);

    let mut slots = Vec::new();
    let mut cursor = window.start;

    while cursor + occupied <= window.end {
        slots.push(CandidateSlot {
            availability_id: window.id,
            start: cursor,
        });
        cursor += step;
    }

    slots
}

/// Filter then expand. Slots come out in window order, then chronologically.
/// Overlapping windows are not merged, so the same start may appear under two ids.
pub fn plan_slots(
    windows: &[Window],
    date: NaiveDate,
    duration_minutes: u32,
    now: &DateTime<Tz>,
) -> Vec<CandidateSlot> {
    filter_windows(windows, date, duration_minutes, now)
        .into_iter()
        .flat_map(|window| expand_window(window, duration_minutes))
        .collect()
}

/// Sorted, distinct local days that still have an open window.
pub fn available_dates(windows: &[Window], now: &DateTime<Tz>) -> Vec<NaiveDate> {
    windows
        .iter()
        .filter(|window| !window.is_booked && window.end > *now)
        .map(|window| local_day(&window.start))
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

/// `days` consecutive calendar days starting at `today`.
pub fn fallback_dates(today: NaiveDate, days: u32) -> Vec<NaiveDate> {
    today.iter_days().take(days as usize).collect()
}

pub fn find_slot<'a>(
    slots: &'a [CandidateSlot],
    availability_id: i64,
    start: &DateTime<Tz>,
) -> Option<&'a CandidateSlot> {
    slots
        .iter()
        .find(|slot| slot.availability_id == availability_id && slot.start == *start)
}

/// Refuses starts closer than [`LEAD_TIME_MINUTES`] to `now`.
pub fn check_lead_time(start: &DateTime<Tz>, now: &DateTime<Tz>) -> Result<(), BookingRejection> {
    if *start < *now + minutes(LEAD_TIME_MINUTES) {
        return Err(BookingRejection::new(
            RejectionKind::LeadTimeViolation,
            "Booking requested less than 2 hours before the slot start.",
        ));
    }

    Ok(())
}
