use chrono::{DateTime, NaiveDate};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};

use crate::{
    structs::remote_struct::Availability,
    utils::time_utils::serialize_rfc3339,
};

#[derive(Deserialize)]
pub struct SlotQuery {
    pub date: NaiveDate, // Format should be "YYYY-MM-DD"
    pub service_id: i64,
    pub duration_minutes: u32,
}

#[derive(Deserialize, Default)]
pub struct DateQuery {
    pub date: Option<NaiveDate>,
}

#[derive(Deserialize, Default)]
pub struct AdminAvailabilityQuery {
    pub service: Option<i64>,
    pub date: Option<NaiveDate>,
}

/// An availability window pinned to the practice timezone. `start < end` always holds.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Window {
    pub id: i64,
    #[serde(serialize_with = "serialize_rfc3339")]
    pub start: DateTime<Tz>,
    #[serde(serialize_with = "serialize_rfc3339")]
    pub end: DateTime<Tz>,
    pub is_booked: bool,
}

impl Window {
    /// `None` when a bound falls in a DST gap or the window is empty or inverted.
    pub fn from_availability(availability: &Availability, tz: &Tz) -> Option<Self> {
        let start = availability.start_datetime.in_zone(tz)?;
        let end = availability.end_datetime.in_zone(tz)?;

        if start >= end {
            return None;
        }

        Some(Self {
            id: availability.id,
            start,
            end,
            is_booked: availability.is_booked,
        })
    }
}

/// A bookable start time inside a window. Derived, never stored.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CandidateSlot {
    pub availability_id: i64,
    #[serde(serialize_with = "serialize_rfc3339")]
    pub start: DateTime<Tz>,
}

#[derive(Serialize)]
pub struct SlotsResponse {
    pub date: NaiveDate,
    pub service_id: i64,
    pub duration_minutes: u32,
    pub slots: Vec<CandidateSlot>,

    // True when nothing can be offered and the visitor should be pointed at the contact form.
    pub contact_fallback: bool,
}

#[derive(Serialize)]
pub struct AvailableDatesResponse {
    pub dates: Vec<NaiveDate>,

    // True when the dates are the generic next-days list because the backend could not be read.
    pub fallback: bool,
}

#[derive(Serialize, Deserialize, Debug, PartialEq, Eq)]
pub struct AdminBadges {
    pub pending_bookings: usize,
    pub unread_messages: usize,
}

/// Body of `POST /bookings`.
#[derive(Deserialize)]
pub struct BookingRequest {
    pub service_id: i64,
    pub availability_id: i64,
    pub duration_minutes: u32,
    pub start_datetime: String,
    pub client_name: String,
    pub client_email: String,
    #[serde(default)]
    pub client_phone: Option<String>,
}
