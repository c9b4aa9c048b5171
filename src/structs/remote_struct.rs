use std::collections::BTreeMap;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::utils::time_utils::RawTimestamp;

/* -------------------------------------------------------------------------- */
/*                                      -                                     */
/* -------------------------------------------------------------------------- */
/* -------------------------------------------------------------------------- */
/*                                  SERVICES                                  */
/* -------------------------------------------------------------------------- */
/* -------------------------------------------------------------------------- */
/*                                      -                                     */
/* -------------------------------------------------------------------------- */

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Service {
    pub id: i64,
    pub title: String,
    #[serde(default)]
    pub description: String,

    // Keys are durations in minutes, as strings ("60", "90").
    #[serde(default)]
    pub durations_prices: BTreeMap<String, Decimal>,

    #[serde(default)]
    pub image: Option<String>,

    #[serde(default = "default_active")]
    pub is_active: bool,
}

fn default_active() -> bool {
    true
}

impl Service {
    /// Offered durations in minutes, ascending. Keys that are not whole minutes are ignored.
    pub fn offered_durations(&self) -> Vec<u32> {
        let mut durations: Vec<u32> = self
            .durations_prices
            .keys()
            .filter_map(|key| key.trim().parse().ok())
            .collect();
        durations.sort_unstable();
        durations.dedup();
        durations
    }

    pub fn offers(&self, duration_minutes: u32) -> bool {
        self.offered_durations().contains(&duration_minutes)
    }

    pub fn price_for(&self, duration_minutes: u32) -> Option<Decimal> {
        self.durations_prices
            .iter()
            .find(|(key, _)| key.trim().parse::<u32>().ok() == Some(duration_minutes))
            .map(|(_, price)| *price)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct CreateService {
    #[validate(length(min = 1, message = "Service title cannot be empty."))]
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[validate(length(min = 1, message = "At least one duration must be priced."))]
    pub durations_prices: BTreeMap<String, Decimal>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_active: Option<bool>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateService {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub durations_prices: Option<BTreeMap<String, Decimal>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_active: Option<bool>,
}

/* -------------------------------------------------------------------------- */
/*                                      -                                     */
/* -------------------------------------------------------------------------- */
/* -------------------------------------------------------------------------- */
/*                               AVAILABILITIES                               */
/* -------------------------------------------------------------------------- */
/* -------------------------------------------------------------------------- */
/*                                      -                                     */
/* -------------------------------------------------------------------------- */

/// An availability window as the backend stores it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Availability {
    pub id: i64,
    pub start_datetime: RawTimestamp,
    pub end_datetime: RawTimestamp,
    #[serde(default)]
    pub is_booked: bool,
    #[serde(default)]
    pub created_at: Option<RawTimestamp>,
    #[serde(default)]
    pub updated_at: Option<RawTimestamp>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateAvailability {
    pub start_datetime: RawTimestamp,
    pub end_datetime: RawTimestamp,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateAvailability {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start_datetime: Option<RawTimestamp>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end_datetime: Option<RawTimestamp>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_booked: Option<bool>,
}

/// Query understood by `GET /availabilities/`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AvailabilityFilter {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub service: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date: Option<chrono::NaiveDate>,
}

/* -------------------------------------------------------------------------- */
/*                                      -                                     */
/* -------------------------------------------------------------------------- */
/* -------------------------------------------------------------------------- */
/*                                  BOOKINGS                                  */
/* -------------------------------------------------------------------------- */
/* -------------------------------------------------------------------------- */
/*                                      -                                     */
/* -------------------------------------------------------------------------- */

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BookingStatus {
    Pending,
    Confirmed,
    Canceled,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Booking {
    pub id: i64,
    pub service: Service,
    pub availability: Availability,
    pub client_name: String,
    pub client_email: String,
    #[serde(default)]
    pub client_phone: Option<String>,
    #[serde(default)]
    pub client_comment: Option<String>,
    #[serde(default)]
    pub duration_minutes: Option<u32>,
    pub status: BookingStatus,
    #[serde(default)]
    pub created_at: Option<RawTimestamp>,
    #[serde(default)]
    pub updated_at: Option<RawTimestamp>,
}

/// Body of `POST /bookings/`. `start_datetime` is local-naive ISO.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewBooking {
    pub client_name: String,
    pub client_email: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub client_phone: Option<String>,
    pub service_id: i64,
    pub availability_id: i64,
    pub duration_minutes: u32,
    pub start_datetime: String,
}

/* -------------------------------------------------------------------------- */
/*                                      -                                     */
/* -------------------------------------------------------------------------- */
/* -------------------------------------------------------------------------- */
/*                                  CONTACT                                   */
/* -------------------------------------------------------------------------- */
/* -------------------------------------------------------------------------- */
/*                                      -                                     */
/* -------------------------------------------------------------------------- */

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct ContactForm {
    #[validate(length(min = 1, max = 120, message = "Name is required."))]
    pub name: String,
    #[validate(email(message = "A valid email is required."))]
    pub email: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[validate(length(max = 32, message = "Phone number is too long."))]
    pub phone: Option<String>,
    #[validate(length(min = 1, max = 5000, message = "Message cannot be empty."))]
    pub message: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContactMessage {
    pub id: i64,
    pub name: String,
    pub email: String,
    #[serde(default)]
    pub phone: Option<String>,
    pub message: String,
    #[serde(default)]
    pub is_read: bool,
    #[serde(default)]
    pub created_at: Option<RawTimestamp>,
}

/// The `{"message": "..."}` acknowledgement most write endpoints answer with.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MessageAck {
    #[serde(default)]
    pub message: String,
}
