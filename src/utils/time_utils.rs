use std::fmt;

use chrono::{DateTime, Duration, FixedOffset, NaiveDate, NaiveDateTime, TimeZone};
use serde::{Deserialize, Deserializer, Serializer, de};

const LOCAL_ISO_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";

/// A timestamp exactly as the backend sent it.
///
/// The backend mixes local-naive strings (`2025-03-01T09:00:00`) with
/// offset-qualified ones (`2025-03-01T09:00:00+01:00`). Nothing downstream of the
/// boundary should touch this type; call [`RawTimestamp::in_zone`] first.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RawTimestamp {
    Naive(NaiveDateTime),
    Offset(DateTime<FixedOffset>),
}

impl RawTimestamp {
    pub fn parse(value: &str) -> Option<Self> {
        let value = value.trim();

        if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
            return Some(Self::Offset(dt));
        }

        NaiveDateTime::parse_from_str(value, "%Y-%m-%dT%H:%M:%S%.f")
            .or_else(|_| NaiveDateTime::parse_from_str(value, "%Y-%m-%dT%H:%M"))
            .ok()
            .map(Self::Naive)
    }

    /// Pins the timestamp to `tz`. Naive values are read as wall-clock time in
    /// `tz`; on a DST fold the earlier instant wins, inside a gap there is none.
    pub fn in_zone<Tz: TimeZone>(&self, tz: &Tz) -> Option<DateTime<Tz>> {
        match self {
            Self::Naive(naive) => tz.from_local_datetime(naive).earliest(),
            Self::Offset(dt) => Some(dt.with_timezone(tz)),
        }
    }
}

impl fmt::Display for RawTimestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Naive(naive) => write!(f, "{}", naive.format(LOCAL_ISO_FORMAT)),
            Self::Offset(dt) => write!(f, "{}", dt.to_rfc3339()),
        }
    }
}

impl<'de> Deserialize<'de> for RawTimestamp {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = String::deserialize(deserializer)?;
        RawTimestamp::parse(&value)
            .ok_or_else(|| de::Error::custom(format!("invalid timestamp: {value}")))
    }
}

impl serde::Serialize for RawTimestamp {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// Calendar day of `dt` in its own zone.
pub fn local_day<Tz: TimeZone>(dt: &DateTime<Tz>) -> NaiveDate {
    dt.date_naive()
}

/// `YYYY-MM-DDTHH:MM:SS` in the instant's own zone, the shape the backend expects.
pub fn format_local_iso<Tz: TimeZone>(dt: &DateTime<Tz>) -> String {
    dt.naive_local().format(LOCAL_ISO_FORMAT).to_string()
}

/// Whole minutes from `start` to `end`, negative when `end` comes first.
pub fn minutes_between<Tz: TimeZone>(start: &DateTime<Tz>, end: &DateTime<Tz>) -> i64 {
    end.clone().signed_duration_since(start.clone()).num_minutes()
}

pub fn minutes(value: u32) -> Duration {
    Duration::minutes(i64::from(value))
}

/// Serde helper: writes an instant as RFC 3339 with its UTC offset.
pub fn serialize_rfc3339<S, Tz>(dt: &DateTime<Tz>, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
    Tz: TimeZone,
{
    serializer.serialize_str(&dt.fixed_offset().to_rfc3339())
}
