use chrono::{DateTime, NaiveDate, NaiveDateTime, SecondsFormat, TimeZone, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;
use std::fmt;

use crate::user::NOT_AVAILABLE;

/// Naive layouts accepted after RFC 3339 fails; read as UTC.
const NAIVE_FORMATS: [&str; 2] = ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"];

/// Registration times outside `[1970-01-01, 2100-01-01)` are read as unknown.
const EARLIEST_MILLIS: i64 = 0;
const LATEST_MILLIS: i64 = 4_102_444_800_000;

/// Creation time of a user record.
///
/// The mobile app writes `createdAt` without any schema, so a missing or
/// unreadable value is an ordinary state and not an error. `Unknown` orders
/// before every known instant, which puts such records last in a
/// newest-first listing.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Timestamp {
    #[default]
    Unknown,
    Known(DateTime<Utc>),
}

impl Timestamp {
    /// `Known(instant)` when the instant is a plausible registration time.
    pub fn plausible(instant: DateTime<Utc>) -> Self {
        let millis = instant.timestamp_millis();
        if (EARLIEST_MILLIS..LATEST_MILLIS).contains(&millis) {
            Timestamp::Known(instant)
        } else {
            Timestamp::Unknown
        }
    }

    /// Parse a raw `createdAt` string.
    ///
    /// Accepts RFC 3339, naive `YYYY-MM-DDTHH:MM:SS[.fff]` or
    /// `YYYY-MM-DD HH:MM:SS[.fff]` (read as UTC), and a bare `YYYY-MM-DD`
    /// (UTC midnight). Anything else, including instants before 1970 or from
    /// 2100 on, yields `Unknown`.
    ///
    /// # Examples
    /// ```
    /// use tulong_admin::timestamp::Timestamp;
    ///
    /// assert!(Timestamp::parse("2026-10-18T08:30:00Z").is_known());
    /// assert!(Timestamp::parse("2026-10-18").is_known());
    /// assert!(!Timestamp::parse("yesterday").is_known());
    /// ```
    pub fn parse(raw: &str) -> Self {
        let raw = raw.trim();
        if raw.is_empty() {
            return Timestamp::Unknown;
        }

        if let Ok(parsed) = DateTime::parse_from_rfc3339(raw) {
            return Timestamp::plausible(parsed.with_timezone(&Utc));
        }

        for format in NAIVE_FORMATS {
            if let Ok(naive) = NaiveDateTime::parse_from_str(raw, format) {
                return Timestamp::plausible(naive.and_utc());
            }
        }

        NaiveDate::parse_from_str(raw, "%Y-%m-%d")
            .ok()
            .and_then(|date| date.and_hms_opt(0, 0, 0))
            .map(|naive| Timestamp::plausible(naive.and_utc()))
            .unwrap_or(Timestamp::Unknown)
    }

    /// Interpret a number as milliseconds since the Unix epoch.
    pub fn from_millis(millis: i64) -> Self {
        DateTime::from_timestamp_millis(millis)
            .map_or(Timestamp::Unknown, Timestamp::plausible)
    }

    /// Interpret an arbitrary JSON value found under `createdAt`.
    pub fn from_json(value: &Value) -> Self {
        match value {
            Value::String(raw) => Timestamp::parse(raw),
            Value::Number(number) => number
                .as_i64()
                .or_else(|| number.as_f64().map(|f| f as i64))
                .map(Timestamp::from_millis)
                .unwrap_or(Timestamp::Unknown),
            _ => Timestamp::Unknown,
        }
    }

    pub fn instant(&self) -> Option<DateTime<Utc>> {
        match self {
            Timestamp::Known(instant) => Some(*instant),
            Timestamp::Unknown => None,
        }
    }

    pub fn is_known(&self) -> bool {
        matches!(self, Timestamp::Known(_))
    }

    pub fn is_unknown(&self) -> bool {
        !self.is_known()
    }

    /// True when the instant lies in `[start, end]`. Unknown never matches.
    pub fn within(&self, start: &DateTime<Utc>, end: &DateTime<Utc>) -> bool {
        match self {
            Timestamp::Known(instant) => instant >= start && instant <= end,
            Timestamp::Unknown => false,
        }
    }

    /// Render with a `chrono` format string in the given zone, or `"N/A"`.
    pub fn format_in<Tz>(&self, tz: &Tz, format: &str) -> String
    where
        Tz: TimeZone,
        Tz::Offset: fmt::Display,
    {
        match self {
            Timestamp::Known(instant) => {
                instant.with_timezone(tz).format(format).to_string()
            }
            Timestamp::Unknown => NOT_AVAILABLE.to_string(),
        }
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Timestamp::Known(instant) => {
                write!(f, "{}", instant.to_rfc3339_opts(SecondsFormat::Millis, true))
            }
            Timestamp::Unknown => f.write_str(NOT_AVAILABLE),
        }
    }
}

impl Serialize for Timestamp {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Timestamp::Known(instant) => serializer
                .serialize_str(&instant.to_rfc3339_opts(SecondsFormat::Millis, true)),
            Timestamp::Unknown => serializer.serialize_none(),
        }
    }
}

impl<'de> Deserialize<'de> for Timestamp {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = Option::<Value>::deserialize(deserializer)?;
        Ok(value
            .as_ref()
            .map(Timestamp::from_json)
            .unwrap_or(Timestamp::Unknown))
    }
}
