//! Date-family scalar adapters.
//!
//! Both adapters accept a native instant, a structured mapping carrying a
//! `date` sub-field, or a date string, and keep a single UTC instant. They
//! differ only in how they render:
//!
//! - [`Date`]: calendar date in UTC (`2024-03-15`).
//! - [`DateTime`]: RFC 3339 timestamp in `Europe/Amsterdam`
//!   (`2024-03-15T09:00:00+01:00`).
//!
//! Unparseable input is a validation error for both; the adapter keeps its
//! previous value.

use chrono::{
    Days, FixedOffset, LocalResult, NaiveDate, NaiveDateTime, Offset, SecondsFormat, TimeZone, Utc,
};
use chrono_tz::Tz;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;

use crate::error::{MarshalError, MarshalResult};
use crate::field::{json_kind, Field};

/// Date-only adapter rendered as `YYYY-MM-DD` in UTC.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq, Hash)]
pub struct Date {
    instant: Option<chrono::DateTime<Utc>>,
}

/// Timestamp adapter rendered as RFC 3339 in `Europe/Amsterdam`.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq, Hash)]
pub struct DateTime {
    instant: Option<chrono::DateTime<Utc>>,
}

macro_rules! impl_date_adapter {
    ($t:ident, |$instant:ident| $render:expr) => {
        impl $t {
            pub fn new() -> Self {
                Self::default()
            }

            /// Construct and populate from raw input.
            pub fn from_raw(raw: &Value) -> MarshalResult<Self> {
                let mut adapter = Self::new();
                adapter.populate(raw)?;
                Ok(adapter)
            }

            /// Populate from raw JSON input.
            ///
            /// Empty input leaves the adapter untouched.
            pub fn populate(&mut self, raw: &Value) -> MarshalResult<&mut Self> {
                match parse_raw_instant(raw) {
                    Ok(Some(instant)) => self.instant = Some(instant),
                    Ok(None) => {}
                    Err(err) => {
                        tracing::debug!(adapter = stringify!($t), error = %err, "rejected date input");
                        return Err(err);
                    }
                }
                Ok(self)
            }

            /// Populate from a native instant in any timezone.
            pub fn populate_instant<Z: TimeZone>(&mut self, instant: &chrono::DateTime<Z>) -> &mut Self {
                self.instant = Some(instant.with_timezone(&Utc));
                self
            }

            pub fn instant(&self) -> Option<chrono::DateTime<Utc>> {
                self.instant
            }

            pub fn is_empty(&self) -> bool {
                self.instant.is_none()
            }

            pub fn clear(&mut self) {
                self.instant = None;
            }

            /// Canonical text, `None` when empty.
            pub fn encode(&self) -> Option<String> {
                self.instant.map(|$instant| $render)
            }
        }

        impl<Z: TimeZone> From<chrono::DateTime<Z>> for $t {
            fn from(instant: chrono::DateTime<Z>) -> Self {
                let mut adapter = Self::new();
                adapter.populate_instant(&instant);
                adapter
            }
        }

        impl Field for $t {
            fn assign(&mut self, raw: &Value) -> MarshalResult<()> {
                let mut fresh = Self::new();
                fresh.populate(raw)?;
                *self = fresh;
                Ok(())
            }

            fn flatten(&self, _allow_null: bool) -> MarshalResult<Value> {
                Ok(self.encode().map_or(Value::Null, Value::String))
            }

            fn is_populated(&self) -> bool {
                !self.is_empty()
            }
        }

        /// Serializes the canonical text, or `null` when empty.
        impl Serialize for $t {
            fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
                match self.encode() {
                    Some(text) => serializer.serialize_str(&text),
                    None => serializer.serialize_none(),
                }
            }
        }

        /// Accepts every raw form `populate` accepts.
        impl<'de> Deserialize<'de> for $t {
            fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
                let raw = Value::deserialize(deserializer)?;
                Self::from_raw(&raw).map_err(serde::de::Error::custom)
            }
        }
    };
}

impl_date_adapter!(Date, |instant| instant.format(Date::FORMAT).to_string());
impl_date_adapter!(DateTime, |instant| instant
    .with_timezone(&DateTime::TIMEZONE)
    .to_rfc3339_opts(SecondsFormat::Secs, false));

impl Date {
    pub const FORMAT: &'static str = "%Y-%m-%d";
}

impl DateTime {
    pub const TIMEZONE: Tz = chrono_tz::Europe::Amsterdam;
}

/// Zone used to interpret naive date strings.
#[derive(Debug, Copy, Clone)]
enum Zone {
    Named(Tz),
    Fixed(FixedOffset),
}

impl Zone {
    fn parse(name: &str) -> MarshalResult<Self> {
        if let Ok(tz) = name.parse::<Tz>() {
            return Ok(Self::Named(tz));
        }
        parse_offset(name)
            .map(Self::Fixed)
            .ok_or_else(|| MarshalError::validation(format!("unknown timezone '{name}'")))
    }

    fn localize(self, naive: NaiveDateTime) -> Option<chrono::DateTime<Utc>> {
        match self {
            Self::Named(tz) => match tz.from_local_datetime(&naive) {
                LocalResult::Single(dt) | LocalResult::Ambiguous(dt, _) => {
                    Some(dt.with_timezone(&Utc))
                }
                // Inside a DST gap: read with the offset in force before the
                // transition, which lands past the gap.
                LocalResult::None => {
                    let before = naive.checked_sub_days(Days::new(1))?;
                    let offset = tz.offset_from_utc_datetime(&before).fix();
                    offset
                        .from_local_datetime(&naive)
                        .single()
                        .map(|dt| dt.with_timezone(&Utc))
                }
            },
            Self::Fixed(offset) => offset
                .from_local_datetime(&naive)
                .single()
                .map(|dt| dt.with_timezone(&Utc)),
        }
    }
}

/// `+02:00`, `-0530` or `+01`.
fn parse_offset(text: &str) -> Option<FixedOffset> {
    let (sign, rest) = match text.as_bytes().first()? {
        b'+' => (1, &text[1..]),
        b'-' => (-1, &text[1..]),
        _ => return None,
    };
    let digits: String = rest.chars().filter(|c| *c != ':').collect();
    if !digits.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }
    let (hours, minutes) = match digits.len() {
        2 => (digits.parse::<i32>().ok()?, 0),
        4 => (digits[..2].parse::<i32>().ok()?, digits[2..].parse::<i32>().ok()?),
        _ => return None,
    };
    if minutes >= 60 {
        return None;
    }
    FixedOffset::east_opt(sign * (hours * 3600 + minutes * 60))
}

const OFFSET_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f%z",
    "%Y-%m-%d %H:%M:%S%.f%z",
    "%Y-%m-%dT%H:%M:%S%.f%:z",
    "%Y-%m-%d %H:%M:%S%.f%:z",
];

const NAIVE_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
    "%Y-%m-%dT%H:%M",
];

/// Values PHP-style APIs send for "no date".
fn is_empty_input(raw: &Value) -> bool {
    match raw {
        Value::Null => true,
        Value::Bool(b) => !b,
        Value::Number(n) => n.as_f64() == Some(0.0),
        Value::String(s) => s.trim().is_empty() || s == "0",
        Value::Array(items) => items.is_empty(),
        Value::Object(map) => map.is_empty(),
    }
}

/// Read an instant from raw input; `Ok(None)` for empty input.
pub(crate) fn parse_raw_instant(raw: &Value) -> MarshalResult<Option<chrono::DateTime<Utc>>> {
    if is_empty_input(raw) {
        return Ok(None);
    }

    match raw {
        Value::String(text) => parse_date_str(text, None).map(Some),
        Value::Object(map) => {
            let date = map.get("date").and_then(Value::as_str).ok_or_else(|| {
                MarshalError::validation("date mapping has no 'date' string")
            })?;
            let zone = match map.get("timezone") {
                Some(Value::String(name)) => Some(Zone::parse(name)?),
                _ => None,
            };
            parse_date_str(date, zone).map(Some)
        }
        other => Err(MarshalError::validation(format!(
            "cannot read a date from {}",
            json_kind(other)
        ))),
    }
}

/// Parse one textual date.
///
/// Strings carrying an offset keep it; naive strings are read in `zone`
/// (UTC when absent).
fn parse_date_str(text: &str, zone: Option<Zone>) -> MarshalResult<chrono::DateTime<Utc>> {
    let text = text.trim();
    let invalid = || MarshalError::validation(format!("unrecognized date '{text}'"));

    if let Some(seconds) = text.strip_prefix('@') {
        let seconds: i64 = seconds.parse().map_err(|_| invalid())?;
        return Utc.timestamp_opt(seconds, 0).single().ok_or_else(invalid);
    }

    if let Ok(dt) = chrono::DateTime::parse_from_rfc3339(text) {
        return Ok(dt.with_timezone(&Utc));
    }
    for format in OFFSET_FORMATS {
        if let Ok(dt) = chrono::DateTime::parse_from_str(text, format) {
            return Ok(dt.with_timezone(&Utc));
        }
    }
    if let Ok(dt) = chrono::DateTime::parse_from_rfc2822(text) {
        return Ok(dt.with_timezone(&Utc));
    }

    let naive = NAIVE_FORMATS
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(text, format).ok())
        .or_else(|| {
            NaiveDate::parse_from_str(text, "%Y-%m-%d")
                .ok()
                .and_then(|date| date.and_hms_opt(0, 0, 0))
        })
        .ok_or_else(invalid)?;

    match zone {
        Some(zone) => zone.localize(naive).ok_or_else(|| {
            MarshalError::validation(format!("'{text}' cannot be placed in the given timezone"))
        }),
        None => Ok(naive.and_utc()),
    }
}
