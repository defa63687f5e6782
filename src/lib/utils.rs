use std::str::FromStr;

use chrono::{DateTime, NaiveDateTime, TimeZone, Utc};
use serde::{de, Deserialize, Deserializer};
use surrealdb::sql::Thing;
use tracing::{debug, instrument};
use ulid::Ulid;

pub const MEETING_TABLE: &str = "meeting";
pub const USER_TABLE: &str = "user";

/// Browsers send `datetime-local` values without seconds or a zone.
const RELAXED_TIMESTAMP_FORMATS: [&str; 2] = ["%Y-%m-%dT%H:%M:%S", "%Y-%m-%dT%H:%M"];

pub fn meeting_thing(id: &Ulid) -> Thing {
    Thing::from((String::from(MEETING_TABLE), id.to_string()))
}

/// Creates a meeting Thing from a raw id, or `None` if it isn't a ULID.
#[instrument]
pub fn meeting_thing_from_str(raw: &str) -> Option<Thing> {
    match Ulid::from_str(raw) {
        Ok(ulid) => Some(meeting_thing(&ulid)),
        Err(e) => {
            debug!("ignoring malformed meeting id {:?}: {}", raw, e);
            None
        }
    }
}

/// Creates a user Thing. Accepts both `alice` and `user:alice`.
pub fn user_thing(raw: &str) -> Thing {
    let key = raw
        .strip_prefix(USER_TABLE)
        .and_then(|rest| rest.strip_prefix(':'))
        .unwrap_or(raw);

    Thing::from((String::from(USER_TABLE), String::from(key)))
}

/// The id part of a Thing without the table prefix.
pub fn thing_key(thing: &Thing) -> String {
    thing.id.to_raw()
}

/// Parses RFC 3339, falling back to zone-less minute/second precision read as UTC.
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    if let Ok(parsed) = DateTime::parse_from_rfc3339(raw) {
        return Some(parsed.with_timezone(&Utc));
    }

    let naive = raw.strip_suffix('Z').unwrap_or(raw);
    RELAXED_TIMESTAMP_FORMATS
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(naive, format).ok())
        .map(|parsed| Utc.from_utc_datetime(&parsed))
}

/// Missing, `null` and `""` all read as `None`.
pub fn deserialize_optional_timestamp<'de, D>(
    deserializer: D,
) -> Result<Option<DateTime<Utc>>, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<String>::deserialize(deserializer)? {
        None => Ok(None),
        Some(raw) if raw.is_empty() => Ok(None),
        Some(raw) => parse_timestamp(&raw)
            .map(Some)
            .ok_or_else(|| de::Error::custom(format!("invalid timestamp: {raw}"))),
    }
}

/// Distinguishes an absent field (`None`) from an explicit `null` (`Some(None)`).
/// Pair with `#[serde(default)]`.
pub fn deserialize_present<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}
