//! SQLite implementations of the core repository traits.

mod auth_code_repository;
mod client_repository;
mod token_repository;
mod user_profile_repository;

pub use auth_code_repository::SqliteAuthCodeRepository;
pub use client_repository::SqliteClientRepository;
pub use token_repository::SqliteTokenRepository;
pub use user_profile_repository::SqliteUserProfileRepository;

use chrono::{DateTime, NaiveDateTime, Utc};

/// Timestamp storage format: fixed-width UTC with millisecond precision so
/// string comparison in SQL agrees with chronological order.
const TS_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.3fZ";

pub(crate) fn fmt_ts(dt: DateTime<Utc>) -> String {
    dt.format(TS_FORMAT).to_string()
}

pub(crate) fn parse_ts(s: &str) -> Result<DateTime<Utc>, String> {
    if let Ok(dt) = NaiveDateTime::parse_from_str(s, TS_FORMAT) {
        return Ok(dt.and_utc());
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Ok(dt.with_timezone(&Utc));
    }
    Err(format!("unparsable timestamp: {:?}", s))
}

/// Parse a timestamp column inside a row mapper. A corrupt value is a
/// conversion error, never a fabricated time.
pub(crate) fn ts_column(idx: usize, s: &str) -> rusqlite::Result<DateTime<Utc>> {
    parse_ts(s).map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(idx, rusqlite::types::Type::Text, e.into())
    })
}

pub(crate) fn optional_ts_column(
    idx: usize,
    s: Option<String>,
) -> rusqlite::Result<Option<DateTime<Utc>>> {
    s.map(|v| ts_column(idx, &v)).transpose()
}
