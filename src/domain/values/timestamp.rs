//! Millisecond epoch timestamps as they arrive from the feed, and their
//! US/Eastern calendar rendering used by messages and persisted rows.

use crate::domain::error::DomainError;
use chrono::DateTime;
use chrono_tz::Tz;
use chrono_tz::US::Eastern;

const DISPLAY_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

pub fn to_eastern(ms: i64) -> Result<DateTime<Tz>, DomainError> {
    DateTime::from_timestamp_millis(ms)
        .map(|dt| dt.with_timezone(&Eastern))
        .ok_or(DomainError::Timestamp(ms))
}

/// Human-readable Eastern time, falling back to the raw value when the
/// timestamp is out of range.
pub fn display(ms: i64) -> String {
    match to_eastern(ms) {
        Ok(dt) => dt.format(DISPLAY_FORMAT).to_string(),
        Err(_) => ms.to_string(),
    }
}
