//! Timestamp conversion for graph API records.
//!
//! The API reports `YYYY-MM-DDTHH:MM:SS+0000`. Rows carry a spreadsheet-friendly local
//! time instead: a static UTC-8 shift (Pacific Standard Time, no DST handling),
//! rendered as `YYYY-MM-DD HH:MM:SS`.

use time::macros::format_description;
use time::{Duration, PrimitiveDateTime};

/// Fixed offset applied to every API timestamp, in hours.
pub const LOCAL_OFFSET_HOURS: i64 = -8;

/// Parse an API timestamp (literal `+0000` suffix required).
pub fn parse_api_timestamp(s: &str) -> Option<PrimitiveDateTime> {
    PrimitiveDateTime::parse(s.trim(), format_description!("[year]-[month]-[day]T[hour]:[minute]:[second]+0000")).ok()
}

/// Shift an API timestamp to local time and render it for a row.
pub fn to_local_row_time(s: &str) -> Option<String> {
    let utc = parse_api_timestamp(s)?;
    let local = utc.checked_add(Duration::hours(LOCAL_OFFSET_HOURS))?;
    local.format(format_description!("[year]-[month]-[day] [hour]:[minute]:[second]")).ok()
}
