//! Time utilities: the "current moment" anchor in the user's timezone.

use anyhow::Result;
use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use chrono_tz::Tz;

/// Parse an IANA timezone name like "Asia/Karachi".
pub fn parse_timezone(tz: &str) -> Result<Tz> {
    tz.parse()
        .map_err(|_| anyhow::anyhow!("invalid timezone: {tz}"))
}

/// Wall-clock time in `tz` for a given UTC instant.
pub fn local_datetime(at: DateTime<Utc>, tz: Tz) -> NaiveDateTime {
    at.with_timezone(&tz).naive_local()
}

/// "Now" as the user sees it. Parsers take this as an argument so that a
/// fixed anchor makes them deterministic.
pub fn local_now(tz: Tz) -> NaiveDateTime {
    local_datetime(Utc::now(), tz)
}

pub fn local_today(tz: Tz) -> NaiveDate {
    local_now(tz).date()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_karachi_offset() {
        // PKT is UTC+5, no DST
        let utc = Utc.with_ymd_and_hms(2026, 2, 20, 21, 30, 0).unwrap();
        let local = local_datetime(utc, parse_timezone("Asia/Karachi").unwrap());
        assert_eq!(local.to_string(), "2026-02-21 02:30:00");
    }

    #[test]
    fn test_invalid_timezone() {
        assert!(parse_timezone("Mars/Olympus").is_err());
    }
}
