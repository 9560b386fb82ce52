//! Relative date-range phrases ("today", "last month", "September") for
//! reporting queries.

use chrono::{Datelike, Duration, NaiveDate};
use serde::{Deserialize, Serialize};

/// Inclusive calendar range. `start <= end` always holds.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct DateRange {
    start: NaiveDate,
    end: NaiveDate,
}

impl DateRange {
    /// Returns `None` when `start > end`.
    pub fn new(start: NaiveDate, end: NaiveDate) -> Option<Self> {
        (start <= end).then_some(Self { start, end })
    }

    pub fn day(d: NaiveDate) -> Self {
        Self { start: d, end: d }
    }

    /// First to last day of a calendar month
    pub fn month(year: i32, month: u32) -> Option<Self> {
        let start = NaiveDate::from_ymd_opt(year, month, 1)?;
        Some(Self {
            start,
            end: last_day_of_month(year, month)?,
        })
    }

    pub fn start(&self) -> NaiveDate {
        self.start
    }

    pub fn end(&self) -> NaiveDate {
        self.end
    }

    pub fn contains(&self, d: NaiveDate) -> bool {
        self.start <= d && d <= self.end
    }
}

pub const MONTH_NAMES: [&str; 12] = [
    "january",
    "february",
    "march",
    "april",
    "may",
    "june",
    "july",
    "august",
    "september",
    "october",
    "november",
    "december",
];

pub fn last_day_of_month(year: i32, month: u32) -> Option<NaiveDate> {
    let (ny, nm) = if month == 12 { (year + 1, 1) } else { (year, month + 1) };
    NaiveDate::from_ymd_opt(ny, nm, 1)?.pred_opt()
}

/// First day of the month after `d`'s month
pub fn first_of_next_month(d: NaiveDate) -> Option<NaiveDate> {
    let (ny, nm) = if d.month() == 12 { (d.year() + 1, 1) } else { (d.year(), d.month() + 1) };
    NaiveDate::from_ymd_opt(ny, nm, 1)
}

fn monday_of(d: NaiveDate) -> NaiveDate {
    d - Duration::days(d.weekday().num_days_from_monday() as i64)
}

/// Resolve a free-text query to a date range relative to `today`.
///
/// Phrases are checked in a fixed priority order and the first hit wins.
/// `None` means no date filter (match everything).
pub fn resolve_date_range(text: &str, today: NaiveDate) -> Option<DateRange> {
    let t = text.to_lowercase();

    if t.contains("today") {
        return Some(DateRange::day(today));
    }
    if t.contains("yesterday") {
        return Some(DateRange::day(today - Duration::days(1)));
    }
    if t.contains("this week") {
        return DateRange::new(monday_of(today), today);
    }
    if t.contains("last week") {
        let start = monday_of(today) - Duration::days(7);
        return DateRange::new(start, start + Duration::days(6));
    }
    if t.contains("this month") {
        let start = NaiveDate::from_ymd_opt(today.year(), today.month(), 1)?;
        return DateRange::new(start, today);
    }
    if t.contains("last month") {
        let (y, m) = if today.month() == 1 {
            (today.year() - 1, 12)
        } else {
            (today.year(), today.month() - 1)
        };
        return DateRange::month(y, m);
    }

    let month = MONTH_NAMES.iter().position(|name| t.contains(name))? as u32 + 1;
    // A month later in the year than now means last year's ("September" said in January).
    let year = if month > today.month() { today.year() - 1 } else { today.year() };
    DateRange::month(year, month)
}
