//! Dates mentioned inside free text: "yesterday", "3 days ago",
//! "last friday", "5th March", "12/03/2025".
//!
//! Ambiguous expressions resolve relative to an explicit anchor so results
//! are reproducible.

use chrono::{Datelike, Duration, Months, NaiveDate, NaiveDateTime, TimeDelta, Weekday};
use regex::{Captures, Regex};
use serde::{Deserialize, Serialize};
use std::sync::OnceLock;

/// How to read "03/04/2025"
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DateOrder {
    #[default]
    DayMonthYear,
    MonthDayYear,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateSettings {
    /// Undated weekdays and yearless dates resolve backwards in time
    pub prefer_past: bool,
    pub order: DateOrder,
}

impl Default for DateSettings {
    fn default() -> Self {
        Self {
            prefer_past: true,
            order: DateOrder::DayMonthYear,
        }
    }
}

const MONTH_ALT: &str = r"(jan(?:uary)?|feb(?:ruary)?|mar(?:ch)?|apr(?:il)?|may|june?|july?|aug(?:ust)?|sep(?:t(?:ember)?)?|oct(?:ober)?|nov(?:ember)?|dec(?:ember)?)";
const WEEKDAY_ALT: &str = r"(monday|tuesday|wednesday|thursday|friday|saturday|sunday)";

struct Patterns {
    ago: Regex,
    last_weekday: Regex,
    weekday: Regex,
    iso: Regex,
    numeric: Regex,
    numeric_no_year: Regex,
    day_month: Regex,
    month_day: Regex,
}

fn patterns() -> &'static Patterns {
    static P: OnceLock<Patterns> = OnceLock::new();
    P.get_or_init(|| {
        let re = |p: &str| Regex::new(p).expect("invalid date regex");
        Patterns {
            ago: re(r"\b(\d+|a|an|one|two|three|four|five|six|seven)\s+(day|week|month)s?\s+ago\b"),
            last_weekday: re(&format!(r"\blast\s+{WEEKDAY_ALT}\b")),
            weekday: re(&format!(r"\b{WEEKDAY_ALT}\b")),
            iso: re(r"\b(\d{4})-(\d{1,2})-(\d{1,2})\b"),
            numeric: re(r"\b(\d{1,2})[/.-](\d{1,2})[/.-](\d{4}|\d{2})\b"),
            numeric_no_year: re(r"\b(\d{1,2})/(\d{1,2})\b"),
            day_month: re(&format!(
                r"\b(\d{{1,2}})(?:st|nd|rd|th)?\s+(?:of\s+)?{MONTH_ALT}\b(?:,?\s+(\d{{4}}))?"
            )),
            month_day: re(&format!(
                r"\b{MONTH_ALT}\s+(\d{{1,2}})(?:st|nd|rd|th)?\b(?:,?\s+(\d{{4}}))?"
            )),
        }
    })
}

/// Find the first date expression in `text`, resolved against `now`.
///
/// Relative phrases are checked before absolute ones. Returns `None` when
/// nothing date-like is present; callers default to today.
pub fn resolve_mentioned_date(text: &str, now: NaiveDateTime, settings: DateSettings) -> Option<NaiveDate> {
    let t = text.to_lowercase();
    let today = now.date();
    let p = patterns();

    if t.contains("day before yesterday") {
        return Some(today - Duration::days(2));
    }
    if t.contains("yesterday") {
        return Some(today - Duration::days(1));
    }
    if t.contains("today") || t.contains("tonight") || t.contains("this morning") {
        return Some(today);
    }
    if let Some(c) = p.ago.captures(&t) {
        let n = small_number(&c[1])?;
        // Counts past the calendar range resolve to None, not a panic.
        return match &c[2] {
            "day" => today.checked_sub_signed(TimeDelta::try_days(n.into())?),
            "week" => today.checked_sub_signed(TimeDelta::try_weeks(n.into())?),
            _ => today.checked_sub_months(Months::new(n)),
        };
    }
    if let Some(c) = p.last_weekday.captures(&t) {
        let wd = weekday(&c[1])?;
        let back = match days_back(today, wd) {
            0 => 7,
            n => n,
        };
        return Some(today - Duration::days(back));
    }
    if let Some(c) = p.weekday.captures(&t) {
        let wd = weekday(&c[1])?;
        return Some(if settings.prefer_past {
            today - Duration::days(days_back(today, wd))
        } else {
            today + Duration::days((7 - days_back(today, wd)) % 7)
        });
    }
    if let Some(c) = p.iso.captures(&t) {
        let (y, m, d) = (c[1].parse().ok()?, c[2].parse().ok()?, c[3].parse().ok()?);
        return NaiveDate::from_ymd_opt(y, m, d);
    }
    if let Some(c) = p.numeric.captures(&t) {
        let (d, m) = ordered(&c, settings.order)?;
        return NaiveDate::from_ymd_opt(full_year(&c[3])?, m, d);
    }
    if let Some(c) = p.day_month.captures(&t) {
        let d: u32 = c[1].parse().ok()?;
        let m = month_number(&c[2])?;
        return with_year(c.get(3).map(|y| y.as_str()), m, d, today, settings);
    }
    if let Some(c) = p.month_day.captures(&t) {
        let m = month_number(&c[1])?;
        let d: u32 = c[2].parse().ok()?;
        return with_year(c.get(3).map(|y| y.as_str()), m, d, today, settings);
    }
    if let Some(c) = p.numeric_no_year.captures(&t) {
        let (d, m) = ordered(&c, settings.order)?;
        return with_year(None, m, d, today, settings);
    }
    None
}

fn ordered(c: &Captures, order: DateOrder) -> Option<(u32, u32)> {
    let a: u32 = c[1].parse().ok()?;
    let b: u32 = c[2].parse().ok()?;
    Some(match order {
        DateOrder::DayMonthYear => (a, b),
        DateOrder::MonthDayYear => (b, a),
    })
}

/// Explicit year, or the nearest year in the preferred direction
fn with_year(year: Option<&str>, m: u32, d: u32, today: NaiveDate, settings: DateSettings) -> Option<NaiveDate> {
    if let Some(y) = year {
        return NaiveDate::from_ymd_opt(y.parse().ok()?, m, d);
    }
    let this_year = NaiveDate::from_ymd_opt(today.year(), m, d)?;
    if settings.prefer_past && this_year > today {
        NaiveDate::from_ymd_opt(today.year() - 1, m, d)
    } else if !settings.prefer_past && this_year < today {
        NaiveDate::from_ymd_opt(today.year() + 1, m, d)
    } else {
        Some(this_year)
    }
}

fn full_year(s: &str) -> Option<i32> {
    let y: i32 = s.parse().ok()?;
    Some(if s.len() == 2 { 2000 + y } else { y })
}

fn days_back(today: NaiveDate, wd: Weekday) -> i64 {
    let diff = today.weekday().num_days_from_monday() as i64 - wd.num_days_from_monday() as i64;
    diff.rem_euclid(7)
}

fn small_number(s: &str) -> Option<u32> {
    match s {
        "a" | "an" | "one" => Some(1),
        "two" => Some(2),
        "three" => Some(3),
        "four" => Some(4),
        "five" => Some(5),
        "six" => Some(6),
        "seven" => Some(7),
        n => n.parse().ok(),
    }
}

fn weekday(s: &str) -> Option<Weekday> {
    s.parse().ok()
}

fn month_number(s: &str) -> Option<u32> {
    let m = match &s[..3] {
        "jan" => 1,
        "feb" => 2,
        "mar" => 3,
        "apr" => 4,
        "may" => 5,
        "jun" => 6,
        "jul" => 7,
        "aug" => 8,
        "sep" => 9,
        "oct" => 10,
        "nov" => 11,
        "dec" => 12,
        _ => return None,
    };
    Some(m)
}
