//! Calendar boundaries for month-over-month and day-over-day comparison.
//!
//! All values are local wall-clock times ([`NaiveDateTime`]). Conversion from
//! offset-carrying timestamps happens once at the source boundary, so month
//! and day extraction here always uses the deployment's local calendar.

use chrono::{Datelike, Duration, NaiveDate, NaiveDateTime, NaiveTime};
use serde::Serialize;

/// An inclusive calendar window `[start, end]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Window {
    pub start: NaiveDateTime,
    pub end: NaiveDateTime,
}

impl Window {
    pub fn contains(&self, ts: NaiveDateTime) -> bool {
        ts >= self.start && ts <= self.end
    }

    pub fn start_date(&self) -> NaiveDate {
        self.start.date()
    }

    pub fn end_date(&self) -> NaiveDate {
        self.end.date()
    }
}

/// The calendar month containing `now`.
pub fn current_window(now: NaiveDateTime) -> Window {
    month_window(now.year(), now.month())
}

/// The calendar month immediately before the one containing `now`.
/// January rolls back to December of the prior year.
pub fn previous_window(now: NaiveDateTime) -> Window {
    let (year, month) = if now.month() == 1 {
        (now.year() - 1, 12)
    } else {
        (now.year(), now.month() - 1)
    };
    month_window(year, month)
}

/// Truncates a timestamp to its ISO date, e.g. `2024-02-01`.
pub fn day_key(ts: NaiveDateTime) -> String {
    ts.date().format("%Y-%m-%d").to_string()
}

/// Day key for the calendar day before `now`.
pub fn previous_day_key(now: NaiveDateTime) -> String {
    let yesterday = now.date().pred_opt().unwrap_or(NaiveDate::MIN);
    yesterday.format("%Y-%m-%d").to_string()
}

fn month_window(year: i32, month: u32) -> Window {
    // Month and year come from a valid date, so day 1 always exists.
    let first = NaiveDate::from_ymd_opt(year, month, 1).unwrap_or(NaiveDate::MIN);
    let next_first = if month == 12 {
        NaiveDate::from_ymd_opt(year + 1, 1, 1)
    } else {
        NaiveDate::from_ymd_opt(year, month + 1, 1)
    }
    .unwrap_or(NaiveDate::MAX);

    let start = first.and_time(NaiveTime::MIN);
    let end = next_first.and_time(NaiveTime::MIN) - Duration::milliseconds(1);
    Window { start, end }
}
