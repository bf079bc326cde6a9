//! Calendar arithmetic
//!
//! Business-day counting for variance metrics, plus the calendar-month
//! helpers used by the buffer shift and the timeline position mapping.
//!
//! Variances follow a `b - a` convention: with `a` the planned date and
//! `b` the actual one, a later actual date yields a positive count (late).

use chrono::{Datelike, Months, NaiveDate, Weekday};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

use crate::{AggregatedStageInterval, VarianceMetric};

/// Working-day definition for variance arithmetic
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BusinessCalendar {
    /// Working days (0 = Sunday, 6 = Saturday)
    pub working_days: Vec<u8>,
    /// Non-working dates on top of the weekly pattern
    pub holidays: BTreeSet<NaiveDate>,
}

impl Default for BusinessCalendar {
    fn default() -> Self {
        Self {
            working_days: vec![1, 2, 3, 4, 5], // Mon-Fri
            holidays: BTreeSet::new(),
        }
    }
}

impl BusinessCalendar {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add holidays
    pub fn with_holidays(mut self, holidays: impl IntoIterator<Item = NaiveDate>) -> Self {
        self.holidays.extend(holidays);
        self
    }

    /// Check if a date is a working day
    pub fn is_working_day(&self, date: NaiveDate) -> bool {
        let weekday = date.weekday().num_days_from_sunday() as u8;
        self.working_days.contains(&weekday) && !self.holidays.contains(&date)
    }

    /// Signed business days from `a` to `b`.
    ///
    /// Counts working days in `(a, b]` when `b` is later, the negated count
    /// of `(b, a]` when `b` is earlier, and 0 when equal. `None` if either
    /// date is missing.
    pub fn business_days_between(&self, a: Option<NaiveDate>, b: Option<NaiveDate>) -> Option<i64> {
        let (a, b) = (a?, b?);
        if a == b {
            return Some(0);
        }
        let (from, to, sign) = if b > a { (a, b, 1) } else { (b, a, -1) };
        let count = from
            .iter_days()
            .skip(1)
            .take_while(|d| *d <= to)
            .filter(|d| self.is_working_day(*d))
            .count() as i64;
        Some(sign * count)
    }

    /// Business-day duration of a range
    pub fn duration(&self, start: Option<NaiveDate>, end: Option<NaiveDate>) -> Option<i64> {
        self.business_days_between(start, end)
    }

    /// Termination and duration variance of an aggregated interval
    pub fn variance(&self, interval: &AggregatedStageInterval) -> VarianceMetric {
        let planned = self.duration(interval.planned_start, interval.planned_end);
        let actual = self.duration(interval.actual_start, interval.actual_end);
        VarianceMetric {
            termination_variance_days: self
                .business_days_between(interval.planned_end, interval.actual_end),
            duration_variance_days: actual
                .zip(planned)
                .map(|(actual, planned)| duration_variance(actual, planned)),
        }
    }
}

/// Actual minus planned duration; positive means the stage took longer
pub fn duration_variance(actual_dur: i64, planned_dur: i64) -> i64 {
    actual_dur - planned_dur
}

/// Shift a date by whole calendar months, keeping the day of month and
/// clamping to the last valid day of the target month (Jan 31 + 1 = Feb 29).
pub fn add_months(date: NaiveDate, months: i32) -> NaiveDate {
    let shifted = if months >= 0 {
        date.checked_add_months(Months::new(months.unsigned_abs()))
    } else {
        date.checked_sub_months(Months::new(months.unsigned_abs()))
    };
    shifted.unwrap_or(date)
}

/// First day of the date's month
pub fn month_floor(date: NaiveDate) -> NaiveDate {
    date.with_day(1).unwrap_or(date)
}

/// Number of days in the date's month
pub fn days_in_month(date: NaiveDate) -> u32 {
    let first = month_floor(date);
    // only the last representable month has no successor, and it is a December
    first
        .checked_add_months(Months::new(1))
        .map_or(31, |next| (next - first).num_days() as u32)
}

/// Whole calendar months from `a`'s month to `b`'s month, ignoring days
pub fn whole_months_between(a: NaiveDate, b: NaiveDate) -> i32 {
    (b.year() - a.year()) * 12 + (b.month() as i32 - a.month() as i32)
}

/// Elapsed fraction of the date's month at the start of that day
pub fn month_fraction(date: NaiveDate) -> f64 {
    f64::from(date.day() - 1) / f64::from(days_in_month(date))
}

/// Whether a date falls on Saturday or Sunday
pub fn is_weekend(date: NaiveDate) -> bool {
    matches!(date.weekday(), Weekday::Sat | Weekday::Sun)
}
