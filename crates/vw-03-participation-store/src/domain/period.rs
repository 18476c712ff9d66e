//! Reporting periods resolved to calendar-day ranges.

use chrono::{Datelike, Days, NaiveDate};
use std::fmt;
use std::str::FromStr;

/// Half-open range of calendar days `[start, end)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateRange {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Self {
        Self { start, end }
    }

    /// A single day.
    pub fn day(date: NaiveDate) -> Self {
        Self {
            start: date,
            end: next_day(date),
        }
    }

    /// Every representable 4-digit-year date.
    pub fn all() -> Self {
        Self {
            start: NaiveDate::from_ymd_opt(1, 1, 1).unwrap_or(NaiveDate::MIN),
            end: NaiveDate::from_ymd_opt(9999, 12, 31).unwrap_or(NaiveDate::MAX),
        }
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start <= date && date < self.end
    }
}

fn next_day(date: NaiveDate) -> NaiveDate {
    date.checked_add_days(Days::new(1)).unwrap_or(date)
}

/// Named trailing periods used by dashboards and metrics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Period {
    /// Monday of this week through today.
    CurrentWeek,
    /// First of this month through today.
    CurrentMonth,
    /// January 1st through today.
    CurrentYear,
    AllTime,
}

impl Period {
    pub const ALL: [Period; 4] = [
        Period::CurrentWeek,
        Period::CurrentMonth,
        Period::CurrentYear,
        Period::AllTime,
    ];

    /// Date range covered by this period as seen on `today`.
    pub fn resolve(&self, today: NaiveDate) -> DateRange {
        let end = next_day(today);
        let start = match self {
            Period::CurrentWeek => today
                .checked_sub_days(Days::new(u64::from(today.weekday().num_days_from_monday())))
                .unwrap_or(today),
            Period::CurrentMonth => today.with_day(1).unwrap_or(today),
            Period::CurrentYear => NaiveDate::from_ymd_opt(today.year(), 1, 1).unwrap_or(today),
            Period::AllTime => return DateRange::all(),
        };
        DateRange { start, end }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Period::CurrentWeek => "current_week",
            Period::CurrentMonth => "current_month",
            Period::CurrentYear => "current_year",
            Period::AllTime => "all_time",
        }
    }
}

impl fmt::Display for Period {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Period {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Period::ALL
            .into_iter()
            .find(|p| p.as_str() == s)
            .ok_or_else(|| format!("unknown period {s:?}"))
    }
}
