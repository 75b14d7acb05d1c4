//! window.rs
//!
//! Inclusive date range used to decide whether an issue, pull request or
//! review falls inside the reporting period.
//!
//! GitHub timestamps are full UTC instants, while the period is configured in
//! whole days. We compare on the UTC calendar date so that the entire `end`
//! day is part of the window.

use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum WindowError {
    #[error("window start {start} is after window end {end}")]
    Inverted { start: NaiveDate, end: NaiveDate },

    #[error("fiscal year {0} is out of range")]
    FiscalYear(i32),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TimeWindow {
    start: NaiveDate,
    end: NaiveDate,
}

impl TimeWindow {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Result<Self, WindowError> {
        if start > end {
            return Err(WindowError::Inverted { start, end });
        }
        Ok(Self { start, end })
    }

    /// Fiscal year `year` runs from July 1 of the previous calendar year
    /// through June 30 of `year` (FY2023 = 2022-07-01 ..= 2023-06-30).
    pub fn fiscal_year(year: i32) -> Result<Self, WindowError> {
        let prev = year.checked_sub(1).ok_or(WindowError::FiscalYear(year))?;
        let start = NaiveDate::from_ymd_opt(prev, 7, 1).ok_or(WindowError::FiscalYear(year))?;
        let end = NaiveDate::from_ymd_opt(year, 6, 30).ok_or(WindowError::FiscalYear(year))?;
        Self::new(start, end)
    }

    pub fn start(&self) -> NaiveDate {
        self.start
    }

    pub fn end(&self) -> NaiveDate {
        self.end
    }

    pub fn contains_date(&self, date: NaiveDate) -> bool {
        self.start <= date && date <= self.end
    }

    pub fn contains(&self, ts: DateTime<Utc>) -> bool {
        self.contains_date(ts.date_naive())
    }

    /// True when at least one of the present timestamps is in window.
    /// Missing timestamps (an issue that was never closed) never match.
    pub fn contains_any(&self, timestamps: &[Option<DateTime<Utc>>]) -> bool {
        timestamps.iter().flatten().any(|ts| self.contains(*ts))
    }

    /// Timestamp form of `start`, used for the issues endpoint `since` filter.
    pub fn start_instant(&self) -> DateTime<Utc> {
        self.start.and_time(chrono::NaiveTime::MIN).and_utc()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn fiscal_year_spans_july_to_june() {
        let w = TimeWindow::fiscal_year(2023).unwrap();
        assert_eq!(w.start(), date(2022, 7, 1));
        assert_eq!(w.end(), date(2023, 6, 30));
    }

    #[test]
    fn unrepresentable_fiscal_years_are_errors() {
        assert_eq!(
            TimeWindow::fiscal_year(i32::MIN),
            Err(WindowError::FiscalYear(i32::MIN))
        );
        assert_eq!(
            TimeWindow::fiscal_year(300_000),
            Err(WindowError::FiscalYear(300_000))
        );
        assert_eq!(
            TimeWindow::fiscal_year(i32::MAX),
            Err(WindowError::FiscalYear(i32::MAX))
        );
    }

    #[test]
    fn inverted_window_is_rejected() {
        let err = TimeWindow::new(date(2023, 6, 30), date(2022, 7, 1)).unwrap_err();
        assert_eq!(
            err,
            WindowError::Inverted {
                start: date(2023, 6, 30),
                end: date(2022, 7, 1)
            }
        );
    }

    #[test]
    fn single_day_window_is_allowed() {
        let w = TimeWindow::new(date(2023, 1, 1), date(2023, 1, 1)).unwrap();
        assert!(w.contains_date(date(2023, 1, 1)));
        assert!(!w.contains_date(date(2023, 1, 2)));
    }

    #[test]
    fn bounds_are_inclusive() {
        let w = TimeWindow::fiscal_year(2023).unwrap();
        let first = Utc.with_ymd_and_hms(2022, 7, 1, 0, 0, 0).unwrap();
        let last = Utc.with_ymd_and_hms(2023, 6, 30, 23, 59, 59).unwrap();
        let before = Utc.with_ymd_and_hms(2022, 6, 30, 23, 59, 59).unwrap();
        let after = Utc.with_ymd_and_hms(2023, 7, 1, 0, 0, 0).unwrap();

        assert!(w.contains(first));
        assert!(w.contains(last));
        assert!(!w.contains(before));
        assert!(!w.contains(after));
    }

    #[test]
    fn contains_any_ignores_missing() {
        let w = TimeWindow::fiscal_year(2023).unwrap();
        let old = Utc.with_ymd_and_hms(2020, 1, 1, 0, 0, 0).unwrap();
        let inside = Utc.with_ymd_and_hms(2023, 1, 1, 0, 0, 0).unwrap();

        assert!(!w.contains_any(&[None, None]));
        assert!(!w.contains_any(&[Some(old), None]));
        assert!(w.contains_any(&[Some(old), None, Some(inside)]));
    }

    #[test]
    fn start_instant_is_midnight_utc() {
        let w = TimeWindow::fiscal_year(2023).unwrap();
        assert_eq!(
            w.start_instant(),
            Utc.with_ymd_and_hms(2022, 7, 1, 0, 0, 0).unwrap()
        );
    }
}
