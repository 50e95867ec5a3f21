//! Actuarial age conventions and calendar arithmetic

use crate::error::{ReserveError, Result};
use chrono::{Datelike, Days, Months, NaiveDate};

/// Age convention
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AgeMethod {
    /// Age last birthday (ALB)
    LastBirthday,
    /// Age nearest birthday (ACB); rounds up from six months past the last birthday
    NearestBirthday,
}

/// Whole months from `from` to `to`, counting a month only once its day is reached
pub fn completed_months(from: NaiveDate, to: NaiveDate) -> i64 {
    let mut months = (to.year() - from.year()) as i64 * 12 + to.month() as i64 - from.month() as i64;
    if to.day() < from.day() {
        months -= 1;
    }
    months
}

/// Age at a date under the given convention; zero before birth
pub fn age_at(birth_dt: NaiveDate, at: NaiveDate, method: AgeMethod) -> u32 {
    let months = completed_months(birth_dt, at).max(0);
    let years = match method {
        AgeMethod::LastBirthday => months / 12,
        AgeMethod::NearestBirthday => (months + 6) / 12,
    };
    years as u32
}

pub fn add_months(date: NaiveDate, months: u32) -> Result<NaiveDate> {
    date.checked_add_months(Months::new(months))
        .ok_or_else(|| ReserveError::InvalidRecord(format!("{} + {} months is out of range", date, months)))
}

pub fn add_years(date: NaiveDate, years: u32) -> Result<NaiveDate> {
    add_months(date, years * 12)
}

pub fn add_days(date: NaiveDate, days: u32) -> Result<NaiveDate> {
    date.checked_add_days(Days::new(days as u64))
        .ok_or_else(|| ReserveError::InvalidRecord(format!("{} + {} days is out of range", date, days)))
}

/// Signed day count from `from` to `to`
pub fn days_between(from: NaiveDate, to: NaiveDate) -> i64 {
    (to - from).num_days()
}
