//! Month-granularity calendar helpers.
//!
//! Depreciation accrues in whole calendar months, so every date the engine
//! handles is first collapsed to the first day of its month.

use chrono::{Datelike, Months, NaiveDate};

use crate::error::DepreciationError;
use crate::DepreciationResult;

/// First day of the month containing `date`.
pub fn month_start(date: NaiveDate) -> NaiveDate {
    date.with_day(1).unwrap_or(date)
}

/// Signed number of whole calendar months from `from`'s month to `to`'s
/// month. Days within the month are ignored.
pub fn months_between(from: NaiveDate, to: NaiveDate) -> i64 {
    month_ordinal(to) - month_ordinal(from)
}

/// Shift a month start forward by `months` calendar months.
pub fn add_months(date: NaiveDate, months: u32) -> DepreciationResult<NaiveDate> {
    month_start(date)
        .checked_add_months(Months::new(months))
        .ok_or_else(|| {
            DepreciationError::DateError(format!("{date} + {months} months is out of range"))
        })
}

/// Calendar `(year, month)` that lies `offset` months after `start`'s month.
pub fn year_month(start: NaiveDate, offset: u32) -> (i32, u32) {
    let ordinal = month_ordinal(start) + i64::from(offset);
    let year = ordinal.div_euclid(12) as i32;
    let month = ordinal.rem_euclid(12) as u32 + 1;
    (year, month)
}

/// First day of the given calendar month.
pub fn first_of_month(year: i32, month: u32) -> DepreciationResult<NaiveDate> {
    NaiveDate::from_ymd_opt(year, month, 1)
        .ok_or_else(|| DepreciationError::DateError(format!("{year}-{month:02} is not a valid month")))
}

fn month_ordinal(date: NaiveDate) -> i64 {
    i64::from(date.year()) * 12 + i64::from(date.month0())
}
