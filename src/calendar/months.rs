//! Month enumeration over a date range.

use chrono::{Datelike, Months, NaiveDate};

use crate::domain::DateRange;

/// `(year, month)` for every calendar month touched by `range`, in order.
///
/// Stepping is done on the first of each month so a range like Jan 31 - Mar 1
/// visits February.
pub fn months_in(range: &DateRange) -> impl Iterator<Item = (i32, u32)> {
    let last = first_of_month(range.end());
    let mut cursor = Some(first_of_month(range.start()));

    std::iter::from_fn(move || {
        let current = cursor.filter(|c| *c <= last)?;
        cursor = current.checked_add_months(Months::new(1));
        Some((current.year(), current.month()))
    })
}

fn first_of_month(day: NaiveDate) -> NaiveDate {
    day.with_day(1).unwrap_or(day)
}
