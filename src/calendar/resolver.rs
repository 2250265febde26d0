//! Work calendar resolution.
//!
//! Turns one month of calendar records into the days that need a correction and the
//! hour window each correction may use.

use chrono::NaiveDate;
use tracing::info;

use crate::calendar::leave;
use crate::domain::{CalendarDay, HourWindow};

/// Lazily yield `(day, window)` for every scheduled workday in `[since, now]`.
///
/// Days without a schedule (or with an empty work-on-time marker) are not workdays and
/// are skipped. Days fully covered by leave are skipped too. The iterator borrows
/// `records`, so calling this again over the same slice restarts the pass.
pub fn resolve(
    records: &[CalendarDay],
    since: NaiveDate,
    now: NaiveDate,
) -> impl Iterator<Item = (NaiveDate, HourWindow)> + '_ {
    records
        .iter()
        .filter(move |day| day.is_scheduled_workday() && since <= day.date && day.date <= now)
        .filter_map(|day| {
            let Some(leave) = day.leave else {
                return Some((day.date, HourWindow::FULL));
            };

            let window = leave::adjust(HourWindow::FULL, leave.start, leave.end)?;
            info!(
                "leave on {}, start={}, end={}",
                day.date,
                leave.start.time(),
                leave.end.time()
            );
            Some((day.date, window))
        })
}
