//! Leave window adjustment.
//!
//! Removes the hours covered by an approved leave from the working window. The
//! leftover hours are collapsed to a single `[min, max]` window even when the
//! leave sits in the middle of the day.

use chrono::{NaiveDateTime, Timelike};

use crate::domain::HourWindow;

/// Hours of `full` still eligible for a punch once `[leave_start.hour, leave_end.hour]`
/// (inclusive) is taken out. `None` when the leave swallows the whole window.
pub fn adjust(full: HourWindow, leave_start: NaiveDateTime, leave_end: NaiveDateTime) -> Option<HourWindow> {
    let on_leave = leave_start.hour()..=leave_end.hour();
    let mut remaining = full.hours().filter(|h| !on_leave.contains(h));

    let first = remaining.next()?;
    let last = remaining.last().unwrap_or(first);
    HourWindow::new(first, last)
}
