//! Shared domain types.
//!
//! Everything here is transient: it lives for one invocation and is never persisted.

use std::fmt;
use std::time::Duration;

use chrono::{NaiveDate, NaiveDateTime};

use crate::error::AppError;

/// First hour (UTC) eligible for a punch. 10:00 in the portal's local time.
pub const WORK_HOUR_MIN: u32 = 2;

/// Last hour (UTC) eligible for a punch. 19:00 in the portal's local time.
pub const WORK_HOUR_MAX: u32 = 11;

/// An inclusive pair of hours inside the working-hours domain.
///
/// Invariant: `WORK_HOUR_MIN <= start <= end <= WORK_HOUR_MAX`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct HourWindow {
    start: u32,
    end: u32,
}

impl HourWindow {
    /// The whole working day.
    pub const FULL: HourWindow = HourWindow {
        start: WORK_HOUR_MIN,
        end: WORK_HOUR_MAX,
    };

    /// Returns `None` when the pair is out of order or leaves the domain.
    pub fn new(start: u32, end: u32) -> Option<Self> {
        let in_domain = |h: u32| (WORK_HOUR_MIN..=WORK_HOUR_MAX).contains(&h);
        (start <= end && in_domain(start) && in_domain(end)).then_some(Self { start, end })
    }

    pub fn start(self) -> u32 {
        self.start
    }

    pub fn end(self) -> u32 {
        self.end
    }

    pub fn hours(self) -> impl Iterator<Item = u32> {
        self.start..=self.end
    }
}

impl fmt::Display for HourWindow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02}h-{:02}h", self.start, self.end)
    }
}

/// Which half of the day a punch records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PunchKind {
    CheckIn,
    CheckOut,
}

impl PunchKind {
    /// `AttendanceType` value expected by the portal.
    pub fn attendance_type(self) -> u8 {
        match self {
            PunchKind::CheckIn => 1,
            PunchKind::CheckOut => 2,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            PunchKind::CheckIn => "check-in",
            PunchKind::CheckOut => "check-out",
        }
    }
}

impl fmt::Display for PunchKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Classified result of one punch submission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PunchOutcome {
    Success,
    /// The portal already holds this punch; treated as success.
    BenignDuplicate,
    /// `status` is `None` when the request never got an HTTP response.
    Fatal { reason: String, status: Option<u16> },
}

impl PunchOutcome {
    pub fn is_fatal(&self) -> bool {
        matches!(self, PunchOutcome::Fatal { .. })
    }
}

/// A punch that needs manual review after the run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FailureRecord {
    pub date: NaiveDate,
    pub kind: PunchKind,
    pub status: Option<u16>,
    pub error: String,
}

/// Inclusive `[start, end]` span of calendar dates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateRange {
    start: NaiveDate,
    end: NaiveDate,
}

impl DateRange {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Result<Self, AppError> {
        if start > end {
            return Err(AppError::input(format!(
                "Start date {start} is after end date {end}."
            )));
        }
        Ok(Self { start, end })
    }

    pub fn start(&self) -> NaiveDate {
        self.start
    }

    pub fn end(&self) -> NaiveDate {
        self.end
    }

    pub fn contains(&self, day: NaiveDate) -> bool {
        self.start <= day && day <= self.end
    }
}

/// Approved leave overlapping a workday, normalized to the reference timezone.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LeaveInterval {
    pub start: NaiveDateTime,
    pub end: NaiveDateTime,
}

/// One day of the employee calendar as returned by the portal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CalendarDay {
    pub date: NaiveDate,
    /// `Some` only on scheduled workdays.
    pub schedule: Option<ShiftSchedule>,
    pub leave: Option<LeaveInterval>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShiftSchedule {
    /// Raw "work on time" marker; the day qualifies only when present.
    pub work_on_time: Option<String>,
}

impl CalendarDay {
    pub fn is_scheduled_workday(&self) -> bool {
        self.schedule
            .as_ref()
            .is_some_and(|s| s.work_on_time.is_some())
    }
}

#[derive(Clone)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"***")
            .finish()
    }
}

/// Tenant and pacing settings for one run.
///
/// This is derived from CLI flags (plus defaults).
#[derive(Debug, Clone)]
pub struct RunConfig {
    pub range: DateRange,
    pub company_id: String,
    pub punches_location_id: String,
    /// Sleep after every punch submission, whatever the outcome.
    pub pace: Duration,
    /// Resolve and generate punches without submitting them.
    pub dry_run: bool,
}
