//! The reconciliation pipeline shared by the flag-driven and interactive front-ends.
//!
//! authenticate -> per month: fetch calendar -> resolve days -> per day: check-in, check-out
//!
//! Everything is strictly sequential: one request in flight, check-in before check-out.

use chrono::{NaiveDate, NaiveDateTime};
use rand::Rng;
use tracing::{error, info};

use crate::calendar::{months_in, resolve};
use crate::data::{AttendanceService, Session};
use crate::domain::{Credentials, FailureRecord, HourWindow, PunchKind, PunchOutcome, RunConfig};
use crate::error::AppError;
use crate::punch::{PunchClock, Submitter};

/// Progress of a single day through its two punches.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DayState {
    Pending,
    CheckInSubmitted,
    CheckOutSubmitted,
    Done,
    Failed,
}

impl DayState {
    /// A fatal outcome pins the day to `Failed`, but the next punch is still sent.
    fn after(self, outcome: &PunchOutcome) -> DayState {
        match (self, outcome) {
            (DayState::Failed, _) | (_, PunchOutcome::Fatal { .. }) => DayState::Failed,
            (DayState::Pending, _) => DayState::CheckInSubmitted,
            (DayState::CheckInSubmitted, _) => DayState::CheckOutSubmitted,
            (other, _) => other,
        }
    }

    fn finish(self) -> DayState {
        match self {
            DayState::CheckOutSubmitted => DayState::Done,
            other => other,
        }
    }
}

/// Punches a dry run would have submitted for one day.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlannedDay {
    pub date: NaiveDate,
    pub window: HourWindow,
    pub check_in: NaiveDateTime,
    pub check_out: NaiveDateTime,
}

/// Outcome of a whole run.
#[derive(Debug, Clone, Default)]
pub struct RunReport {
    pub failures: Vec<FailureRecord>,
    /// Days whose two punches both went through (or were already on file).
    pub reconciled_days: usize,
    pub duplicates: usize,
    pub planned: Vec<PlannedDay>,
    /// Months whose calendar could not be fetched, with the error. Their days were not visited.
    pub unfetched_months: Vec<UnfetchedMonth>,
}

impl RunReport {
    pub fn success(&self) -> bool {
        self.failures.is_empty() && self.unfetched_months.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnfetchedMonth {
    pub year: i32,
    pub month: u32,
    pub error: String,
}

/// Drives the resolver and submitter over every month of the configured range.
pub struct Reconciler<'a, S: ?Sized, R> {
    service: &'a S,
    session: &'a Session,
    config: &'a RunConfig,
    clock: PunchClock<R>,
    today: NaiveDate,
}

impl<'a, S: AttendanceService + ?Sized, R: Rng> Reconciler<'a, S, R> {
    /// `today` bounds corrections to days that have already happened.
    pub fn new(
        service: &'a S,
        session: &'a Session,
        config: &'a RunConfig,
        clock: PunchClock<R>,
        today: NaiveDate,
    ) -> Self {
        Self {
            service,
            session,
            config,
            clock,
            today,
        }
    }

    /// Calendar fetch failures are recorded per month; the run carries on with the next one.
    pub fn run(&mut self) -> RunReport {
        let config = self.config;
        let range = config.range;
        let submitter = Submitter::new(self.service, self.session, &config.punches_location_id, config.pace);
        let mut report = RunReport::default();

        for (year, month) in months_in(&range) {
            let records = match self.service.fetch_calendar(self.session, year, month) {
                Ok(records) => records,
                Err(err) => {
                    error!("{year}-{month:02}: calendar unavailable, skipping month ({err})");
                    report.unfetched_months.push(UnfetchedMonth {
                        year,
                        month,
                        error: err.message().to_string(),
                    });
                    continue;
                }
            };
            let days: Vec<(NaiveDate, HourWindow)> = resolve(&records, range.start(), self.today)
                .filter(|(day, _)| range.contains(*day))
                .collect();
            info!("{year}-{month:02}: {} day(s) to reconcile", days.len());

            for (day, window) in days {
                if config.dry_run {
                    report.planned.push(self.plan_day(day, window));
                    continue;
                }
                if self.reconcile_day(&submitter, day, window, &mut report) == DayState::Done {
                    report.reconciled_days += 1;
                }
            }
        }

        report
    }

    fn reconcile_day(
        &mut self,
        submitter: &Submitter<'_, S>,
        day: NaiveDate,
        window: HourWindow,
        report: &mut RunReport,
    ) -> DayState {
        let mut state = DayState::Pending;

        for kind in [PunchKind::CheckIn, PunchKind::CheckOut] {
            let submission = submitter.submit(&mut self.clock, day, window, kind);
            match &submission.outcome {
                PunchOutcome::Success => {}
                PunchOutcome::BenignDuplicate => report.duplicates += 1,
                PunchOutcome::Fatal { reason, status } => report.failures.push(FailureRecord {
                    date: day,
                    kind,
                    status: *status,
                    error: reason.clone(),
                }),
            }
            state = state.after(&submission.outcome);
        }

        let state = state.finish();
        match state {
            DayState::Done => info!("Apollogize successfully {day}"),
            _ => error!("{day} needs manual review"),
        }
        state
    }

    fn plan_day(&mut self, day: NaiveDate, window: HourWindow) -> PlannedDay {
        let check_in = self.clock.generate(day, window, PunchKind::CheckIn);
        let check_out = self.clock.generate(day, window, PunchKind::CheckOut);
        info!("[dry-run] {day}: would punch {} and {}", check_in.time(), check_out.time());
        PlannedDay {
            date: day,
            window,
            check_in,
            check_out,
        }
    }
}

/// Authenticate, then reconcile the configured range.
///
/// An authentication failure returns before any calendar or punch call is made.
pub fn run_reconciliation<S, R>(
    service: &S,
    credentials: &Credentials,
    config: &RunConfig,
    clock: PunchClock<R>,
    today: NaiveDate,
) -> Result<RunReport, AppError>
where
    S: AttendanceService + ?Sized,
    R: Rng,
{
    let session = service.authenticate(credentials, &config.company_id)?;
    info!("signed in as {}", credentials.username);

    Ok(Reconciler::new(service, &session, config, clock, today).run())
}
