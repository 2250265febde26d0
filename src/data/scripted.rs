//! In-memory `AttendanceService` for tests.
//!
//! Calendar months and punch responses are scripted up front; every call is recorded
//! so tests can assert on ordering and on what was never called.

use std::cell::RefCell;
use std::collections::{HashMap, VecDeque};

use chrono::NaiveDate;

use crate::data::{AttendanceService, PunchResponse, RecheckinRequest, Session};
use crate::domain::{CalendarDay, Credentials};
use crate::error::AppError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    Authenticate,
    FetchCalendar(i32, u32),
    Submit(RecheckinRequest),
}

#[derive(Default)]
pub struct ScriptedService {
    reject_auth: bool,
    months: HashMap<(i32, u32), Vec<CalendarDay>>,
    failing_months: HashMap<(i32, u32), AppError>,
    /// Per-day response overrides, consumed in order. Unlisted punches get 200.
    responses: RefCell<HashMap<NaiveDate, VecDeque<Result<PunchResponse, AppError>>>>,
    calls: RefCell<Vec<Call>>,
}

impl ScriptedService {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn rejecting_auth() -> Self {
        Self {
            reject_auth: true,
            ..Self::default()
        }
    }

    pub fn with_month(mut self, year: i32, month: u32, days: Vec<CalendarDay>) -> Self {
        self.months.insert((year, month), days);
        self
    }

    pub fn failing_month(mut self, year: i32, month: u32, err: AppError) -> Self {
        self.failing_months.insert((year, month), err);
        self
    }

    pub fn respond_on(self, day: NaiveDate, response: Result<PunchResponse, AppError>) -> Self {
        self.responses
            .borrow_mut()
            .entry(day)
            .or_default()
            .push_back(response);
        self
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.borrow().clone()
    }

    pub fn submissions(&self) -> Vec<RecheckinRequest> {
        self.calls
            .borrow()
            .iter()
            .filter_map(|c| match c {
                Call::Submit(req) => Some(req.clone()),
                _ => None,
            })
            .collect()
    }
}

impl AttendanceService for ScriptedService {
    fn authenticate(&self, _credentials: &Credentials, _company_id: &str) -> Result<Session, AppError> {
        self.calls.borrow_mut().push(Call::Authenticate);
        if self.reject_auth {
            return Err(AppError::auth("Wrong username or password! (status 400 Bad Request)"));
        }
        Ok(Session::default())
    }

    fn fetch_calendar(&self, _session: &Session, year: i32, month: u32) -> Result<Vec<CalendarDay>, AppError> {
        self.calls.borrow_mut().push(Call::FetchCalendar(year, month));
        if let Some(err) = self.failing_months.get(&(year, month)) {
            return Err(err.clone());
        }
        Ok(self.months.get(&(year, month)).cloned().unwrap_or_default())
    }

    fn submit_recheckin(&self, _session: &Session, request: &RecheckinRequest) -> Result<PunchResponse, AppError> {
        self.calls.borrow_mut().push(Call::Submit(request.clone()));
        let day = request.attendance_on.date();
        self.responses
            .borrow_mut()
            .get_mut(&day)
            .and_then(VecDeque::pop_front)
            .unwrap_or(Ok(PunchResponse {
                status: 200,
                error_title: None,
            }))
    }
}
