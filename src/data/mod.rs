//! Remote attendance portal access.
//!
//! The reconciliation engine only talks to the portal through [`AttendanceService`],
//! which covers the three calls it needs: credential exchange, one month of calendar
//! records, and one punch correction.

use std::fmt;
use std::sync::Arc;

use chrono::NaiveDateTime;
use reqwest::Url;
use reqwest::cookie::{CookieStore, Jar};
use reqwest::header::HeaderValue;

use crate::domain::{CalendarDay, Credentials, PunchKind};
use crate::error::AppError;

pub mod mayohr;

#[cfg(test)]
pub(crate) mod scripted;

pub use mayohr::{Endpoints, MayoHrClient};

/// Cookie jar filled by the credential exchange.
///
/// Read-only once issued. Cookies keep the `Domain`/`Path` scope the portal gave them,
/// so each request only carries the cookies meant for its host.
#[derive(Clone, Default)]
pub struct Session {
    jar: Arc<Jar>,
}

impl Session {
    pub fn new(jar: Arc<Jar>) -> Self {
        Self { jar }
    }

    /// `Cookie` header value for a request to `url`, if any cookie applies.
    pub fn cookie_header(&self, url: &Url) -> Option<HeaderValue> {
        self.jar.cookies(url)
    }
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session").finish_non_exhaustive()
    }
}

/// One punch correction as sent to the portal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecheckinRequest {
    pub attendance_on: NaiveDateTime,
    pub kind: PunchKind,
    /// Always `false`: corrections are filed for the signed-in employee.
    pub is_behalf: bool,
    pub punches_location_id: String,
}

/// Raw answer to a punch correction, before classification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PunchResponse {
    pub status: u16,
    /// `Error.Title` from the response body, when present.
    pub error_title: Option<String>,
}

pub trait AttendanceService {
    /// Exchange credentials for a session. Any rejection is an authentication error.
    fn authenticate(&self, credentials: &Credentials, company_id: &str) -> Result<Session, AppError>;

    /// Calendar records for one month.
    fn fetch_calendar(&self, session: &Session, year: i32, month: u32) -> Result<Vec<CalendarDay>, AppError>;

    /// Submit one correction. `Err` means no HTTP response was obtained.
    fn submit_recheckin(&self, session: &Session, request: &RecheckinRequest) -> Result<PunchResponse, AppError>;
}
