//! MayoHR portal integration (auth, employee calendar, punch corrections).

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use reqwest::Url;
use reqwest::blocking::{Client, ClientBuilder, RequestBuilder};
use reqwest::cookie::Jar;
use reqwest::header::COOKIE;
use serde::Deserialize;
use tracing::{debug, warn};

use crate::data::{AttendanceService, PunchResponse, RecheckinRequest, Session};
use crate::domain::{CalendarDay, Credentials, LeaveInterval, ShiftSchedule};
use crate::error::AppError;

pub const DEFAULT_AUTH_URL: &str = "https://auth.mayohr.com";
pub const DEFAULT_AUTH_COMMON_URL: &str = "https://authcommon.mayohr.com";
pub const DEFAULT_PORTAL_URL: &str = "https://pt.mayohr.com";

const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Base URLs of the three MayoHR hosts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoints {
    pub auth: String,
    pub auth_common: String,
    pub portal: String,
}

impl Default for Endpoints {
    fn default() -> Self {
        Self {
            auth: DEFAULT_AUTH_URL.to_string(),
            auth_common: DEFAULT_AUTH_COMMON_URL.to_string(),
            portal: DEFAULT_PORTAL_URL.to_string(),
        }
    }
}

impl Endpoints {
    fn token(&self) -> String {
        format!("{}/Token", self.auth.trim_end_matches('/'))
    }

    fn check_ticket(&self) -> String {
        format!("{}/api/auth/checkticket", self.auth_common.trim_end_matches('/'))
    }

    fn scheduling(&self) -> String {
        format!("{}/api/EmployeeCalendars/scheduling", self.portal.trim_end_matches('/'))
    }

    fn recheckin(&self) -> String {
        format!("{}/api/reCheckInApproval", self.portal.trim_end_matches('/'))
    }
}

pub struct MayoHrClient {
    client: Client,
    endpoints: Endpoints,
    builder: fn() -> ClientBuilder,
}

impl MayoHrClient {
    pub fn new(endpoints: Endpoints) -> Result<Self, AppError> {
        Self::with_builder(endpoints, Client::builder)
    }

    fn with_builder(endpoints: Endpoints, builder: fn() -> ClientBuilder) -> Result<Self, AppError> {
        let client = builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| AppError::remote(format!("Failed to build HTTP client: {e}")))?;
        Ok(Self {
            client,
            endpoints,
            builder,
        })
    }

    /// Client for the credential exchange; every cookie it receives lands in `jar`.
    fn session_client(&self, jar: Arc<Jar>) -> Result<Client, AppError> {
        (self.builder)()
            .timeout(REQUEST_TIMEOUT)
            .cookie_provider(jar)
            .build()
            .map_err(|e| AppError::auth(format!("Failed to build HTTP client: {e}")))
    }

    fn with_session(&self, req: RequestBuilder, url: &Url, session: &Session) -> RequestBuilder {
        match session.cookie_header(url) {
            Some(cookies) => req.header(COOKIE, cookies),
            None => req,
        }
    }
}

fn parse_url(raw: &str) -> Result<Url, AppError> {
    Url::parse(raw).map_err(|e| AppError::input(format!("Invalid portal URL '{raw}': {e}")))
}

impl AttendanceService for MayoHrClient {
    fn authenticate(&self, credentials: &Credentials, company_id: &str) -> Result<Session, AppError> {
        let jar = Arc::new(Jar::default());
        let client = self.session_client(jar.clone())?;

        let resp = client
            .post(self.endpoints.token())
            .form(&[
                ("username", credentials.username.as_str()),
                ("password", credentials.password.as_str()),
                ("grant_type", "password"),
            ])
            .send()
            .map_err(|e| AppError::auth(format!("Token request failed: {e}")))?;

        if resp.status().as_u16() != 200 {
            return Err(AppError::auth(format!(
                "Wrong username or password! (status {})",
                resp.status()
            )));
        }

        let token: TokenResponse = resp
            .json()
            .map_err(|e| AppError::auth(format!("Failed to parse token response: {e}")))?;

        let resp = client
            .get(self.endpoints.check_ticket())
            .query(&[("code", token.code.as_str()), ("CompanyId", company_id)])
            .send()
            .map_err(|e| AppError::auth(format!("Ticket check failed: {e}")))?;

        if !resp.status().is_success() {
            return Err(AppError::auth(format!(
                "Ticket check rejected with status {}.",
                resp.status()
            )));
        }
        debug!("session established");

        Ok(Session::new(jar))
    }

    fn fetch_calendar(&self, session: &Session, year: i32, month: u32) -> Result<Vec<CalendarDay>, AppError> {
        let url = parse_url(&self.endpoints.scheduling())?;
        let req = self
            .client
            .get(url.clone())
            .query(&[("year", year.to_string()), ("month", month.to_string())]);

        let resp = self
            .with_session(req, &url, session)
            .send()
            .map_err(|e| AppError::remote(format!("Calendar request for {year}-{month:02} failed: {e}")))?;

        if !resp.status().is_success() {
            return Err(AppError::remote(format!(
                "Calendar request for {year}-{month:02} failed with status {}.",
                resp.status()
            )));
        }

        let body = resp
            .text()
            .map_err(|e| AppError::remote(format!("Failed to read calendar response: {e}")))?;
        parse_calendar(&body)
    }

    fn submit_recheckin(&self, session: &Session, request: &RecheckinRequest) -> Result<PunchResponse, AppError> {
        let attendance_on = request.attendance_on.format(TIMESTAMP_FORMAT).to_string();
        let attendance_type = request.kind.attendance_type().to_string();
        let is_behalf = request.is_behalf.to_string();

        let url = parse_url(&self.endpoints.recheckin())?;
        let req = self.client.post(url.clone()).form(&[
            ("AttendanceOn", attendance_on.as_str()),
            ("AttendanceType", attendance_type.as_str()),
            ("IsBehalf", is_behalf.as_str()),
            ("PunchesLocationId", request.punches_location_id.as_str()),
        ]);

        let resp = self
            .with_session(req, &url, session)
            .send()
            .map_err(|e| AppError::remote(format!("Punch request failed: {e}")))?;

        let status = resp.status().as_u16();
        // An unreadable body still leaves a usable status code.
        let body = resp.text().unwrap_or_default();

        Ok(PunchResponse {
            status,
            error_title: error_title(&body),
        })
    }
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    code: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct SchedulingResponse {
    data: SchedulingData,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct SchedulingData {
    #[serde(default)]
    calendars: Vec<RawCalendarDay>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct RawCalendarDay {
    date: String,
    #[serde(default)]
    shift_schedule: Option<RawShiftSchedule>,
    #[serde(default)]
    leave_sheets: Option<Vec<RawLeaveSheet>>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct RawShiftSchedule {
    #[serde(default)]
    work_on_time: Option<serde_json::Value>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct RawLeaveSheet {
    leave_start_datetime: String,
    leave_end_datetime: String,
}

/// Parse a scheduling response body. Records that cannot be understood are dropped.
pub fn parse_calendar(body: &str) -> Result<Vec<CalendarDay>, AppError> {
    let resp: SchedulingResponse = serde_json::from_str(body)
        .map_err(|e| AppError::remote(format!("Failed to parse calendar response: {e}")))?;

    Ok(resp
        .data
        .calendars
        .into_iter()
        .filter_map(to_calendar_day)
        .collect())
}

fn to_calendar_day(raw: RawCalendarDay) -> Option<CalendarDay> {
    let Some(date) = parse_calendar_date(&raw.date) else {
        warn!("skipping calendar record with unreadable date '{}'", raw.date);
        return None;
    };

    let schedule = raw.shift_schedule.map(|s| ShiftSchedule {
        work_on_time: s.work_on_time.map(|v| match v {
            serde_json::Value::String(s) => s,
            other => other.to_string(),
        }),
    });

    let leave = match raw.leave_sheets.as_deref().and_then(<[RawLeaveSheet]>::first) {
        None => None,
        Some(sheet) => {
            let start = parse_timestamp_utc(&sheet.leave_start_datetime);
            let end = parse_timestamp_utc(&sheet.leave_end_datetime);
            let (Some(start), Some(end)) = (start, end) else {
                warn!(
                    "skipping {date}: unreadable leave interval '{}' - '{}'",
                    sheet.leave_start_datetime, sheet.leave_end_datetime
                );
                return None;
            };
            Some(LeaveInterval { start, end })
        }
    };

    Some(CalendarDay {
        date,
        schedule,
        leave,
    })
}

/// Calendar date as written, ignoring any offset.
fn parse_calendar_date(s: &str) -> Option<NaiveDate> {
    let s = s.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.date_naive());
    }
    s.get(..10)
        .and_then(|head| NaiveDate::parse_from_str(head, "%Y-%m-%d").ok())
}

/// Timestamp normalized to UTC, the timezone the working-hours domain is expressed in.
/// Strings without an offset are taken as UTC already.
fn parse_timestamp_utc(s: &str) -> Option<NaiveDateTime> {
    let s = s.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.naive_utc());
    }
    const FMTS: [&str; 3] = ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S", TIMESTAMP_FORMAT];
    for fmt in FMTS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(s, fmt) {
            return Some(dt);
        }
    }
    None
}

fn error_title(body: &str) -> Option<String> {
    let value: serde_json::Value = serde_json::from_str(body).ok()?;
    value
        .pointer("/Error/Title")
        .and_then(serde_json::Value::as_str)
        .map(str::to_string)
}
