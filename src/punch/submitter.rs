//! Punch correction submission and response classification.

use std::thread;
use std::time::Duration;

use chrono::{NaiveDate, NaiveDateTime};
use rand::Rng;
use tracing::{error, info};

use crate::data::{AttendanceService, PunchResponse, RecheckinRequest, Session};
use crate::domain::{HourWindow, PunchKind, PunchOutcome};
use crate::punch::PunchClock;

/// Error title fragment the portal returns when the punch is already on file.
pub const DUPLICATE_MARKER: &str = "record of the day has existed";

/// A submitted punch and what became of it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Submission {
    pub attendance_on: NaiveDateTime,
    pub outcome: PunchOutcome,
}

/// Sends one correction per call, then sleeps for the configured pace whatever the
/// outcome.
///
/// Never retries.
pub struct Submitter<'a, S: ?Sized> {
    service: &'a S,
    session: &'a Session,
    punches_location_id: &'a str,
    pace: Duration,
}

impl<'a, S: AttendanceService + ?Sized> Submitter<'a, S> {
    pub fn new(service: &'a S, session: &'a Session, punches_location_id: &'a str, pace: Duration) -> Self {
        Self {
            service,
            session,
            punches_location_id,
            pace,
        }
    }

    pub fn submit<R: Rng>(
        &self,
        clock: &mut PunchClock<R>,
        day: NaiveDate,
        window: HourWindow,
        kind: PunchKind,
    ) -> Submission {
        let attendance_on = clock.generate(day, window, kind);
        let request = RecheckinRequest {
            attendance_on,
            kind,
            is_behalf: false,
            punches_location_id: self.punches_location_id.to_string(),
        };

        let outcome = match self.service.submit_recheckin(self.session, &request) {
            Ok(resp) => classify(&resp),
            Err(err) => PunchOutcome::Fatal {
                reason: err.message().to_string(),
                status: None,
            },
        };

        thread::sleep(self.pace);

        match &outcome {
            PunchOutcome::Success => info!("{attendance_on} {kind} success!"),
            PunchOutcome::BenignDuplicate => info!("{attendance_on} {kind}: punch already on file"),
            PunchOutcome::Fatal { reason, status } => error!(
                "{attendance_on} {kind} (code={}, err={reason})",
                status.map_or_else(|| "-".to_string(), |s| s.to_string())
            ),
        }

        Submission {
            attendance_on,
            outcome,
        }
    }
}

/// Map a raw portal response onto success, benign duplicate, or fatal.
pub fn classify(resp: &PunchResponse) -> PunchOutcome {
    let title = resp.error_title.as_deref().unwrap_or("");

    if (200..300).contains(&resp.status) {
        PunchOutcome::Success
    } else if (400..500).contains(&resp.status) && title.contains(DUPLICATE_MARKER) {
        PunchOutcome::BenignDuplicate
    } else {
        PunchOutcome::Fatal {
            reason: if title.is_empty() {
                format!("unexpected status {}", resp.status)
            } else {
                title.to_string()
            },
            status: Some(resp.status),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::scripted::ScriptedService;
    use crate::error::AppError;

    fn response(status: u16, title: Option<&str>) -> PunchResponse {
        PunchResponse {
            status,
            error_title: title.map(str::to_string),
        }
    }

    #[test]
    fn ok_status_is_success() {
        assert_eq!(classify(&response(200, None)), PunchOutcome::Success);
    }

    #[test]
    fn existing_record_is_benign() {
        let resp = response(400, Some("The record of the day has existed, please check."));
        assert_eq!(classify(&resp), PunchOutcome::BenignDuplicate);
    }

    #[test]
    fn other_client_errors_are_fatal() {
        let resp = response(400, Some("Punch location is invalid"));
        assert_eq!(
            classify(&resp),
            PunchOutcome::Fatal {
                reason: "Punch location is invalid".to_string(),
                status: Some(400),
            }
        );
    }

    #[test]
    fn duplicate_marker_on_server_error_is_still_fatal() {
        let resp = response(500, Some("record of the day has existed"));
        assert!(classify(&resp).is_fatal());
    }

    #[test]
    fn server_error_without_title_is_fatal() {
        assert_eq!(
            classify(&response(500, None)),
            PunchOutcome::Fatal {
                reason: "unexpected status 500".to_string(),
                status: Some(500),
            }
        );
    }

    #[test]
    fn submit_sends_one_request_with_location_and_kind() {
        let service = ScriptedService::new();
        let session = Session::default();
        let submitter = Submitter::new(&service, &session, "loc-1", Duration::ZERO);
        let mut clock = PunchClock::from_seed(Some(3));
        let day = NaiveDate::from_ymd_opt(2021, 3, 2).unwrap();

        let sub = submitter.submit(&mut clock, day, HourWindow::FULL, PunchKind::CheckOut);

        assert_eq!(sub.outcome, PunchOutcome::Success);
        let sent = service.submissions();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].attendance_on, sub.attendance_on);
        assert_eq!(sent[0].kind, PunchKind::CheckOut);
        assert_eq!(sent[0].punches_location_id, "loc-1");
        assert!(!sent[0].is_behalf);
    }

    #[test]
    fn pace_is_applied_after_a_fatal_outcome() {
        let day = NaiveDate::from_ymd_opt(2021, 3, 2).unwrap();
        let service = ScriptedService::new().respond_on(
            day,
            Ok(response(500, Some("Internal error"))),
        );
        let session = Session::default();
        let pace = Duration::from_millis(30);
        let submitter = Submitter::new(&service, &session, "loc-1", pace);
        let mut clock = PunchClock::from_seed(Some(3));

        let started = std::time::Instant::now();
        let sub = submitter.submit(&mut clock, day, HourWindow::FULL, PunchKind::CheckIn);

        assert!(sub.outcome.is_fatal());
        assert!(started.elapsed() >= pace);
    }

    #[test]
    fn transport_error_is_fatal_without_status() {
        let day = NaiveDate::from_ymd_opt(2021, 3, 2).unwrap();
        let service = ScriptedService::new()
            .respond_on(day, Err(AppError::remote("Punch request failed: connection reset")));
        let session = Session::default();
        let submitter = Submitter::new(&service, &session, "loc-1", Duration::ZERO);
        let mut clock = PunchClock::from_seed(Some(3));

        let sub = submitter.submit(&mut clock, day, HourWindow::FULL, PunchKind::CheckIn);
        assert_eq!(
            sub.outcome,
            PunchOutcome::Fatal {
                reason: "Punch request failed: connection reset".to_string(),
                status: None,
            }
        );
    }
}
