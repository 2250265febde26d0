//! End-of-run output.
//!
//! Either a success confirmation or the list of punches that must be checked by hand.

use crate::app::pipeline::{RunReport, UnfetchedMonth};
use crate::domain::{FailureRecord, RunConfig};

/// Format the run summary printed when the process exits.
pub fn format_run_summary(report: &RunReport, config: &RunConfig) -> String {
    let mut out = String::new();

    out.push_str("=== apollogize ===\n");
    out.push_str(&format!(
        "Range: {} .. {}\n",
        config.range.start(),
        config.range.end()
    ));

    if config.dry_run {
        out.push_str(&format!("Dry run: {} day(s) would be reconciled\n", report.planned.len()));
        for p in &report.planned {
            out.push_str(&format!(
                "  {}  window={}  in={}  out={}\n",
                p.date,
                p.window,
                p.check_in.time(),
                p.check_out.time()
            ));
        }
        return out;
    }

    out.push_str(&format!(
        "Days reconciled: {} | already on file: {}\n",
        report.reconciled_days, report.duplicates
    ));

    if report.success() {
        out.push_str("Success!\n");
        return out;
    }
    if !report.failures.is_empty() {
        out.push_str(&format_failures(&report.failures));
    }
    if !report.unfetched_months.is_empty() {
        out.push_str(&format_unfetched_months(&report.unfetched_months));
    }
    out
}

/// Months that were never visited because their calendar could not be loaded.
pub fn format_unfetched_months(months: &[UnfetchedMonth]) -> String {
    let mut out = String::from("Calendar unavailable, re-run these months:\n");
    for m in months {
        out.push_str(&format!("  {}-{:02}  {}\n", m.year, m.month, m.error));
    }
    out
}

/// One line per failed punch: date, kind, status code, error.
pub fn format_failures(failures: &[FailureRecord]) -> String {
    let mut out = String::new();
    out.push_str(&format!(
        "Please double check the following {} punch(es):\n",
        failures.len()
    ));
    for f in failures {
        let code = f.status.map_or_else(|| "-".to_string(), |s| s.to_string());
        out.push_str(&format!(
            "  {:<10}  {:<9}  code={:<3}  {}\n",
            f.date.to_string(),
            f.kind.label(),
            code,
            f.error
        ));
    }
    out
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use chrono::NaiveDate;

    use super::*;
    use crate::domain::{DateRange, PunchKind};

    fn config() -> RunConfig {
        let d = |day| NaiveDate::from_ymd_opt(2021, 3, day).unwrap();
        RunConfig {
            range: DateRange::new(d(1), d(31)).unwrap(),
            company_id: "co".to_string(),
            punches_location_id: "loc".to_string(),
            pace: Duration::ZERO,
            dry_run: false,
        }
    }

    #[test]
    fn clean_run_says_success() {
        let report = RunReport {
            reconciled_days: 3,
            ..RunReport::default()
        };
        let text = format_run_summary(&report, &config());
        assert!(text.contains("Days reconciled: 3"));
        assert!(text.contains("Success!"));
    }

    #[test]
    fn failures_are_listed_with_code_and_error() {
        let report = RunReport {
            failures: vec![
                FailureRecord {
                    date: NaiveDate::from_ymd_opt(2021, 3, 2).unwrap(),
                    kind: PunchKind::CheckIn,
                    status: Some(500),
                    error: "Internal error".to_string(),
                },
                FailureRecord {
                    date: NaiveDate::from_ymd_opt(2021, 3, 4).unwrap(),
                    kind: PunchKind::CheckOut,
                    status: None,
                    error: "connection reset".to_string(),
                },
            ],
            ..RunReport::default()
        };
        let text = format_run_summary(&report, &config());
        assert!(!text.contains("Success!"));
        assert!(text.contains("2 punch(es)"));
        assert!(text.contains("2021-03-02  check-in   code=500  Internal error"));
        assert!(text.contains("check-out  code=-    connection reset"));
        assert!(!text.contains("Calendar unavailable"));
    }

    #[test]
    fn unfetched_months_are_listed_even_without_punch_failures() {
        let report = RunReport {
            reconciled_days: 4,
            unfetched_months: vec![UnfetchedMonth {
                year: 2021,
                month: 2,
                error: "Calendar request for 2021-02 failed with status 502 Bad Gateway.".to_string(),
            }],
            ..RunReport::default()
        };
        let text = format_run_summary(&report, &config());
        assert!(!text.contains("Success!"));
        assert!(!text.contains("punch(es)"));
        assert!(text.contains("re-run these months"));
        assert!(text.contains("  2021-02  Calendar request for 2021-02 failed"));
    }
}
