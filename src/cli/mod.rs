//! Command-line parsing for the attendance gap-filler.
//!
//! Parsing only produces raw, possibly incomplete options; [`settings_from_args`] turns
//! them into validated run settings, prompting for the gaps in interactive mode.

use std::time::Duration;

use chrono::{Datelike, NaiveDate};
use clap::Parser;
use once_cell::sync::Lazy;
use regex::Regex;

use crate::data::Endpoints;
use crate::data::mayohr::{DEFAULT_AUTH_COMMON_URL, DEFAULT_AUTH_URL, DEFAULT_PORTAL_URL};
use crate::domain::{Credentials, DateRange, RunConfig};
use crate::error::AppError;

pub mod prompt;

static EMAIL_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").expect("email pattern compiles"));

/// Top-level CLI.
#[derive(Debug, Parser)]
#[command(
    name = "apollogize",
    version,
    about = "Fill in forgotten check-in/check-out punches on the MayoHR attendance portal"
)]
pub struct Cli {
    /// Portal login. A bare name gets `--email-domain` appended.
    #[arg(short = 'u', long, env = "APOLLOGIZE_USERNAME")]
    pub username: Option<String>,

    /// Portal password.
    #[arg(short = 'p', long, env = "APOLLOGIZE_PASSWORD", hide_env_values = true)]
    pub password: Option<String>,

    /// First day to reconcile (default: January 1 of the current year).
    #[arg(short = 's', long = "sdt", value_parser = parse_date)]
    pub start: Option<NaiveDate>,

    /// Last day to reconcile (default: today).
    #[arg(short = 'e', long = "edt", value_parser = parse_date)]
    pub end: Option<NaiveDate>,

    /// Company id sent during the ticket check.
    #[arg(short = 'c', long = "company-id", alias = "company_id", env = "APOLLOGIZE_COMPANY_ID")]
    pub company_id: Option<String>,

    /// Punch location id attached to every correction.
    #[arg(
        short = 'l',
        long = "punches-location-id",
        alias = "punches_location_id",
        env = "APOLLOGIZE_PUNCHES_LOCATION_ID"
    )]
    pub punches_location_id: Option<String>,

    /// Domain appended to a username without `@` (e.g. `example.com`).
    #[arg(long, env = "APOLLOGIZE_EMAIL_DOMAIN")]
    pub email_domain: Option<String>,

    /// Prompt for every setting not given on the command line.
    #[arg(short = 'i', long)]
    pub interactive: bool,

    /// Seed for the punch-minute jitter (random when omitted).
    #[arg(long)]
    pub seed: Option<u64>,

    /// Seconds to wait after each punch submission (1 or 2; the portal rate-limits).
    #[arg(long, default_value_t = 2, value_parser = clap::value_parser!(u64).range(1..=2))]
    pub pace_secs: u64,

    /// Resolve days and print the punches without submitting them.
    #[arg(long)]
    pub dry_run: bool,

    #[arg(long, env = "APOLLOGIZE_AUTH_URL", default_value = DEFAULT_AUTH_URL)]
    pub auth_url: String,

    #[arg(long, env = "APOLLOGIZE_AUTH_COMMON_URL", default_value = DEFAULT_AUTH_COMMON_URL)]
    pub auth_common_url: String,

    #[arg(long, env = "APOLLOGIZE_PORTAL_URL", default_value = DEFAULT_PORTAL_URL)]
    pub portal_url: String,
}

/// Everything a run needs, validated.
#[derive(Debug, Clone)]
pub struct RunSettings {
    pub credentials: Credentials,
    pub config: RunConfig,
    pub endpoints: Endpoints,
    pub seed: Option<u64>,
}

/// Validate CLI options, asking `prompter` for anything missing when interactive.
pub fn settings_from_args<P: prompt::Prompt>(
    args: Cli,
    today: NaiveDate,
    prompter: &mut P,
) -> Result<RunSettings, AppError> {
    let default_start = first_of_year(today);
    let domain = args.email_domain.as_deref();

    let (username, password, start, end, company_id, punches_location_id) = if args.interactive {
        let username = match args.username {
            Some(u) => validate_username(&u, domain)?,
            None => prompter.ask("Username (email)", None, |s| validate_username(s, domain).map_err(|e| e.to_string()))?,
        };
        let password = match args.password {
            Some(p) => p,
            None => prompter.ask_secret("Password")?,
        };
        let start = match args.start {
            Some(d) => d,
            None => prompter.ask("Start date", Some(&default_start.to_string()), parse_date)?,
        };
        let end = match args.end {
            Some(d) => d,
            None => prompter.ask("End date", Some(&today.to_string()), parse_date)?,
        };
        let company_id = match args.company_id {
            Some(c) => c,
            None => prompter.ask("Company id", None, non_empty)?,
        };
        let location = match args.punches_location_id {
            Some(l) => l,
            None => prompter.ask("Punches location id", None, non_empty)?,
        };
        (username, password, start, end, company_id, location)
    } else {
        let username = validate_username(&required(args.username, "--username")?, domain)?;
        (
            username,
            required(args.password, "--password")?,
            args.start.unwrap_or(default_start),
            args.end.unwrap_or(today),
            required(args.company_id, "--company-id")?,
            required(args.punches_location_id, "--punches-location-id")?,
        )
    };

    Ok(RunSettings {
        credentials: Credentials { username, password },
        config: RunConfig {
            range: DateRange::new(start, end)?,
            company_id,
            punches_location_id,
            pace: Duration::from_secs(args.pace_secs),
            dry_run: args.dry_run,
        },
        endpoints: Endpoints {
            auth: args.auth_url,
            auth_common: args.auth_common_url,
            portal: args.portal_url,
        },
        seed: args.seed,
    })
}

/// Complete a bare username with `domain`, then require an email shape.
pub fn validate_username(raw: &str, domain: Option<&str>) -> Result<String, AppError> {
    let raw = raw.trim();
    let username = match domain {
        Some(domain) if !raw.contains('@') && !raw.is_empty() => {
            format!("{raw}@{}", domain.trim_start_matches('@'))
        }
        _ => raw.to_string(),
    };

    if !EMAIL_RE.is_match(&username) {
        return Err(AppError::input(format!(
            "Username '{username}' is not an email address."
        )));
    }
    Ok(username)
}

/// Parse a user-supplied date.
pub fn parse_date(s: &str) -> Result<NaiveDate, String> {
    const FMTS: [&str; 3] = ["%Y-%m-%d", "%Y/%m/%d", "%Y%m%d"];
    let s = s.trim();
    for fmt in FMTS {
        if let Ok(d) = NaiveDate::parse_from_str(s, fmt) {
            return Ok(d);
        }
    }
    Err(format!(
        "Invalid date '{s}'. Expected one of: YYYY-MM-DD, YYYY/MM/DD, YYYYMMDD."
    ))
}

fn non_empty(s: &str) -> Result<String, String> {
    let s = s.trim();
    if s.is_empty() {
        Err("A value is required.".to_string())
    } else {
        Ok(s.to_string())
    }
}

fn required(value: Option<String>, flag: &str) -> Result<String, AppError> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .ok_or_else(|| AppError::input(format!("Missing {flag} (or run with --interactive).")))
}

fn first_of_year(day: NaiveDate) -> NaiveDate {
    NaiveDate::from_ymd_opt(day.year(), 1, 1).unwrap_or(day)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::prompt::LinePrompt;
    use crate::error::EXIT_INPUT;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2021, 6, 15).unwrap()
    }

    fn parse(args: &[&str]) -> Cli {
        let mut argv = vec!["apollogize"];
        argv.extend_from_slice(args);
        Cli::parse_from(argv)
    }

    fn no_input() -> LinePrompt<std::io::Cursor<Vec<u8>>, Vec<u8>> {
        LinePrompt::new(std::io::Cursor::new(Vec::new()), Vec::new())
    }

    #[test]
    fn flags_build_settings_with_defaults() {
        let cli = parse(&["-u", "amy", "-p", "pw", "-c", "co", "-l", "loc", "--email-domain", "example.com"]);
        let settings = settings_from_args(cli, today(), &mut no_input()).unwrap();

        assert_eq!(settings.credentials.username, "amy@example.com");
        assert_eq!(settings.config.range.start(), NaiveDate::from_ymd_opt(2021, 1, 1).unwrap());
        assert_eq!(settings.config.range.end(), today());
        assert_eq!(settings.config.pace, Duration::from_secs(2));
        assert_eq!(settings.endpoints, Endpoints::default());
        assert!(!settings.config.dry_run);
    }

    #[test]
    fn underscore_aliases_are_accepted() {
        let cli = parse(&[
            "-u", "amy@example.com", "-p", "pw", "--company_id", "co", "--punches_location_id", "loc",
            "-s", "2021-03-01", "-e", "2021-03-31",
        ]);
        let settings = settings_from_args(cli, today(), &mut no_input()).unwrap();
        assert_eq!(settings.config.company_id, "co");
        assert_eq!(settings.config.punches_location_id, "loc");
        assert_eq!(settings.config.range.end(), NaiveDate::from_ymd_opt(2021, 3, 31).unwrap());
    }

    #[test]
    fn missing_flag_without_interactive_is_an_error() {
        let cli = parse(&["-u", "amy@example.com", "-p", "pw", "-c", "co"]);
        let err = settings_from_args(cli, today(), &mut no_input()).unwrap_err();
        assert_eq!(err.exit_code(), EXIT_INPUT);
        assert!(err.message().contains("--punches-location-id"));
    }

    #[test]
    fn pace_is_limited_to_one_or_two_seconds() {
        let base = ["apollogize", "-u", "amy@example.com", "-p", "pw", "-c", "co", "-l", "loc"];
        for bad in ["0", "3"] {
            let argv = base.iter().copied().chain(["--pace-secs", bad]);
            assert!(Cli::try_parse_from(argv).is_err(), "--pace-secs {bad} should be rejected");
        }

        let argv = base.iter().copied().chain(["--pace-secs", "1"]);
        let cli = Cli::try_parse_from(argv).unwrap();
        let settings = settings_from_args(cli, today(), &mut no_input()).unwrap();
        assert_eq!(settings.config.pace, Duration::from_secs(1));
    }

    #[test]
    fn reversed_range_is_rejected() {
        let cli = parse(&[
            "-u", "amy@example.com", "-p", "pw", "-c", "co", "-l", "loc", "-s", "2021-05-01", "-e", "2021-04-01",
        ]);
        assert!(settings_from_args(cli, today(), &mut no_input()).is_err());
    }

    #[test]
    fn interactive_mode_prompts_for_missing_fields() {
        let input = "not-an-email\namy@example.com\npw\n\n2021-06-10\nco\nloc\n";
        let mut prompter = LinePrompt::new(std::io::Cursor::new(input.as_bytes().to_vec()), Vec::new());
        let settings = settings_from_args(parse(&["-i"]), today(), &mut prompter).unwrap();

        assert_eq!(settings.credentials.username, "amy@example.com");
        assert_eq!(settings.credentials.password, "pw");
        // Empty answer takes the default.
        assert_eq!(settings.config.range.start(), NaiveDate::from_ymd_opt(2021, 1, 1).unwrap());
        assert_eq!(settings.config.range.end(), NaiveDate::from_ymd_opt(2021, 6, 10).unwrap());
        assert_eq!(settings.config.punches_location_id, "loc");
    }

    #[test]
    fn username_validation() {
        assert_eq!(validate_username("bob", Some("@corp.com")).unwrap(), "bob@corp.com");
        assert_eq!(validate_username("bob@corp.com", Some("other.com")).unwrap(), "bob@corp.com");
        assert!(validate_username("bob", None).is_err());
        assert!(validate_username("bob@corp", None).is_err());
    }

    #[test]
    fn malformed_username_is_an_input_error() {
        for raw in ["", "amy@", "@example.com", "amy smith@example.com"] {
            let err = validate_username(raw, None).unwrap_err();
            assert_eq!(err.exit_code(), EXIT_INPUT);
            assert!(err.message().contains("is not an email address"), "{raw}: {}", err.message());
        }
    }

    #[test]
    fn date_formats() {
        let d = NaiveDate::from_ymd_opt(2021, 3, 4).unwrap();
        assert_eq!(parse_date("2021-03-04"), Ok(d));
        assert_eq!(parse_date("2021/03/04"), Ok(d));
        assert_eq!(parse_date("20210304"), Ok(d));
        assert!(parse_date("04/03/2021").is_err());
    }
}
