//! Domain types used throughout the reconciliation run.
//!
//! This module defines:
//!
//! - the working-hours window (`HourWindow`) and punch kinds (`PunchKind`)
//! - calendar input records (`CalendarDay`, `LeaveInterval`)
//! - run outputs (`PunchOutcome`, `FailureRecord`) and run settings (`RunConfig`)

pub mod types;

pub use types::*;
