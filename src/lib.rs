//! `apollogize` library crate.
//!
//! The binary (`apollogize`) is a thin wrapper around this library so that:
//!
//! - the gap-fill engine is testable without a network or a terminal
//! - the portal client sits behind a trait and can be swapped per tenant

pub mod app;
pub mod calendar;
pub mod cli;
pub mod data;
pub mod domain;
pub mod error;
pub mod punch;
pub mod report;
