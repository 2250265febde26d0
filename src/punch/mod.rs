//! Punch generation and submission.

pub mod clock;
pub mod submitter;

pub use clock::PunchClock;
pub use submitter::{Submission, Submitter, classify};
