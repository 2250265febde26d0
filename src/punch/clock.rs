//! Punch timestamp generation.
//!
//! Check-ins land on the window's first hour at minute 0-30, check-outs on its last
//! hour at minute 31-59. Keeping the two minute ranges apart means a single-hour
//! window still yields a check-out after the check-in.

use std::ops::RangeInclusive;

use chrono::{Duration, NaiveDate, NaiveDateTime, NaiveTime};
use rand::Rng;
use rand::rngs::StdRng;
use rand::SeedableRng;

use crate::domain::{HourWindow, PunchKind};

pub const CHECK_IN_MINUTES: RangeInclusive<u32> = 0..=30;
pub const CHECK_OUT_MINUTES: RangeInclusive<u32> = 31..=59;

/// Generates human-looking punch times from an injected random source.
#[derive(Debug, Clone)]
pub struct PunchClock<R> {
    rng: R,
}

impl PunchClock<StdRng> {
    /// Deterministic clock when `seed` is given, entropy-seeded otherwise.
    pub fn from_seed(seed: Option<u64>) -> Self {
        let rng = match seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Self::new(rng)
    }
}

impl<R: Rng> PunchClock<R> {
    pub fn new(rng: R) -> Self {
        Self { rng }
    }

    /// Timestamp in the portal's reference timezone (UTC).
    pub fn generate(&mut self, day: NaiveDate, window: HourWindow, kind: PunchKind) -> NaiveDateTime {
        let (hour, minutes) = match kind {
            PunchKind::CheckIn => (window.start(), CHECK_IN_MINUTES),
            PunchKind::CheckOut => (window.end(), CHECK_OUT_MINUTES),
        };
        let minute = self.rng.gen_range(minutes);

        NaiveDateTime::new(day, NaiveTime::MIN)
            + Duration::hours(i64::from(hour))
            + Duration::minutes(i64::from(minute))
    }
}
