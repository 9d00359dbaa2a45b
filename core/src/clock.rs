//! Run clock - owns the single reference "now" of a run.
//!
//! Every timestamp in every artifact is bounded by this instant.
//! It is captured once when the run starts (or fixed by configuration),
//! never re-read from the system mid-run.

use chrono::{Datelike, Duration, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

use crate::types::Year;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct RunClock {
    now: NaiveDateTime,
}

impl RunClock {
    pub fn new(now: NaiveDateTime) -> Self {
        Self { now }
    }

    /// Capture the local wall clock, truncated to whole seconds.
    pub fn system() -> Self {
        let now = chrono::Local::now().naive_local();
        Self::new(now - Duration::nanoseconds(now.and_utc().timestamp_subsec_nanos() as i64))
    }

    pub fn now(&self) -> NaiveDateTime {
        self.now
    }

    pub fn today(&self) -> NaiveDate {
        self.now.date()
    }

    pub fn current_year(&self) -> Year {
        self.now.year()
    }

    pub fn days_ago(&self, days: i64) -> NaiveDateTime {
        self.now - Duration::days(days)
    }

    pub fn days_ahead(&self, days: i64) -> NaiveDateTime {
        self.now + Duration::days(days)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn system_clock_has_no_subsecond_part() {
        let clock = RunClock::system();
        assert_eq!(clock.now().and_utc().timestamp_subsec_nanos(), 0);
    }

    #[test]
    fn offsets_are_relative_to_fixed_now() {
        let now = NaiveDate::from_ymd_opt(2025, 3, 10)
            .unwrap()
            .and_hms_opt(9, 30, 0)
            .unwrap();
        let clock = RunClock::new(now);
        assert_eq!(clock.days_ago(10).date(), NaiveDate::from_ymd_opt(2025, 2, 28).unwrap());
        assert_eq!(clock.current_year(), 2025);
    }
}
