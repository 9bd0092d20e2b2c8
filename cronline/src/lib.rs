//! cronline — next and previous occurrences of a Vixie-cron line.
//!
//! A schedule is parsed once into the set of values each field allows and is
//! then asked for the nearest matching instant strictly after or before a
//! reference. Day-of-month and day-of-week follow cron's rule: when both are
//! restricted, a day matching either one qualifies.
//!
//! # Examples
//!
//! ```
//! use cronline::CronSchedule;
//! use jiff::civil::date;
//!
//! let schedule: CronSchedule = "0 12 * * mon".parse().unwrap();
//! let next = schedule.next(date(2026, 6, 3).at(9, 0, 0, 0)).unwrap();
//! assert_eq!(next, date(2026, 6, 8).at(12, 0, 0, 0));
//! ```

pub mod days;
pub mod display;
pub mod error;
pub mod field;
pub mod normalize;
pub mod nudge;
pub mod options;
pub mod schedule;

pub use error::{CronError, Span};
pub use field::{FieldKind, ScheduleField};
pub use nudge::{Direction, Occurrences};
pub use options::CronOptions;
pub use schedule::{CronSchedule, Fields};

use jiff::civil::DateTime;
use jiff::Zoned;
#[cfg(feature = "serde")]
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::str::FromStr;

// --- CronSchedule convenience methods ---

impl CronSchedule {
    /// Parse a cron line with the default options (years 2000 through 2050).
    pub fn parse(expr: &str) -> Result<Self, CronError> {
        Self::with_options(expr, CronOptions::default())
    }

    /// Check whether an expression parses.
    pub fn validate(expr: &str) -> bool {
        Self::parse(expr).is_ok()
    }

    /// The nearest occurrence strictly after `reference`.
    pub fn next(&self, reference: DateTime) -> Result<DateTime, CronError> {
        nudge::search(self, reference, Direction::Forward)
    }

    /// The nearest occurrence strictly before `reference`.
    pub fn last(&self, reference: DateTime) -> Result<DateTime, CronError> {
        nudge::search(self, reference, Direction::Backward)
    }

    /// `count` consecutive occurrences after `reference`, increasing.
    pub fn next_n(&self, reference: DateTime, count: usize) -> Result<Vec<DateTime>, CronError> {
        self.occurrences(reference).take(count).collect()
    }

    /// `count` consecutive occurrences before `reference`, decreasing.
    pub fn last_n(&self, reference: DateTime, count: usize) -> Result<Vec<DateTime>, CronError> {
        self.occurrences_before(reference).take(count).collect()
    }

    /// Lazy iterator over the occurrences after `from`.
    pub fn occurrences(&self, from: DateTime) -> Occurrences<'_> {
        Occurrences::new(self, from, Direction::Forward)
    }

    /// Lazy iterator over the occurrences before `from`, most recent first.
    pub fn occurrences_before(&self, from: DateTime) -> Occurrences<'_> {
        Occurrences::new(self, from, Direction::Backward)
    }

    /// Like [`next`](Self::next), reading and returning wall-clock time in
    /// the time zone of `now`. No DST correction is applied beyond jiff's
    /// default disambiguation.
    pub fn next_zoned(&self, now: &Zoned) -> Result<Zoned, CronError> {
        let next = self.next(now.datetime())?;
        rezone(next, now)
    }

    /// Like [`last`](Self::last), in the time zone of `now`.
    pub fn last_zoned(&self, now: &Zoned) -> Result<Zoned, CronError> {
        let last = self.last(now.datetime())?;
        rezone(last, now)
    }

    /// `count` occurrences after `now`, in the time zone of `now`.
    pub fn next_n_zoned(&self, now: &Zoned, count: usize) -> Result<Vec<Zoned>, CronError> {
        self.next_n(now.datetime(), count)?
            .into_iter()
            .map(|dt| rezone(dt, now))
            .collect()
    }

    /// `count` occurrences before `now`, most recent first, in the time zone
    /// of `now`.
    pub fn last_n_zoned(&self, now: &Zoned, count: usize) -> Result<Vec<Zoned>, CronError> {
        self.last_n(now.datetime(), count)?
            .into_iter()
            .map(|dt| rezone(dt, now))
            .collect()
    }

    /// Check if a datetime matches this schedule.
    pub fn matches(&self, datetime: DateTime) -> Result<bool, CronError> {
        nudge::matches(self, datetime)
    }
}

fn rezone(datetime: DateTime, like: &Zoned) -> Result<Zoned, CronError> {
    datetime
        .to_zoned(like.time_zone().clone())
        .map_err(|e| CronError::calendar(format!("cannot place {datetime} in time zone: {e}")))
}

impl FromStr for CronSchedule {
    type Err = CronError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

#[cfg(feature = "serde")]
impl Serialize for CronSchedule {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

#[cfg(feature = "serde")]
impl<'de> Deserialize<'de> for CronSchedule {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        CronSchedule::parse(&s).map_err(serde::de::Error::custom)
    }
}
