//! The search for the nearest matching instant.
//!
//! A candidate starts at the reference instant and is fixed one field at a
//! time, coarsest first. Whenever a field moves, every finer field is reset
//! to a sentinel outside its domain so it gets recomputed. When a field runs
//! out of allowed values it wraps around and carries into the next coarser
//! field, exactly one level at a time, up to the year. The second is always
//! moved, so the result never equals the reference.

use std::collections::BTreeSet;
use std::ops::Bound::{Excluded, Unbounded};

use jiff::civil::DateTime;

use crate::days::DayCache;
use crate::error::CronError;
use crate::field::FieldKind;
use crate::schedule::{CronSchedule, Fields};

/// Which way a search walks from its reference instant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Forward,
    Backward,
}

impl Direction {
    /// The nearest allowed value strictly past `current`.
    fn nearest(self, allowed: &BTreeSet<i32>, current: i32) -> Option<i32> {
        match self {
            Self::Forward => allowed.range((Excluded(current), Unbounded)).next().copied(),
            Self::Backward => allowed.range(..current).next_back().copied(),
        }
    }

    /// Where a field restarts after wrapping around.
    fn wrap(self, allowed: &BTreeSet<i32>) -> Option<i32> {
        match self {
            Self::Forward => allowed.first().copied(),
            Self::Backward => allowed.last().copied(),
        }
    }

    /// A value just outside the field's domain on the side the search comes
    /// from, so the next nudge lands on the first allowed value.
    fn sentinel(self, kind: FieldKind) -> i32 {
        match (self, kind) {
            (Self::Forward, FieldKind::Month | FieldKind::DayOfMonth) => 0,
            (Self::Forward, _) => -1,
            (Self::Backward, FieldKind::Month) => 13,
            (Self::Backward, FieldKind::DayOfMonth) => 32,
            (Self::Backward, FieldKind::Hour) => 24,
            (Self::Backward, _) => 60,
        }
    }

    fn past_tense(self) -> &'static str {
        match self {
            Self::Forward => "after",
            Self::Backward => "before",
        }
    }
}

/// Working state of one search. Never leaves this module.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Candidate {
    year: i32,
    month: i32,
    day: i32,
    hour: i32,
    minute: i32,
    second: i32,
}

/// The time-of-day fields, which the nudge steps one value at a time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Clock {
    Hour,
    Minute,
    Second,
}

impl Clock {
    fn kind(self) -> FieldKind {
        match self {
            Self::Hour => FieldKind::Hour,
            Self::Minute => FieldKind::Minute,
            Self::Second => FieldKind::Second,
        }
    }
}

impl Candidate {
    fn get(&self, clock: Clock) -> i32 {
        match clock {
            Clock::Hour => self.hour,
            Clock::Minute => self.minute,
            Clock::Second => self.second,
        }
    }

    fn with(mut self, clock: Clock, value: i32) -> Self {
        match clock {
            Clock::Hour => self.hour = value,
            Clock::Minute => self.minute = value,
            Clock::Second => self.second = value,
        }
        self
    }

    fn into_datetime(self) -> Result<DateTime, CronError> {
        let Candidate {
            year,
            month,
            day,
            hour,
            minute,
            second,
        } = self;
        let out_of_range =
            |_| CronError::calendar(format!("{year}-{month}-{day} {hour}:{minute}:{second}"));
        DateTime::new(
            i16::try_from(year).map_err(out_of_range)?,
            i8::try_from(month).map_err(out_of_range)?,
            i8::try_from(day).map_err(out_of_range)?,
            i8::try_from(hour).map_err(out_of_range)?,
            i8::try_from(minute).map_err(out_of_range)?,
            i8::try_from(second).map_err(out_of_range)?,
            0,
        )
        .map_err(|e| CronError::calendar(format!("cannot build timestamp: {e}")))
    }
}

impl From<DateTime> for Candidate {
    fn from(dt: DateTime) -> Self {
        Self {
            year: i32::from(dt.year()),
            month: i32::from(dt.month()),
            day: i32::from(dt.day()),
            hour: i32::from(dt.hour()),
            minute: i32::from(dt.minute()),
            second: i32::from(dt.second()),
        }
    }
}

/// One search over a schedule's fields, holding the day cache exclusively
/// for its duration.
struct Nudge<'a> {
    fields: &'a Fields,
    days: &'a mut DayCache,
    direction: Direction,
}

impl<'a> Nudge<'a> {
    fn new(fields: &'a Fields, days: &'a mut DayCache, direction: Direction) -> Self {
        Self {
            fields,
            days,
            direction,
        }
    }

    fn run(mut self, reference: DateTime) -> Result<DateTime, CronError> {
        let dir = self.direction;
        let fields = self.fields;
        let mut t = Candidate::from(reference);
        // A fractional reference lies after its own whole second, so a
        // backward search must be able to land on that second.
        if dir == Direction::Backward && reference.subsec_nanosecond() != 0 {
            t.second += 1;
        }

        if !fields.year.contains(t.year) {
            t = self.year(t)?;
            t.month = dir.sentinel(FieldKind::Month);
        }

        if !fields.month.contains(t.month) {
            t = self.month(t)?;
            t.day = dir.sentinel(FieldKind::DayOfMonth);
        }

        if !self.day_is_valid(&t)? {
            t = self.day(t)?;
            t.hour = dir.sentinel(FieldKind::Hour);
        }

        if !fields.hour.contains(t.hour) {
            t = self.step(t, Clock::Hour)?;
            t.minute = dir.sentinel(FieldKind::Minute);
        }

        if !fields.minute.contains(t.minute) {
            t = self.step(t, Clock::Minute)?;
            t.second = dir.sentinel(FieldKind::Second);
        }

        t = self.step(t, Clock::Second)?;
        t.into_datetime()
    }

    fn year(&mut self, t: Candidate) -> Result<Candidate, CronError> {
        match self.direction.nearest(self.fields.year.allowed(), t.year) {
            Some(year) => Ok(Candidate { year, ..t }),
            None => {
                tracing::debug!(year = t.year, direction = ?self.direction, "allowed years exhausted");
                Err(CronError::no_match(format!(
                    "no matching dates exist {} year {}",
                    self.direction.past_tense(),
                    t.year
                )))
            }
        }
    }

    /// Move to the next allowed month that has at least one valid day and
    /// land on its first (or last) valid day.
    fn month(&mut self, mut t: Candidate) -> Result<Candidate, CronError> {
        let dir = self.direction;
        loop {
            let months = self.fields.month.allowed();
            t = match dir.nearest(months, t.month) {
                Some(month) => Candidate { month, ..t },
                None => {
                    let month = wrapped(dir, months, FieldKind::Month)?;
                    tracing::trace!(field = "month", to = month, "carry");
                    self.year(Candidate { month, ..t })?
                }
            };

            let days = self.days.days_for(self.fields, t.year, t.month)?;
            if let Some(day) = dir.wrap(days) {
                return Ok(Candidate { day, ..t });
            }
            tracing::trace!(year = t.year, month = t.month, "no valid day, skipping month");
        }
    }

    fn day(&mut self, t: Candidate) -> Result<Candidate, CronError> {
        let days = self.days.days_for(self.fields, t.year, t.month)?;
        match self.direction.nearest(days, t.day) {
            Some(day) => Ok(Candidate { day, ..t }),
            None => {
                tracing::trace!(field = "day", "carry");
                self.month(t)
            }
        }
    }

    fn day_is_valid(&mut self, t: &Candidate) -> Result<bool, CronError> {
        Ok(self
            .days
            .days_for(self.fields, t.year, t.month)?
            .contains(&t.day))
    }

    /// Nudge the hour, minute or second, carrying into the coarser field
    /// when it wraps.
    fn step(&mut self, t: Candidate, clock: Clock) -> Result<Candidate, CronError> {
        let dir = self.direction;
        let kind = clock.kind();
        let allowed = self.fields.get(kind).allowed();
        if let Some(value) = dir.nearest(allowed, t.get(clock)) {
            return Ok(t.with(clock, value));
        }

        let t = t.with(clock, wrapped(dir, allowed, kind)?);
        tracing::trace!(field = kind.as_str(), to = t.get(clock), "carry");
        match clock {
            Clock::Second => self.step(t, Clock::Minute),
            Clock::Minute => self.step(t, Clock::Hour),
            Clock::Hour => self.day(t),
        }
    }
}

fn wrapped(dir: Direction, allowed: &BTreeSet<i32>, kind: FieldKind) -> Result<i32, CronError> {
    dir.wrap(allowed)
        .ok_or_else(|| CronError::no_match(format!("{kind} field allows no values")))
}

/// Nearest instant strictly after (or before) `reference` that satisfies
/// the schedule.
pub fn search(
    schedule: &CronSchedule,
    reference: DateTime,
    direction: Direction,
) -> Result<DateTime, CronError> {
    let mut days = schedule.day_cache();
    Nudge::new(schedule.fields(), &mut days, direction).run(reference)
}

/// Check whether a whole-second instant satisfies every field.
pub fn matches(schedule: &CronSchedule, datetime: DateTime) -> Result<bool, CronError> {
    let t = Candidate::from(datetime);
    let fields = schedule.fields();
    if datetime.subsec_nanosecond() != 0
        || !fields.year.contains(t.year)
        || !fields.month.contains(t.month)
        || !fields.hour.contains(t.hour)
        || !fields.minute.contains(t.minute)
        || !fields.second.contains(t.second)
    {
        return Ok(false);
    }
    let mut days = schedule.day_cache();
    Ok(days.days_for(fields, t.year, t.month)?.contains(&t.day))
}

/// Lazy iterator over consecutive occurrences, each found by searching from
/// the previous one. Ends after the first error.
#[derive(Debug)]
pub struct Occurrences<'a> {
    schedule: &'a CronSchedule,
    cursor: Option<DateTime>,
    direction: Direction,
}

impl<'a> Occurrences<'a> {
    pub fn new(schedule: &'a CronSchedule, from: DateTime, direction: Direction) -> Self {
        Self {
            schedule,
            cursor: Some(from),
            direction,
        }
    }
}

impl Iterator for Occurrences<'_> {
    type Item = Result<DateTime, CronError>;

    fn next(&mut self) -> Option<Self::Item> {
        let cursor = self.cursor?;
        match search(self.schedule, cursor, self.direction) {
            Ok(dt) => {
                self.cursor = Some(dt);
                Some(Ok(dt))
            }
            Err(e) => {
                self.cursor = None;
                Some(Err(e))
            }
        }
    }
}

impl std::iter::FusedIterator for Occurrences<'_> {}

#[cfg(test)]
mod tests {
    use super::*;
    use jiff::civil::date;

    fn next(expr: &str, from: DateTime) -> DateTime {
        let s = CronSchedule::parse(expr).unwrap();
        search(&s, from, Direction::Forward).unwrap()
    }

    fn last(expr: &str, from: DateTime) -> DateTime {
        let s = CronSchedule::parse(expr).unwrap();
        search(&s, from, Direction::Backward).unwrap()
    }

    #[test]
    fn nearest_and_wrap() {
        let set: BTreeSet<i32> = [5, 10, 20].into_iter().collect();
        assert_eq!(Direction::Forward.nearest(&set, 10), Some(20));
        assert_eq!(Direction::Forward.nearest(&set, -1), Some(5));
        assert_eq!(Direction::Forward.nearest(&set, 20), None);
        assert_eq!(Direction::Backward.nearest(&set, 10), Some(5));
        assert_eq!(Direction::Backward.nearest(&set, 60), Some(20));
        assert_eq!(Direction::Backward.nearest(&set, 5), None);
        assert_eq!(Direction::Forward.wrap(&set), Some(5));
        assert_eq!(Direction::Backward.wrap(&set), Some(20));
    }

    #[test]
    fn every_minute_rounds_up() {
        assert_eq!(
            next("* * * * *", date(2024, 3, 10).at(10, 7, 30, 0)),
            date(2024, 3, 10).at(10, 8, 0, 0)
        );
        assert_eq!(
            next("* * * * *", date(2024, 3, 10).at(10, 7, 0, 0)),
            date(2024, 3, 10).at(10, 8, 0, 0)
        );
    }

    #[test]
    fn second_always_moves() {
        let from = date(2024, 3, 10).at(10, 7, 5, 0);
        assert_eq!(next("* * * * * *", from), date(2024, 3, 10).at(10, 7, 6, 0));
        assert_eq!(last("* * * * * *", from), date(2024, 3, 10).at(10, 7, 4, 0));
    }

    #[test]
    fn fractional_reference_backward_lands_on_its_own_second() {
        let from = date(2026, 2, 6).at(10, 7, 0, 500_000_000);
        assert_eq!(last("* * * * *", from), date(2026, 2, 6).at(10, 7, 0, 0));
        assert_eq!(next("* * * * *", from), date(2026, 2, 6).at(10, 8, 0, 0));

        let from = date(2026, 2, 6).at(10, 7, 59, 1);
        assert_eq!(last("* * * * * *", from), date(2026, 2, 6).at(10, 7, 59, 0));
        assert_eq!(last("0 * * * * *", from), date(2026, 2, 6).at(10, 7, 0, 0));
    }

    #[test]
    fn carry_through_every_level() {
        assert_eq!(
            next("* * * * *", date(2023, 12, 31).at(23, 59, 0, 0)),
            date(2024, 1, 1).at(0, 0, 0, 0)
        );
        assert_eq!(
            last("* * * * *", date(2024, 1, 1).at(0, 0, 0, 0)),
            date(2023, 12, 31).at(23, 59, 0, 0)
        );
    }

    #[test]
    fn hour_wrap_moves_to_next_day() {
        assert_eq!(
            next("30 8 * * *", date(2024, 2, 28).at(9, 0, 0, 0)),
            date(2024, 2, 29).at(8, 30, 0, 0)
        );
        assert_eq!(
            last("30 8 * * *", date(2024, 3, 1).at(8, 0, 0, 0)),
            date(2024, 2, 29).at(8, 30, 0, 0)
        );
    }

    #[test]
    fn month_without_valid_day_is_skipped() {
        assert_eq!(
            next("0 0 31 * *", date(2024, 1, 31).at(12, 0, 0, 0)),
            date(2024, 3, 31).at(0, 0, 0, 0)
        );
        assert_eq!(
            last("0 0 31 * *", date(2024, 3, 15).at(0, 0, 0, 0)),
            date(2024, 1, 31).at(0, 0, 0, 0)
        );
    }

    #[test]
    fn year_out_of_domain_jumps_in() {
        assert_eq!(
            next("0 0 1 1 *", date(1990, 6, 1).at(0, 0, 0, 0)),
            date(2000, 1, 1).at(0, 0, 0, 0)
        );
        assert_eq!(
            last("0 0 1 1 *", date(2070, 6, 1).at(0, 0, 0, 0)),
            date(2050, 1, 1).at(0, 0, 0, 0)
        );
    }

    #[test]
    fn backward_lands_on_last_valid_values() {
        assert_eq!(
            last("*/15 9-17 * * 1-5", date(2026, 6, 6).at(12, 0, 0, 0)),
            date(2026, 6, 5).at(17, 45, 0, 0)
        );
    }

    #[test]
    fn year_exhaustion_is_no_matching_date() {
        let s = CronSchedule::parse("0 0 30 2 *").unwrap();
        let err = search(&s, date(2024, 1, 1).at(0, 0, 0, 0), Direction::Forward).unwrap_err();
        assert!(err.is_no_matching_date());

        let s = CronSchedule::parse("0 0 0 1 1 * 2020").unwrap();
        let err = search(&s, date(2021, 1, 1).at(0, 0, 0, 0), Direction::Forward).unwrap_err();
        assert!(err.is_no_matching_date());
        assert!(search(&s, date(2021, 1, 1).at(0, 0, 0, 0), Direction::Backward).is_ok());
    }

    #[test]
    fn occurrences_stop_after_error() {
        let s = CronSchedule::parse("0 0 0 1 1 * 2049-2050").unwrap();
        let mut it = Occurrences::new(&s, date(2040, 1, 1).at(0, 0, 0, 0), Direction::Forward);
        assert_eq!(it.next().unwrap().unwrap(), date(2049, 1, 1).at(0, 0, 0, 0));
        assert_eq!(it.next().unwrap().unwrap(), date(2050, 1, 1).at(0, 0, 0, 0));
        assert!(it.next().unwrap().is_err());
        assert!(it.next().is_none());
    }

    #[test]
    fn matches_checks_every_field() {
        let s = CronSchedule::parse("0 12 * * 1").unwrap();
        assert!(matches(&s, date(2026, 6, 1).at(12, 0, 0, 0)).unwrap());
        assert!(!matches(&s, date(2026, 6, 2).at(12, 0, 0, 0)).unwrap());
        assert!(!matches(&s, date(2026, 6, 1).at(12, 0, 1, 0)).unwrap());
        assert!(!matches(&s, date(2026, 6, 1).at(12, 0, 0, 5)).unwrap());
    }
}
