use std::ops::RangeInclusive;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::error::CronError;

/// Default lower bound of the implicit year field.
pub const DEFAULT_MIN_YEAR: i16 = 2000;
/// Default upper bound of the implicit year field.
pub const DEFAULT_MAX_YEAR: i16 = 2050;

/// Years the calendar can represent (jiff's civil range, minus the edges
/// so that a carry never has to step outside it).
const CALENDAR_YEARS: RangeInclusive<i16> = 1..=9998;

/// Tunables for parsing and searching a schedule.
///
/// The year bounds define the domain of the year field: `*` in the year
/// position expands to every year in `min_year..=max_year`, explicit years
/// must fall inside it, and a search that runs past either end fails with
/// [`CronError::NoMatchingDate`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct CronOptions {
    pub min_year: i16,
    pub max_year: i16,
}

impl Default for CronOptions {
    fn default() -> Self {
        Self {
            min_year: DEFAULT_MIN_YEAR,
            max_year: DEFAULT_MAX_YEAR,
        }
    }
}

impl CronOptions {
    pub fn with_years(mut self, years: RangeInclusive<i16>) -> Self {
        self.min_year = *years.start();
        self.max_year = *years.end();
        self
    }

    pub fn years(&self) -> RangeInclusive<i16> {
        self.min_year..=self.max_year
    }

    pub(crate) fn validate(&self) -> Result<(), CronError> {
        if self.min_year > self.max_year {
            return Err(CronError::config(format!(
                "year range is empty: {}..={}",
                self.min_year, self.max_year
            )));
        }
        if !CALENDAR_YEARS.contains(&self.min_year) || !CALENDAR_YEARS.contains(&self.max_year) {
            return Err(CronError::config(format!(
                "years must be within {}..={}, got {}..={}",
                CALENDAR_YEARS.start(),
                CALENDAR_YEARS.end(),
                self.min_year,
                self.max_year
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_is_2000_to_2050() {
        let options = CronOptions::default();
        assert_eq!(options.years(), 2000..=2050);
        assert!(options.validate().is_ok());
    }

    #[test]
    fn inverted_years_rejected() {
        let options = CronOptions::default().with_years(2030..=2020);
        assert!(matches!(options.validate(), Err(CronError::Config { .. })));
    }

    #[test]
    fn years_outside_calendar_rejected() {
        let options = CronOptions::default().with_years(0..=2020);
        assert!(options.validate().is_err());
    }

    #[cfg(feature = "serde")]
    #[test]
    fn deserialize_fills_missing_fields() {
        let options: CronOptions = serde_json::from_str(r#"{"max_year": 2100}"#).unwrap();
        assert_eq!(options.years(), 2000..=2100);
    }
}
