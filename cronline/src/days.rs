use std::collections::hash_map::Entry;
use std::collections::{BTreeSet, HashMap};

use jiff::civil::Date;

use crate::error::CronError;
use crate::field::ScheduleField;
use crate::schedule::Fields;

/// Valid days per `(year, month)`, filled on first use.
///
/// Entries are never evicted; the year domain bounds how many there can be.
#[derive(Debug, Default)]
pub(crate) struct DayCache {
    months: HashMap<(i32, i32), BTreeSet<i32>>,
}

impl DayCache {
    pub(crate) fn days_for(
        &mut self,
        fields: &Fields,
        year: i32,
        month: i32,
    ) -> Result<&BTreeSet<i32>, CronError> {
        match self.months.entry((year, month)) {
            Entry::Occupied(entry) => Ok(entry.into_mut()),
            Entry::Vacant(entry) => {
                let days =
                    interpolate_days(&fields.day_of_month, &fields.day_of_week, year, month)?;
                tracing::trace!(year, month, valid = days.len(), "interpolated valid days");
                Ok(entry.insert(days))
            }
        }
    }

    #[cfg(test)]
    pub(crate) fn len(&self) -> usize {
        self.months.len()
    }
}

/// Days of `year`-`month` selected by the day-of-month and day-of-week
/// fields.
///
/// When both fields are wildcards every day qualifies. Otherwise a wildcard
/// field contributes nothing and a day qualifies when it matches either of
/// the restricted fields. A literal 7 in day-of-week counts as Sunday here.
pub fn interpolate_days(
    day_of_month: &ScheduleField,
    day_of_week: &ScheduleField,
    year: i32,
    month: i32,
) -> Result<BTreeSet<i32>, CronError> {
    let (by_mday, by_wday) = match (day_of_month.is_wildcard(), day_of_week.is_wildcard()) {
        (true, false) => (false, true),
        (false, true) => (true, false),
        _ => (true, true),
    };

    let first = month_start(year, month)?;
    let first_weekday = i32::from(first.weekday().to_sunday_zero_offset());
    let last = i32::from(first.days_in_month());

    let days = (1..=last)
        .filter(|&day| {
            let weekday = (first_weekday + day - 1) % 7;
            (by_mday && day_of_month.contains(day))
                || (by_wday
                    && (day_of_week.contains(weekday) || (weekday == 0 && day_of_week.contains(7))))
        })
        .collect();
    Ok(days)
}

fn month_start(year: i32, month: i32) -> Result<Date, CronError> {
    let y = i16::try_from(year)
        .map_err(|_| CronError::calendar(format!("year {year} is out of range")))?;
    let m = i8::try_from(month)
        .map_err(|_| CronError::calendar(format!("month {month} is out of range")))?;
    Date::new(y, m, 1).map_err(|e| CronError::calendar(format!("invalid month {year}-{month}: {e}")))
}
