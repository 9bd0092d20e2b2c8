use parking_lot::{Mutex, MutexGuard};

use crate::days::DayCache;
use crate::error::CronError;
use crate::field::{parse_field, FieldKind, ScheduleField};
use crate::normalize::{normalize, Normalized};
use crate::options::CronOptions;

/// The seven matched fields of a schedule.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Fields {
    pub second: ScheduleField,
    pub minute: ScheduleField,
    pub hour: ScheduleField,
    pub day_of_month: ScheduleField,
    pub month: ScheduleField,
    pub day_of_week: ScheduleField,
    pub year: ScheduleField,
}

impl Fields {
    pub(crate) fn parse(normalized: &Normalized, options: &CronOptions) -> Result<Self, CronError> {
        let years = options.years();
        let field = |kind: FieldKind| {
            let text = normalized.field(kind);
            parse_field(kind, text, kind.domain(&years)).map_err(|e| {
                CronError::invalid(
                    e.message,
                    e.span.offset(normalized.offset(kind)),
                    normalized.to_string(),
                )
            })
        };

        Ok(Self {
            second: field(FieldKind::Second)?,
            minute: field(FieldKind::Minute)?,
            hour: field(FieldKind::Hour)?,
            day_of_month: field(FieldKind::DayOfMonth)?,
            month: field(FieldKind::Month)?,
            day_of_week: field(FieldKind::DayOfWeek)?,
            year: field(FieldKind::Year)?,
        })
    }

    pub fn get(&self, kind: FieldKind) -> &ScheduleField {
        match kind {
            FieldKind::Second => &self.second,
            FieldKind::Minute => &self.minute,
            FieldKind::Hour => &self.hour,
            FieldKind::DayOfMonth => &self.day_of_month,
            FieldKind::Month => &self.month,
            FieldKind::DayOfWeek => &self.day_of_week,
            FieldKind::Year => &self.year,
        }
    }
}

/// A parsed cron line, ready to answer next/last queries.
///
/// Fields are matched once at construction. Valid days per month are
/// computed on demand and memoized behind a lock, so a schedule can be
/// shared between threads.
#[derive(Debug)]
pub struct CronSchedule {
    source: String,
    normalized: Normalized,
    options: CronOptions,
    fields: Fields,
    days: Mutex<DayCache>,
}

impl CronSchedule {
    /// Parse a cron line with explicit options.
    pub fn with_options(expr: &str, options: CronOptions) -> Result<Self, CronError> {
        options.validate()?;
        let normalized = normalize(expr)?;
        let fields = Fields::parse(&normalized, &options)?;
        tracing::debug!(expression = %normalized, "parsed cron expression");

        Ok(Self {
            source: expr.to_string(),
            normalized,
            options,
            fields,
            days: Mutex::new(DayCache::default()),
        })
    }

    /// The text this schedule was parsed from.
    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn normalized(&self) -> &Normalized {
        &self.normalized
    }

    pub fn options(&self) -> &CronOptions {
        &self.options
    }

    pub fn fields(&self) -> &Fields {
        &self.fields
    }

    pub fn field(&self, kind: FieldKind) -> &ScheduleField {
        self.fields.get(kind)
    }

    pub(crate) fn day_cache(&self) -> MutexGuard<'_, DayCache> {
        self.days.lock()
    }
}

impl Clone for CronSchedule {
    fn clone(&self) -> Self {
        Self {
            source: self.source.clone(),
            normalized: self.normalized.clone(),
            options: self.options,
            fields: self.fields.clone(),
            days: Mutex::new(DayCache::default()),
        }
    }
}

impl PartialEq for CronSchedule {
    fn eq(&self, other: &Self) -> bool {
        self.normalized == other.normalized && self.options == other.options
    }
}

impl Eq for CronSchedule {}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Span;

    #[test]
    fn fields_follow_canonical_order() {
        let s = CronSchedule::parse("5 4 3 2 1 0 2030").unwrap();
        let values: Vec<Vec<i32>> = FieldKind::ALL
            .iter()
            .map(|&kind| s.field(kind).values().collect())
            .collect();
        assert_eq!(
            values,
            vec![vec![5], vec![4], vec![3], vec![2], vec![1], vec![0], vec![2030]]
        );
    }

    #[test]
    fn five_field_defaults() {
        let s = CronSchedule::parse("* * * * *").unwrap();
        assert_eq!(s.fields().second.values().collect::<Vec<_>>(), vec![0]);
        assert_eq!(s.fields().year.allowed().len(), 51);
        assert_eq!(s.fields().year.raw(), "*");
    }

    #[test]
    fn year_domain_follows_options() {
        let options = CronOptions::default().with_years(2020..=2024);
        let s = CronSchedule::with_options("0 0 * * *", options).unwrap();
        assert_eq!(
            s.fields().year.values().collect::<Vec<_>>(),
            vec![2020, 2021, 2022, 2023, 2024]
        );
        assert!(CronSchedule::with_options("0 0 0 * * * 2030", options).is_err());
    }

    #[test]
    fn error_span_is_relative_to_normalized_text() {
        let err = CronSchedule::parse("0 99 * * *").unwrap_err();
        match err {
            CronError::InvalidExpression { span, input, .. } => {
                assert_eq!(input, "0 0 99 * * * *");
                assert_eq!(span, Span::new(4, 6));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn clone_and_equality() {
        let a = CronSchedule::parse("0 12 * * mon").unwrap();
        let b = CronSchedule::parse("0 12 * * 1").unwrap();
        assert_eq!(a, b);
        assert_eq!(a.clone(), a);
        assert_eq!(a.source(), "0 12 * * mon");
    }

    #[test]
    fn invalid_options_fail_construction() {
        let options = CronOptions::default().with_years(2050..=2000);
        let err = CronSchedule::with_options("* * * * *", options).unwrap_err();
        assert!(matches!(err, CronError::Config { .. }));
    }
}
