use std::collections::BTreeSet;
use std::fmt;
use std::ops::RangeInclusive;

use crate::error::Span;

/// One position of a cron line, in canonical order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FieldKind {
    Second,
    Minute,
    Hour,
    DayOfMonth,
    Month,
    DayOfWeek,
    Year,
}

impl FieldKind {
    /// All fields in the order they appear in a seven-field expression.
    pub const ALL: [FieldKind; 7] = [
        FieldKind::Second,
        FieldKind::Minute,
        FieldKind::Hour,
        FieldKind::DayOfMonth,
        FieldKind::Month,
        FieldKind::DayOfWeek,
        FieldKind::Year,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Second => "second",
            Self::Minute => "minute",
            Self::Hour => "hour",
            Self::DayOfMonth => "day-of-month",
            Self::Month => "month",
            Self::DayOfWeek => "day-of-week",
            Self::Year => "year",
        }
    }

    /// Position of this field in a seven-field expression.
    pub fn index(self) -> usize {
        match self {
            Self::Second => 0,
            Self::Minute => 1,
            Self::Hour => 2,
            Self::DayOfMonth => 3,
            Self::Month => 4,
            Self::DayOfWeek => 5,
            Self::Year => 6,
        }
    }

    /// The values `*` expands to. The year domain comes from the options.
    pub fn domain(self, years: &RangeInclusive<i16>) -> RangeInclusive<i32> {
        match self {
            Self::Second | Self::Minute => 0..=59,
            Self::Hour => 0..=23,
            Self::DayOfMonth => 1..=31,
            Self::Month => 1..=12,
            Self::DayOfWeek => 0..=6,
            Self::Year => i32::from(*years.start())..=i32::from(*years.end()),
        }
    }

    /// Largest value accepted when written out explicitly. Day-of-week also
    /// takes 7 as a second spelling of Sunday.
    fn explicit_max(self, domain: &RangeInclusive<i32>) -> i32 {
        match self {
            Self::DayOfWeek => 7,
            _ => *domain.end(),
        }
    }

    fn accepts_question_mark(self) -> bool {
        matches!(self, Self::DayOfMonth | Self::DayOfWeek)
    }
}

impl fmt::Display for FieldKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The concrete values one field of a schedule allows.
///
/// `allowed` is never empty and every element lies within the field's
/// domain. Being a `BTreeSet` it serves both membership checks and the
/// ordered nearest-neighbour search the nudge engine needs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScheduleField {
    kind: FieldKind,
    allowed: BTreeSet<i32>,
    raw: String,
}

impl ScheduleField {
    pub fn kind(&self) -> FieldKind {
        self.kind
    }

    /// The field text as it was matched (after name substitution).
    pub fn raw(&self) -> &str {
        &self.raw
    }

    pub fn allowed(&self) -> &BTreeSet<i32> {
        &self.allowed
    }

    /// Allowed values in ascending order.
    pub fn values(&self) -> impl Iterator<Item = i32> + '_ {
        self.allowed.iter().copied()
    }

    pub fn contains(&self, value: i32) -> bool {
        self.allowed.contains(&value)
    }

    /// True for a bare `*` or `?`, which leave the day OR-rule to the other
    /// day field.
    pub fn is_wildcard(&self) -> bool {
        self.raw == "*" || self.raw == "?"
    }
}

/// A field that failed to match; the span is relative to the field text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct FieldError {
    pub message: String,
    pub span: Span,
}

impl FieldError {
    fn new(message: impl Into<String>, start: usize, len: usize) -> Self {
        Self {
            message: message.into(),
            span: Span::new(start, start + len),
        }
    }
}

/// Parse one field of a cron line into its allowed values.
///
/// Grammar per comma-separated element: `*`, `*/n`, `a`, `a-b`, `a-b/n`,
/// and for the two day fields `?` / `?/n` as spellings of `*` / `*/n`.
pub(crate) fn parse_field(
    kind: FieldKind,
    text: &str,
    domain: RangeInclusive<i32>,
) -> Result<ScheduleField, FieldError> {
    let mut allowed = BTreeSet::new();
    let mut offset = 0;
    for element in text.split(',') {
        let values = parse_element(kind, element, &domain)
            .map_err(|message| FieldError::new(message, offset, element.len()))?;
        allowed.extend(values);
        offset += element.len() + 1;
    }

    Ok(ScheduleField {
        kind,
        allowed,
        raw: text.to_string(),
    })
}

fn parse_element(
    kind: FieldKind,
    element: &str,
    domain: &RangeInclusive<i32>,
) -> Result<Vec<i32>, String> {
    if element.is_empty() {
        return Err(format!("empty element in {kind} field"));
    }

    let wildcard = element
        .strip_prefix('*')
        .or_else(|| element.strip_prefix('?').filter(|_| kind.accepts_question_mark()));
    if let Some(rest) = wildcard {
        let step = match rest {
            "" => 1,
            _ => match rest.strip_prefix('/') {
                Some(step) => parse_step(kind, step)?,
                None => return Err(format!("bad {kind} specification `{element}`")),
            },
        };
        return Ok(stepped_range(*domain.start(), *domain.end(), step).collect());
    }
    if element.starts_with('?') {
        return Err(format!(
            "`?` is only allowed in the day-of-month and day-of-week fields, not {kind}"
        ));
    }

    let (range, step) = match element.split_once('/') {
        Some((range, step)) => (range, Some(parse_step(kind, step)?)),
        None => (element, None),
    };

    match range.split_once('-') {
        Some((lo, hi)) => {
            let lo = parse_value(kind, lo, domain)?;
            let hi = parse_value(kind, hi, domain)?;
            if lo > hi {
                return Err(format!("{kind} range start must be <= end: {lo}-{hi}"));
            }
            Ok(stepped_range(lo, hi, step.unwrap_or(1)).collect())
        }
        None => {
            if step.is_some() {
                return Err(format!(
                    "bad {kind} specification `{element}` (a step needs `*` or a range)"
                ));
            }
            Ok(vec![parse_value(kind, range, domain)?])
        }
    }
}

fn parse_value(kind: FieldKind, text: &str, domain: &RangeInclusive<i32>) -> Result<i32, String> {
    if text.is_empty() || !text.bytes().all(|b| b.is_ascii_digit()) {
        return Err(format!("bad {kind} value `{text}`"));
    }
    let value: i32 = text
        .parse()
        .map_err(|_| format!("{kind} value out of range: {text}"))?;
    let max = kind.explicit_max(domain);
    if value < *domain.start() || value > max {
        return Err(format!(
            "{kind} must be {}-{max}, got {value}",
            domain.start()
        ));
    }
    Ok(value)
}

fn parse_step(kind: FieldKind, text: &str) -> Result<i32, String> {
    if text.is_empty() || !text.bytes().all(|b| b.is_ascii_digit()) {
        return Err(format!("bad {kind} step `{text}`"));
    }
    match text.parse::<i32>() {
        Ok(0) => Err(format!("{kind} step cannot be 0")),
        Ok(step) => Ok(step),
        Err(_) => Err(format!("{kind} step out of range: {text}")),
    }
}

/// Emit `lo, lo + step, lo + 2 * step, ...` up to and including `hi`.
pub(crate) fn stepped_range(lo: i32, hi: i32, step: i32) -> impl Iterator<Item = i32> {
    std::iter::successors(Some(lo), move |value| value.checked_add(step))
        .take_while(move |value| *value <= hi)
}
