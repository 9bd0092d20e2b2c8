//! Text normalization ahead of field matching: shorthand macros, month and
//! weekday names, and expansion to the seven canonical fields.

use std::fmt;

use crate::error::{CronError, Span};
use crate::field::FieldKind;

pub const MONTH_NAMES: [&str; 12] = [
    "jan", "feb", "mar", "apr", "may", "jun", "jul", "aug", "sep", "oct", "nov", "dec",
];

pub const WEEKDAY_NAMES: [&str; 7] = ["sun", "mon", "tue", "wed", "thu", "fri", "sat"];

/// A cron line rewritten to `second minute hour dom month dow year`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Normalized {
    fields: [String; 7],
}

impl Normalized {
    pub fn field(&self, kind: FieldKind) -> &str {
        &self.fields[kind.index()]
    }

    pub fn fields(&self) -> &[String; 7] {
        &self.fields
    }

    /// Byte offset of a field within the rendered text.
    pub fn offset(&self, kind: FieldKind) -> usize {
        self.fields[..kind.index()]
            .iter()
            .map(|f| f.len() + 1)
            .sum()
    }
}

impl fmt::Display for Normalized {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.fields.join(" "))
    }
}

/// Map a shorthand macro to its five-field form.
pub fn expand_macro(expr: &str) -> Result<&'static str, CronError> {
    let expanded = match expr.to_ascii_lowercase().as_str() {
        "@yearly" | "@annually" => "0 0 1 1 *",
        "@monthly" => "0 0 1 * *",
        "@weekly" => "0 0 * * 0",
        "@daily" | "@midnight" => "0 0 * * *",
        "@hourly" => "0 * * * *",
        "@minutely" => "* * * * *",
        "@reboot" => {
            return Err(CronError::invalid(
                "can't predict the last or next run of @reboot",
                Span::new(0, expr.len()),
                expr,
            ))
        }
        _ => {
            return Err(CronError::invalid(
                format!("unknown shorthand `{expr}`"),
                Span::new(0, expr.len()),
                expr,
            ))
        }
    };
    Ok(expanded)
}

/// Normalize a cron line of five, six or seven fields.
///
/// Five fields are `minute hour dom month dow` and run at second 0; six
/// fields prepend the second; seven append the year. A missing year is `*`.
pub fn normalize(expr: &str) -> Result<Normalized, CronError> {
    let trimmed = expr.trim();
    let line = if trimmed.starts_with('@') {
        let expanded = expand_macro(trimmed)?;
        tracing::debug!(shorthand = trimmed, expanded, "expanded cron shorthand");
        expanded
    } else {
        trimmed
    };

    let tokens: Vec<&str> = line.split_whitespace().collect();
    let mut fields: Vec<String> = match tokens.len() {
        5 => std::iter::once("0")
            .chain(tokens.iter().copied())
            .chain(std::iter::once("*"))
            .map(str::to_string)
            .collect(),
        6 => tokens
            .iter()
            .copied()
            .chain(std::iter::once("*"))
            .map(str::to_string)
            .collect(),
        7 => tokens.iter().map(|t| t.to_string()).collect(),
        n => {
            return Err(CronError::invalid(
                format!("not a valid cron line: expected 5, 6 or 7 fields, got {n}"),
                Span::new(0, line.len()),
                line,
            ))
        }
    };

    let month = FieldKind::Month.index();
    fields[month] = substitute_names(&fields[month], &MONTH_NAMES, 1);
    let dow = FieldKind::DayOfWeek.index();
    fields[dow] = substitute_names(&fields[dow], &WEEKDAY_NAMES, 0);

    let fields: [String; 7] = fields.try_into().map_err(|_| {
        CronError::invalid("not a valid cron line", Span::new(0, line.len()), line)
    })?;
    Ok(Normalized { fields })
}

/// Replace every alphabetic word that is one of `names` with its number,
/// case-insensitively. Unknown words are left for the field matcher to
/// reject.
fn substitute_names(field: &str, names: &[&str], first: usize) -> String {
    let mut out = String::with_capacity(field.len());
    let mut rest = field;
    while let Some(start) = rest.find(|c: char| c.is_ascii_alphabetic()) {
        out.push_str(&rest[..start]);
        let word = &rest[start..];
        let len = word
            .find(|c: char| !c.is_ascii_alphabetic())
            .unwrap_or(word.len());
        let word = &word[..len];
        match names.iter().position(|name| name.eq_ignore_ascii_case(word)) {
            Some(i) => out.push_str(&(i + first).to_string()),
            None => out.push_str(word),
        }
        rest = &rest[start + len..];
    }
    out.push_str(rest);
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn five_fields_get_second_and_year() {
        let n = normalize("*/5 9 * * 1-5").unwrap();
        assert_eq!(n.to_string(), "0 */5 9 * * 1-5 *");
    }

    #[test]
    fn six_fields_get_year() {
        let n = normalize("30 */5 9 * * 1-5").unwrap();
        assert_eq!(n.to_string(), "30 */5 9 * * 1-5 *");
    }

    #[test]
    fn seven_fields_unchanged() {
        let n = normalize("  0 0 12 1 1 * 2030 ").unwrap();
        assert_eq!(n.to_string(), "0 0 12 1 1 * 2030");
        assert_eq!(n.field(FieldKind::Year), "2030");
    }

    #[test]
    fn wrong_field_count() {
        for bad in ["", "* * * *", "* * * * * * * *"] {
            let err = normalize(bad).unwrap_err();
            assert!(err.is_invalid_expression(), "accepted `{bad}`");
        }
    }

    #[test]
    fn shorthands() {
        assert_eq!(normalize("@yearly").unwrap().to_string(), "0 0 0 1 1 * *");
        assert_eq!(normalize("@ANNUALLY").unwrap().to_string(), "0 0 0 1 1 * *");
        assert_eq!(normalize("@monthly").unwrap().to_string(), "0 0 0 1 * * *");
        assert_eq!(normalize("@weekly").unwrap().to_string(), "0 0 0 * * 0 *");
        assert_eq!(normalize("@daily").unwrap().to_string(), "0 0 0 * * * *");
        assert_eq!(normalize("@midnight").unwrap().to_string(), "0 0 0 * * * *");
        assert_eq!(normalize("@hourly").unwrap().to_string(), "0 0 * * * * *");
        assert_eq!(normalize("@minutely").unwrap().to_string(), "0 * * * * * *");
    }

    #[test]
    fn reboot_has_no_occurrence() {
        let err = normalize("@reboot").unwrap_err();
        assert!(err.to_string().contains("@reboot"));
        assert!(normalize("@fortnightly").is_err());
    }

    #[test]
    fn names_substituted_per_field() {
        let n = normalize("0 9 * JAN,jul-Sep mon-FRI").unwrap();
        assert_eq!(n.field(FieldKind::Month), "1,7-9");
        assert_eq!(n.field(FieldKind::DayOfWeek), "1-5");
    }

    #[test]
    fn unknown_words_left_alone() {
        let n = normalize("0 9 * * funday").unwrap();
        assert_eq!(n.field(FieldKind::DayOfWeek), "funday");
        let n = normalize("0 9 * mon *").unwrap();
        assert_eq!(n.field(FieldKind::Month), "mon");
    }

    #[test]
    fn field_offsets() {
        let n = normalize("15 10 1,15 * *").unwrap();
        assert_eq!(n.offset(FieldKind::Second), 0);
        assert_eq!(n.offset(FieldKind::Minute), 2);
        assert_eq!(n.offset(FieldKind::DayOfMonth), 8);
    }
}
