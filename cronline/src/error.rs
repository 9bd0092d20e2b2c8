use std::fmt;

/// Byte range within the normalized expression.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Span {
    pub start: usize,
    pub end: usize,
}

impl Span {
    pub fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }

    /// Shift a span that is relative to a field into expression coordinates.
    pub(crate) fn offset(self, by: usize) -> Self {
        Self::new(self.start + by, self.end + by)
    }
}

/// All errors produced by cronline.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[non_exhaustive]
pub enum CronError {
    /// Malformed field syntax, wrong field count or a macro without a
    /// predictable occurrence.
    #[error("{message}")]
    InvalidExpression {
        message: String,
        span: Span,
        input: String,
    },

    /// The search ran out of allowed years.
    #[error("{message}")]
    NoMatchingDate { message: String },

    #[error("{message}")]
    Config { message: String },

    #[error("{message}")]
    Calendar { message: String },
}

impl CronError {
    pub fn invalid(message: impl Into<String>, span: Span, input: impl Into<String>) -> Self {
        Self::InvalidExpression {
            message: message.into(),
            span,
            input: input.into(),
        }
    }

    pub fn no_match(message: impl Into<String>) -> Self {
        Self::NoMatchingDate {
            message: message.into(),
        }
    }

    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    pub fn calendar(message: impl Into<String>) -> Self {
        Self::Calendar {
            message: message.into(),
        }
    }

    pub fn is_invalid_expression(&self) -> bool {
        matches!(self, Self::InvalidExpression { .. })
    }

    pub fn is_no_matching_date(&self) -> bool {
        matches!(self, Self::NoMatchingDate { .. })
    }

    /// Format a rich error with the offending part of the expression underlined.
    pub fn display_rich(&self) -> String {
        match self {
            Self::InvalidExpression {
                message,
                span,
                input,
            } => format_span_error("error", message, span, input),
            Self::NoMatchingDate { message }
            | Self::Config { message }
            | Self::Calendar { message } => format!("error: {message}"),
        }
    }
}

fn format_span_error(prefix: &str, message: &str, span: &Span, input: &str) -> String {
    let mut out = format!("{prefix}: {message}\n");
    out.push_str(&format!("  {input}\n"));
    out.push_str(&" ".repeat(span.start + 2));
    out.push_str(&"^".repeat((span.end.saturating_sub(span.start)).max(1)));
    out
}

impl fmt::Display for Span {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}..{}", self.start, self.end)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rich_display_underlines_span() {
        let err = CronError::invalid("bad field `x`", Span::new(2, 3), "0 x * * * * *");
        assert_eq!(
            err.display_rich(),
            "error: bad field `x`\n  0 x * * * * *\n    ^"
        );
    }

    #[test]
    fn plain_display_is_message() {
        let err = CronError::no_match("no matching dates exist");
        assert_eq!(err.to_string(), "no matching dates exist");
        assert_eq!(err.display_rich(), "error: no matching dates exist");
        assert!(err.is_no_matching_date());
    }
}
