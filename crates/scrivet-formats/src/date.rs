// SPDX-License-Identifier: Apache-2.0 OR MIT
use std::fmt::Write as _;

use chrono::{DateTime, FixedOffset, NaiveDate, Offset, Utc};

use scrivet_engine::{RenderError, Value, ValueFormatter};

/// Formats timestamps with strftime patterns, in a configurable zone.
///
/// Accepted values:
///
/// * strings holding an RFC 3339 timestamp (`2024-03-01T17:30:00Z`),
/// * strings holding a plain date (`2024-03-01`, taken as midnight in the
///   configured zone),
/// * integers holding Unix seconds.
///
/// The formatter claims any pattern containing a `%` directive, so it must be
/// registered ahead of formatters with more specific pattern languages only
/// if those also use `%`.
pub struct DateFormatter {
    zone: FixedOffset,
}

impl DateFormatter {
    /// A formatter that renders instants in UTC.
    pub fn utc() -> Self {
        Self {
            zone: Utc.fix(),
        }
    }

    /// A formatter that renders instants in the given fixed offset.
    pub fn with_zone(zone: FixedOffset) -> Self {
        Self { zone }
    }

    fn coerce(&self, value: &Value) -> Result<DateTime<FixedOffset>, RenderError> {
        match value {
            Value::String(text) => self.parse_timestamp(text).ok_or_else(|| {
                RenderError::type_mismatch(format!("cannot interpret {text:?} as a date"))
            }),
            Value::Int(seconds) => DateTime::from_timestamp(*seconds, 0)
                .map(|instant| instant.with_timezone(&self.zone))
                .ok_or_else(|| {
                    RenderError::type_mismatch(format!(
                        "{seconds} is out of range for a Unix timestamp"
                    ))
                }),
            other => Err(RenderError::type_mismatch(format!(
                "date patterns apply to timestamps, got {other:?}"
            ))),
        }
    }

    fn parse_timestamp(&self, text: &str) -> Option<DateTime<FixedOffset>> {
        if let Ok(instant) = DateTime::parse_from_rfc3339(text) {
            return Some(instant.with_timezone(&self.zone));
        }
        let date = NaiveDate::parse_from_str(text, "%Y-%m-%d").ok()?;
        date.and_hms_opt(0, 0, 0)?
            .and_local_timezone(self.zone)
            .single()
    }
}

impl ValueFormatter for DateFormatter {
    fn supports(&self, pattern: &str) -> bool {
        has_strftime_directive(pattern)
    }

    fn format(&self, value: &Value, pattern: &str) -> Result<String, RenderError> {
        let instant = self.coerce(value)?;
        let mut formatted = String::new();
        // chrono reports bad specifiers through the fmt error path.
        write!(formatted, "{}", instant.format(pattern)).map_err(|_| {
            RenderError::UnsupportedFormat {
                pattern: pattern.to_string(),
            }
        })?;
        Ok(formatted)
    }
}

fn has_strftime_directive(pattern: &str) -> bool {
    let mut chars = pattern.chars().peekable();
    while let Some(c) = chars.next() {
        if c != '%' {
            continue;
        }
        match chars.peek() {
            Some('-' | '_' | '0') => {
                chars.next();
                if chars.peek().is_some_and(char::is_ascii_alphabetic) {
                    return true;
                }
            }
            Some(next) if next.is_ascii_alphabetic() => return true,
            _ => {}
        }
    }
    false
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn claims_strftime_patterns_only() {
        let formatter = DateFormatter::utc();
        assert!(formatter.supports("%Y-%m-%d"));
        assert!(formatter.supports("week %-V"));
        assert!(!formatter.supports("#,##0.00"));
        assert!(!formatter.supports("0%"));
        assert!(!formatter.supports("plain text"));
    }

    #[test]
    fn formats_rfc3339_in_the_configured_zone() {
        let zone = FixedOffset::east_opt(2 * 3600).expect("valid offset");
        let formatter = DateFormatter::with_zone(zone);
        let formatted = formatter
            .format(&Value::from("2024-03-01T17:30:00Z"), "%Y-%m-%d %H:%M")
            .unwrap();
        assert_eq!(formatted, "2024-03-01 19:30");
    }

    #[test]
    fn plain_dates_are_midnight_in_zone() {
        let formatted = DateFormatter::utc()
            .format(&Value::from("2024-12-24"), "%d %B %Y")
            .unwrap();
        assert_eq!(formatted, "24 December 2024");
    }

    #[test]
    fn unix_seconds_are_accepted() {
        let formatted = DateFormatter::utc()
            .format(&Value::Int(0), "%Y-%m-%dT%H:%M:%SZ")
            .unwrap();
        assert_eq!(formatted, "1970-01-01T00:00:00Z");
    }

    #[test]
    fn non_temporal_values_are_rejected() {
        let err = DateFormatter::utc()
            .format(&Value::Bool(true), "%Y")
            .unwrap_err();
        assert!(matches!(err, RenderError::ValueTypeMismatch { .. }));

        let err = DateFormatter::utc()
            .format(&Value::from("not a date"), "%Y")
            .unwrap_err();
        assert!(matches!(err, RenderError::ValueTypeMismatch { .. }));
    }
}
