// SPDX-License-Identifier: Apache-2.0 OR MIT
use scrivet_engine::{RenderError, Value, ValueFormatter};

/// Formats numbers with decimal patterns in the `#,##0.00%` family.
///
/// Pattern language: `0` forces a digit, `#` allows one, `,` in the integer
/// part turns on thousands grouping, `.` starts the fraction part, and a
/// trailing `%` scales by one hundred and appends the sign. Values may be
/// integers, floats, or strings that parse as a number.
pub struct NumberFormatter;

impl ValueFormatter for NumberFormatter {
    fn supports(&self, pattern: &str) -> bool {
        DecimalPattern::parse(pattern).is_some()
    }

    fn format(&self, value: &Value, pattern: &str) -> Result<String, RenderError> {
        let spec = DecimalPattern::parse(pattern).ok_or_else(|| {
            RenderError::UnsupportedFormat {
                pattern: pattern.to_string(),
            }
        })?;
        Ok(spec.apply(coerce_number(value)?))
    }
}

struct DecimalPattern {
    grouped: bool,
    min_integer_digits: usize,
    min_fraction_digits: usize,
    max_fraction_digits: usize,
    percent: bool,
}

impl DecimalPattern {
    fn parse(pattern: &str) -> Option<Self> {
        let mut rest = pattern;
        let percent = rest.ends_with('%');
        if percent {
            rest = &rest[..rest.len() - 1];
        }
        if rest.is_empty()
            || !rest.chars().all(|c| matches!(c, '#' | '0' | ',' | '.'))
            || !rest.chars().any(|c| matches!(c, '#' | '0'))
        {
            return None;
        }

        let (int_part, frac_part) = match rest.split_once('.') {
            Some((int_part, frac_part)) => (int_part, Some(frac_part)),
            None => (rest, None),
        };
        if let Some(frac) = frac_part {
            if frac.contains('.') || frac.contains(',') {
                return None;
            }
        }

        let min_fraction_digits = frac_part
            .map(|f| f.chars().filter(|c| *c == '0').count())
            .unwrap_or(0);
        let max_fraction_digits = frac_part.map(str::len).unwrap_or(0);
        if min_fraction_digits > max_fraction_digits {
            return None;
        }

        Some(Self {
            grouped: int_part.contains(','),
            min_integer_digits: int_part.chars().filter(|c| *c == '0').count().max(1),
            min_fraction_digits,
            max_fraction_digits,
            percent,
        })
    }

    fn apply(&self, value: f64) -> String {
        let scaled = if self.percent { value * 100.0 } else { value };
        let negative = scaled.is_sign_negative() && scaled != 0.0;
        let rounded = format!("{:.*}", self.max_fraction_digits, scaled.abs());

        let (integer, fraction) = match rounded.split_once('.') {
            Some((integer, fraction)) => (integer.to_string(), fraction.to_string()),
            None => (rounded, String::new()),
        };

        let mut fraction = fraction;
        while fraction.len() > self.min_fraction_digits && fraction.ends_with('0') {
            fraction.pop();
        }

        let mut integer = integer;
        while integer.len() < self.min_integer_digits {
            integer.insert(0, '0');
        }

        let mut out = String::new();
        if negative {
            out.push('-');
        }
        if self.grouped {
            out.push_str(&group_thousands(&integer));
        } else {
            out.push_str(&integer);
        }
        if !fraction.is_empty() {
            out.push('.');
            out.push_str(&fraction);
        }
        if self.percent {
            out.push('%');
        }
        out
    }
}

fn group_thousands(digits: &str) -> String {
    let chars: Vec<char> = digits.chars().collect();
    let mut out = String::with_capacity(chars.len() + chars.len() / 3);
    for (i, c) in chars.iter().enumerate() {
        if i > 0 && (chars.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(*c);
    }
    out
}

fn coerce_number(value: &Value) -> Result<f64, RenderError> {
    match value {
        Value::Int(n) => Ok(*n as f64),
        Value::Float(n) => Ok(*n),
        Value::String(s) => s.trim().parse().map_err(|_| {
            RenderError::type_mismatch(format!("cannot interpret {s:?} as a number"))
        }),
        other => Err(RenderError::type_mismatch(format!(
            "number patterns apply to numeric values, got {other:?}"
        ))),
    }
}
