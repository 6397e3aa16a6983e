//! Scalar coercion of raw string values.
//!
//! Two modes are offered. `Lenient` reproduces the historical behaviour:
//! numbers are read from the longest leading numeric prefix and silently
//! default to zero, and an unrecognized boolean token comes back as the
//! original string. `Strict` rejects both cases with a [`CoercionError`].
//! Neither mode yields a non-finite float: lenient saturates out-of-range
//! literals to `f64::MAX` / `f64::MIN`, strict rejects them.
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::core::{descriptor::BaseKind, value::HydratedValue};

/// How forgiving scalar coercion is
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CoercionMode {
    /// Non-numeric input becomes 0 / 0.0, unknown booleans stay strings
    #[default]
    Lenient,
    /// Malformed numbers and booleans are errors
    Strict,
}

/// Raised only in strict mode
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("found {found} while expecting {expected}")]
pub struct CoercionError {
    pub found: String,
    pub expected: String,
}

impl CoercionError {
    fn new(raw: &str, expected: &BaseKind) -> Self {
        Self {
            found: format!("\"{raw}\""),
            expected: expected.name().to_string(),
        }
    }
}

/// Convert a raw string into `base`. Non-scalar kinds fall through to the string.
pub fn coerce(raw: &str, base: &BaseKind, mode: CoercionMode) -> Result<HydratedValue, CoercionError> {
    match base {
        BaseKind::Int => coerce_int(raw, mode).map(HydratedValue::Int),
        BaseKind::Float => coerce_float(raw, mode).map(HydratedValue::Float),
        BaseKind::Bool => match parse_bool(raw) {
            Some(b) => Ok(HydratedValue::Bool(b)),
            None if mode == CoercionMode::Strict => Err(CoercionError::new(raw, base)),
            None => Ok(HydratedValue::String(raw.to_string())),
        },
        _ => Ok(HydratedValue::String(raw.to_string())),
    }
}

/// Recognizes `true`/`false`/`1`/`0`, trimmed and case-insensitive
pub fn parse_bool(raw: &str) -> Option<bool> {
    match raw.trim().to_lowercase().as_str() {
        "true" | "1" => Some(true),
        "false" | "0" => Some(false),
        _ => None,
    }
}

fn coerce_int(raw: &str, mode: CoercionMode) -> Result<i64, CoercionError> {
    let trimmed = raw.trim();

    if mode == CoercionMode::Strict {
        return trimmed
            .parse::<i64>()
            .map_err(|_| CoercionError::new(raw, &BaseKind::Int));
    }

    let Some(prefix) = numeric_prefix(trimmed) else {
        return Ok(0);
    };

    if prefix.contains(['.', 'e', 'E']) {
        // float-to-int `as` casts saturate, matching the overflow behaviour below
        return Ok(prefix.parse::<f64>().map(|f| f as i64).unwrap_or(0));
    }

    Ok(prefix.parse::<i64>().unwrap_or(if prefix.starts_with('-') {
        i64::MIN
    } else {
        i64::MAX
    }))
}

fn coerce_float(raw: &str, mode: CoercionMode) -> Result<f64, CoercionError> {
    let trimmed = raw.trim();

    match numeric_prefix(trimmed) {
        Some(prefix) if mode == CoercionMode::Lenient => {
            Ok(saturate(prefix.parse::<f64>().unwrap_or(0.0)))
        }
        Some(prefix) if prefix.len() == trimmed.len() => prefix
            .parse::<f64>()
            .ok()
            .filter(|f| f.is_finite())
            .ok_or_else(|| CoercionError::new(raw, &BaseKind::Float)),
        _ if mode == CoercionMode::Strict => Err(CoercionError::new(raw, &BaseKind::Float)),
        _ => Ok(0.0),
    }
}

/// Overflowing literals such as `1e400` clamp to the largest finite float of
/// the same sign
fn saturate(f: f64) -> f64 {
    if f.is_finite() {
        f
    } else if f.is_sign_negative() {
        f64::MIN
    } else {
        f64::MAX
    }
}

/// Longest leading slice of `s` that reads as a decimal number
fn numeric_prefix(s: &str) -> Option<&str> {
    let bytes = s.as_bytes();
    let mut end = 0;

    if matches!(bytes.first(), Some(b'+' | b'-')) {
        end += 1;
    }

    let int_start = end;
    while end < bytes.len() && bytes[end].is_ascii_digit() {
        end += 1;
    }
    let mut digits = end - int_start;

    if end < bytes.len() && bytes[end] == b'.' {
        let frac_start = end + 1;
        let mut frac_end = frac_start;
        while frac_end < bytes.len() && bytes[frac_end].is_ascii_digit() {
            frac_end += 1;
        }
        if digits > 0 || frac_end > frac_start {
            digits += frac_end - frac_start;
            end = frac_end;
        }
    }

    if digits == 0 {
        return None;
    }

    if end < bytes.len() && matches!(bytes[end], b'e' | b'E') {
        let mut exp_end = end + 1;
        if matches!(bytes.get(exp_end), Some(b'+' | b'-')) {
            exp_end += 1;
        }
        let exp_digits_start = exp_end;
        while exp_end < bytes.len() && bytes[exp_end].is_ascii_digit() {
            exp_end += 1;
        }
        if exp_end > exp_digits_start {
            end = exp_end;
        }
    }

    Some(&s[..end])
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lenient(raw: &str, base: BaseKind) -> HydratedValue {
        coerce(raw, &base, CoercionMode::Lenient).unwrap()
    }

    #[test]
    fn string_is_identity() {
        assert_eq!(
            lenient(" padded ", BaseKind::String),
            HydratedValue::String(" padded ".to_string())
        );
    }

    #[test]
    fn numbers_trim_and_read_leading_prefix() {
        assert_eq!(lenient(" 42 ", BaseKind::Int), HydratedValue::Int(42));
        assert_eq!(lenient("12abc", BaseKind::Int), HydratedValue::Int(12));
        assert_eq!(lenient("1.9", BaseKind::Int), HydratedValue::Int(1));
        assert_eq!(lenient("1e3", BaseKind::Int), HydratedValue::Int(1000));
        assert_eq!(lenient("-7", BaseKind::Int), HydratedValue::Int(-7));
        assert_eq!(lenient("3.5kg", BaseKind::Float), HydratedValue::Float(3.5));
        assert_eq!(lenient(".5", BaseKind::Float), HydratedValue::Float(0.5));
    }

    #[test]
    fn non_numeric_input_silently_becomes_zero_in_lenient_mode() {
        assert_eq!(lenient("abc", BaseKind::Int), HydratedValue::Int(0));
        assert_eq!(lenient("", BaseKind::Int), HydratedValue::Int(0));
        assert_eq!(lenient("abc", BaseKind::Float), HydratedValue::Float(0.0));
        assert_eq!(lenient("inf", BaseKind::Float), HydratedValue::Float(0.0));
    }

    #[test]
    fn integer_overflow_saturates() {
        assert_eq!(
            lenient("99999999999999999999", BaseKind::Int),
            HydratedValue::Int(i64::MAX)
        );
        assert_eq!(
            lenient("-99999999999999999999", BaseKind::Int),
            HydratedValue::Int(i64::MIN)
        );
    }

    #[test]
    fn out_of_range_floats_stay_finite() {
        assert_eq!(lenient("1e400", BaseKind::Float), HydratedValue::Float(f64::MAX));
        assert_eq!(lenient("-1e400x", BaseKind::Float), HydratedValue::Float(f64::MIN));
        assert_eq!(lenient("1e400", BaseKind::Int), HydratedValue::Int(i64::MAX));

        let err = coerce("1e400", &BaseKind::Float, CoercionMode::Strict).unwrap_err();
        assert_eq!(err.found, "\"1e400\"");
        assert_eq!(err.expected, "float");
    }

    #[test]
    fn boolean_table() {
        assert_eq!(lenient("true", BaseKind::Bool), HydratedValue::Bool(true));
        assert_eq!(lenient("FALSE", BaseKind::Bool), HydratedValue::Bool(false));
        assert_eq!(lenient(" 1 ", BaseKind::Bool), HydratedValue::Bool(true));
        assert_eq!(lenient("0", BaseKind::Bool), HydratedValue::Bool(false));
    }

    #[test]
    fn unknown_boolean_falls_back_to_original_string() {
        assert_eq!(
            lenient("maybe", BaseKind::Bool),
            HydratedValue::String("maybe".to_string())
        );
    }

    #[test]
    fn strict_mode_rejects_malformed_input() {
        assert!(coerce("abc", &BaseKind::Int, CoercionMode::Strict).is_err());
        assert!(coerce("1.5", &BaseKind::Int, CoercionMode::Strict).is_err());
        assert!(coerce("3.5kg", &BaseKind::Float, CoercionMode::Strict).is_err());
        assert!(coerce("maybe", &BaseKind::Bool, CoercionMode::Strict).is_err());

        assert_eq!(
            coerce(" 12 ", &BaseKind::Int, CoercionMode::Strict).unwrap(),
            HydratedValue::Int(12)
        );
        assert_eq!(
            coerce("2.25", &BaseKind::Float, CoercionMode::Strict).unwrap(),
            HydratedValue::Float(2.25)
        );
    }

    #[test]
    fn coercing_an_already_typed_value_is_idempotent() {
        for (raw, base) in [
            ("42", BaseKind::Int),
            ("2.5", BaseKind::Float),
            ("true", BaseKind::Bool),
            ("text", BaseKind::String),
        ] {
            let once = coerce(raw, &base, CoercionMode::Strict).unwrap();
            let rendered = serde_json::to_value(&once).unwrap().to_string();
            let rendered = rendered.trim_matches('"');
            assert_eq!(coerce(rendered, &base, CoercionMode::Strict).unwrap(), once);
        }
    }
}
