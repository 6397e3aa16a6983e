//! Date format metadata for `date` fields.
//!
//! Formats are written with the familiar single-letter date tokens
//! (`Y-m-d`, `d/m/Y H:i`, `U`, `Y-m-d\TH:i:sP`). They are translated once, at
//! schema registration, into a chrono format string so hydration never has to
//! interpret the declaration again.
use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, NaiveTime, Utc};

use crate::core::error::{BindingError, BindingResult};

/// A validated, pre-translated date format
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DateFormat {
    declared: String,
    chrono: String,
    has_date: bool,
    has_time: bool,
    has_offset: bool,
}

impl DateFormat {
    /// Translate a token format. `field` is only used for error attribution.
    pub fn parse(field: &str, declared: &str) -> BindingResult<Self> {
        let mut chrono = String::with_capacity(declared.len() * 2);
        let mut has_date = false;
        let mut has_time = false;
        let mut has_offset = false;
        let mut chars = declared.chars();

        while let Some(c) = chars.next() {
            let token = match c {
                'd' | 'j' => "%d",
                'D' => "%a",
                'l' => "%A",
                'm' | 'n' => "%m",
                'M' => "%b",
                'F' => "%B",
                'Y' => "%Y",
                'y' => "%y",
                'H' | 'G' => "%H",
                'h' | 'g' => "%I",
                'i' => "%M",
                's' => "%S",
                'a' | 'A' => "%p",
                'u' => "%6f",
                'v' => "%3f",
                'P' => "%:z",
                'O' => "%z",
                'U' => "%s",
                '\\' => {
                    if let Some(escaped) = chars.next() {
                        push_literal(&mut chrono, escaped);
                    }
                    continue;
                }
                other if other.is_ascii_alphabetic() => {
                    return Err(BindingError::binding_spec(
                        field,
                        format!("unsupported date token '{other}' in format \"{declared}\""),
                    ));
                }
                other => {
                    push_literal(&mut chrono, other);
                    continue;
                }
            };

            match c {
                'd' | 'j' | 'D' | 'l' | 'm' | 'n' | 'M' | 'F' | 'Y' | 'y' => has_date = true,
                'P' | 'O' => has_offset = true,
                'U' => {
                    has_date = true;
                    has_time = true;
                }
                _ => has_time = true,
            }
            chrono.push_str(token);
        }

        if !has_date && !has_time {
            return Err(BindingError::binding_spec(
                field,
                format!("date format \"{declared}\" contains no date or time tokens"),
            ));
        }

        Ok(Self {
            declared: declared.to_string(),
            chrono,
            has_date,
            has_time,
            has_offset,
        })
    }

    /// The format as it was declared
    pub fn declared(&self) -> &str {
        &self.declared
    }

    /// The translated chrono format string
    pub fn chrono_format(&self) -> &str {
        &self.chrono
    }

    /// Parse a raw value. Missing time parts become midnight, a missing offset
    /// means UTC and a time-only format takes today's UTC date.
    pub fn parse_value(&self, value: &str) -> Option<DateTime<FixedOffset>> {
        if self.has_offset {
            return DateTime::parse_from_str(value, &self.chrono).ok();
        }

        let naive = if self.has_date && self.has_time {
            NaiveDateTime::parse_from_str(value, &self.chrono).ok()?
        } else if self.has_date {
            NaiveDate::parse_from_str(value, &self.chrono)
                .ok()?
                .and_time(NaiveTime::MIN)
        } else {
            let time = NaiveTime::parse_from_str(value, &self.chrono).ok()?;
            Utc::now().date_naive().and_time(time)
        };

        Some(naive.and_utc().fixed_offset())
    }
}

fn push_literal(out: &mut String, c: char) {
    if c == '%' {
        out.push_str("%%");
    } else {
        out.push(c);
    }
}
