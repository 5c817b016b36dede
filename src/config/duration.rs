//! Textual durations for duration-typed settings.
//!
//! Accepted forms:
//! - unit sequences such as `5s`, `300ms`, `1h30m`, `1.5s`
//!   (units: `ns`, `us`/`µs`, `ms`, `s`, `m`, `h`)
//! - a bare integer, read as nanoseconds (`0`, `1500000000`)
//! - a YAML float, read as nanoseconds truncated toward zero
//!
//! Use as `#[serde(with = "duration")]`.

use std::fmt;
use std::time::Duration;

use serde::de::{self, Visitor};
use serde::{Deserializer, Serializer};

const NANOS_PER_SEC: u128 = 1_000_000_000;

/// Fraction digits beyond this are dropped; they are below nanosecond precision.
const MAX_FRACTION_DIGITS: usize = 18;

/// Duration text parse failure.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DurationParseError {
    #[error("empty duration")]
    Empty,

    #[error("negative duration `{0}`")]
    Negative(String),

    #[error("invalid duration `{0}`")]
    Invalid(String),

    #[error("missing unit in duration `{0}`")]
    MissingUnit(String),

    #[error("unknown unit `{unit}` in duration `{text}`")]
    UnknownUnit { unit: String, text: String },

    #[error("duration `{0}` overflows")]
    Overflow(String),
}

fn unit_nanos(unit: &str) -> Option<u128> {
    match unit {
        "ns" => Some(1),
        "us" | "µs" | "μs" => Some(1_000),
        "ms" => Some(1_000_000),
        "s" => Some(NANOS_PER_SEC),
        "m" => Some(60 * NANOS_PER_SEC),
        "h" => Some(3_600 * NANOS_PER_SEC),
        _ => None,
    }
}

/// Parse duration text.
pub fn parse_duration(text: &str) -> Result<Duration, DurationParseError> {
    if text.is_empty() {
        return Err(DurationParseError::Empty);
    }
    if text.starts_with('-') {
        return Err(DurationParseError::Negative(text.to_string()));
    }
    let body = text.strip_prefix('+').unwrap_or(text);
    if body.is_empty() {
        return Err(DurationParseError::Invalid(text.to_string()));
    }

    if body.bytes().all(|b| b.is_ascii_digit()) {
        let nanos = body
            .parse::<u128>()
            .map_err(|_| DurationParseError::Overflow(text.to_string()))?;
        return from_nanos(nanos, text);
    }

    let mut total: u128 = 0;
    let mut rest = body;
    while !rest.is_empty() {
        let int_end = rest.find(|c: char| !c.is_ascii_digit()).unwrap_or(rest.len());
        let (int_part, tail) = rest.split_at(int_end);

        let (frac_part, tail) = match tail.strip_prefix('.') {
            Some(after_dot) => {
                let end = after_dot
                    .find(|c: char| !c.is_ascii_digit())
                    .unwrap_or(after_dot.len());
                after_dot.split_at(end)
            }
            None => ("", tail),
        };
        if int_part.is_empty() && frac_part.is_empty() {
            return Err(DurationParseError::Invalid(text.to_string()));
        }

        let unit_end = tail
            .find(|c: char| c.is_ascii_digit() || c == '.')
            .unwrap_or(tail.len());
        let (unit, tail) = tail.split_at(unit_end);
        if unit.is_empty() {
            return Err(DurationParseError::MissingUnit(text.to_string()));
        }
        let scale = unit_nanos(unit).ok_or_else(|| DurationParseError::UnknownUnit {
            unit: unit.to_string(),
            text: text.to_string(),
        })?;

        let overflow = || DurationParseError::Overflow(text.to_string());
        let whole: u128 = if int_part.is_empty() {
            0
        } else {
            int_part.parse().map_err(|_| overflow())?
        };
        let mut nanos = whole.checked_mul(scale).ok_or_else(overflow)?;

        let frac_digits = &frac_part[..frac_part.len().min(MAX_FRACTION_DIGITS)];
        if !frac_digits.is_empty() {
            let numerator: u128 = frac_digits.parse().map_err(|_| overflow())?;
            let denominator = 10u128.pow(frac_digits.len() as u32);
            let frac_nanos = numerator.checked_mul(scale).ok_or_else(overflow)? / denominator;
            nanos = nanos.checked_add(frac_nanos).ok_or_else(overflow)?;
        }

        total = total.checked_add(nanos).ok_or_else(overflow)?;
        rest = tail;
    }

    from_nanos(total, text)
}

fn from_nanos(nanos: u128, text: &str) -> Result<Duration, DurationParseError> {
    let secs = u64::try_from(nanos / NANOS_PER_SEC)
        .map_err(|_| DurationParseError::Overflow(text.to_string()))?;
    Ok(Duration::new(secs, (nanos % NANOS_PER_SEC) as u32))
}

/// Render a duration so that [`parse_duration`] reads it back unchanged.
pub fn format_duration(duration: &Duration) -> String {
    if duration.subsec_nanos() == 0 {
        format!("{}s", duration.as_secs())
    } else {
        format!("{}ns", duration.as_nanos())
    }
}

pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    serializer.serialize_str(&format_duration(duration))
}

pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
where
    D: Deserializer<'de>,
{
    deserializer.deserialize_any(DurationVisitor)
}

struct DurationVisitor;

impl<'de> Visitor<'de> for DurationVisitor {
    type Value = Duration;

    fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
        formatter.write_str("a duration such as \"5s\" or an integer number of nanoseconds")
    }

    fn visit_str<E: de::Error>(self, value: &str) -> Result<Duration, E> {
        parse_duration(value.trim()).map_err(E::custom)
    }

    fn visit_u64<E: de::Error>(self, value: u64) -> Result<Duration, E> {
        Ok(Duration::from_nanos(value))
    }

    fn visit_i64<E: de::Error>(self, value: i64) -> Result<Duration, E> {
        u64::try_from(value)
            .map(Duration::from_nanos)
            .map_err(|_| E::custom(DurationParseError::Negative(value.to_string())))
    }

    fn visit_f64<E: de::Error>(self, value: f64) -> Result<Duration, E> {
        if !value.is_finite() {
            return Err(E::custom(DurationParseError::Invalid(value.to_string())));
        }
        if value < 0.0 {
            return Err(E::custom(DurationParseError::Negative(value.to_string())));
        }
        // Nanoseconds, truncated toward zero; `as` saturates above u64::MAX
        Ok(Duration::from_nanos(value as u64))
    }

    fn visit_u128<E: de::Error>(self, value: u128) -> Result<Duration, E> {
        from_nanos(value, &value.to_string()).map_err(E::custom)
    }

    fn visit_i128<E: de::Error>(self, value: i128) -> Result<Duration, E> {
        let nanos = u128::try_from(value)
            .map_err(|_| E::custom(DurationParseError::Negative(value.to_string())))?;
        self.visit_u128(nanos)
    }
}
