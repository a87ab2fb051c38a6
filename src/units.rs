//! Unit-bearing scalars: durations, byte sizes and untyped numbers.
//!
//! Strings are `"<number><unit>"` with optional whitespace in between. A bare
//! number means milliseconds for durations and bytes for sizes.

use std::fmt;
use std::time::Duration;

/// A size in bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct ByteSize(pub u64);

impl ByteSize {
    pub const fn bytes(self) -> u64 {
        self.0
    }
}

impl fmt::Display for ByteSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} B", self.0)
    }
}

impl From<u64> for ByteSize {
    fn from(bytes: u64) -> Self {
        ByteSize(bytes)
    }
}

/// A numeric value that keeps whether it was stored as an integer or a float.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Number {
    Integer(i64),
    Float(f64),
}

impl Number {
    pub fn as_f64(self) -> f64 {
        match self {
            Number::Integer(i) => i as f64,
            Number::Float(f) => f,
        }
    }

    /// The integer value, if this number is whole and fits in an `i64`.
    pub fn as_i64(self) -> Option<i64> {
        // 2^63 is exactly representable and just out of range, hence `<`.
        const LIMIT: f64 = 9_223_372_036_854_775_808.0;
        match self {
            Number::Integer(i) => Some(i),
            Number::Float(f) if f.fract() == 0.0 && f >= -LIMIT && f < LIMIT => Some(f as i64),
            Number::Float(_) => None,
        }
    }
}

impl fmt::Display for Number {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Number::Integer(i) => write!(f, "{i}"),
            Number::Float(v) => write!(f, "{v}"),
        }
    }
}

/// Parse a number, keeping integers exact.
pub fn parse_number(s: &str) -> Option<Number> {
    let s = s.trim();
    if let Ok(i) = s.parse::<i64>() {
        return Some(Number::Integer(i));
    }
    // Only accept floats that look like decimals; "NaN" and "inf" stay strings.
    if s.bytes().any(|b| b.is_ascii_digit())
        && let Ok(f) = s.parse::<f64>()
        && f.is_finite()
    {
        return Some(Number::Float(f));
    }
    None
}

/// Split `"10 ms"` into `("10", "ms")`.
fn split_unit(s: &str) -> (&str, &str) {
    let s = s.trim();
    let idx = s
        .find(|c: char| !(c.is_ascii_digit() || c == '.' || c == '-' || c == '+'))
        .unwrap_or(s.len());
    (s[..idx].trim(), s[idx..].trim())
}

fn duration_unit_nanos(unit: &str) -> Option<u64> {
    let nanos = match unit {
        "ns" | "nano" | "nanos" | "nanosecond" | "nanoseconds" => 1,
        "us" | "µs" | "micro" | "micros" | "microsecond" | "microseconds" => 1_000,
        "" | "ms" | "milli" | "millis" | "millisecond" | "milliseconds" => 1_000_000,
        "s" | "second" | "seconds" => 1_000_000_000,
        "m" | "minute" | "minutes" => 60 * 1_000_000_000,
        "h" | "hour" | "hours" => 3_600 * 1_000_000_000,
        "d" | "day" | "days" => 86_400 * 1_000_000_000,
        _ => return None,
    };
    Some(nanos)
}

/// Parse a duration string such as `"30s"`, `"1.5 hours"` or `"250"` (ms).
pub fn parse_duration(s: &str) -> Result<Duration, String> {
    let (number, unit) = split_unit(s);
    let nanos = duration_unit_nanos(unit).ok_or_else(|| format!("unknown duration unit '{unit}'"))?;
    match parse_number(number) {
        Some(Number::Integer(n)) if n >= 0 => (n as u64)
            .checked_mul(nanos)
            .map(Duration::from_nanos)
            .ok_or_else(|| format!("duration '{s}' is too large")),
        Some(Number::Float(f)) if f >= 0.0 => {
            Duration::try_from_secs_f64(f * nanos as f64 / 1e9).map_err(|e| e.to_string())
        }
        Some(_) => Err(format!("duration '{s}' is negative")),
        None => Err(format!("'{s}' is not a duration")),
    }
}

fn byte_unit_multiplier(unit: &str) -> Option<u64> {
    const KI: u64 = 1024;
    let multiplier = match unit {
        "" | "B" | "b" | "byte" | "bytes" => 1,
        "K" | "k" | "Ki" | "KiB" | "kibibyte" | "kibibytes" => KI,
        "kB" | "kilobyte" | "kilobytes" => 1_000,
        "M" | "m" | "Mi" | "MiB" | "mebibyte" | "mebibytes" => KI.pow(2),
        "MB" | "megabyte" | "megabytes" => 1_000_000,
        "G" | "g" | "Gi" | "GiB" | "gibibyte" | "gibibytes" => KI.pow(3),
        "GB" | "gigabyte" | "gigabytes" => 1_000_000_000,
        "T" | "t" | "Ti" | "TiB" | "tebibyte" | "tebibytes" => KI.pow(4),
        "TB" | "terabyte" | "terabytes" => 1_000_000_000_000,
        _ => return None,
    };
    Some(multiplier)
}

/// Parse a byte size string such as `"512K"`, `"10 MB"` or `"4096"`.
pub fn parse_byte_size(s: &str) -> Result<ByteSize, String> {
    let (number, unit) = split_unit(s);
    let multiplier =
        byte_unit_multiplier(unit).ok_or_else(|| format!("unknown size unit '{unit}'"))?;
    match parse_number(number) {
        Some(Number::Integer(n)) if n >= 0 => (n as u64)
            .checked_mul(multiplier)
            .map(ByteSize)
            .ok_or_else(|| format!("size '{s}' is too large")),
        Some(Number::Float(f)) if f >= 0.0 => {
            let bytes = f * multiplier as f64;
            // `u64::MAX as f64` rounds up to 2^64, which is already out of range.
            if bytes >= u64::MAX as f64 {
                return Err(format!("size '{s}' is too large"));
            }
            Ok(ByteSize(bytes as u64))
        }
        Some(_) => Err(format!("size '{s}' is negative")),
        None => Err(format!("'{s}' is not a size in bytes")),
    }
}
