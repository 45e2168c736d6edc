//! Timeout value parsing.
//!
//! Timeouts arrive either as a bare integer number of seconds (`"30"`) or as a
//! duration expression built from number+unit terms (`"1m30s"`, `"1.5h"`,
//! `"250ms"`). Anything else, including negative values, resolves to the
//! caller-supplied fallback.

use std::time::Duration;

/// Parse an integer-seconds-or-duration value, returning `fallback` when the
/// value is empty, negative, or malformed.
pub fn parse_int_or_duration(value: &str, fallback: Duration) -> Duration {
    if let Ok(secs) = value.parse::<u64>() {
        return Duration::from_secs(secs);
    }
    parse_duration(value).unwrap_or(fallback)
}

/// Parse a duration expression such as `"2h45m"` or `"1.5s"`.
pub fn parse_duration(input: &str) -> Option<Duration> {
    let s = input.strip_prefix('+').unwrap_or(input);
    if s.is_empty() || s.starts_with('-') {
        return None;
    }
    if s == "0" {
        return Some(Duration::ZERO);
    }

    let mut rest = s;
    let mut total: u128 = 0;
    while !rest.is_empty() {
        let number_len = rest
            .find(|c: char| !(c.is_ascii_digit() || c == '.'))
            .unwrap_or(rest.len());
        if number_len == 0 {
            return None;
        }
        let (number, tail) = rest.split_at(number_len);

        let unit_len = tail
            .find(|c: char| c.is_ascii_digit() || c == '.')
            .unwrap_or(tail.len());
        if unit_len == 0 {
            return None;
        }
        let (unit, tail) = tail.split_at(unit_len);

        total = total.checked_add(term_nanos(number, unit_nanos(unit)?)?)?;
        rest = tail;
    }

    u64::try_from(total).ok().map(Duration::from_nanos)
}

fn unit_nanos(unit: &str) -> Option<u128> {
    let nanos = match unit {
        "ns" => 1,
        "us" | "\u{00b5}s" | "\u{03bc}s" => 1_000,
        "ms" => 1_000_000,
        "s" => 1_000_000_000,
        "m" => 60 * 1_000_000_000,
        "h" => 3_600 * 1_000_000_000,
        _ => return None,
    };
    Some(nanos)
}

fn term_nanos(number: &str, scale: u128) -> Option<u128> {
    let (whole, frac) = number.split_once('.').unwrap_or((number, ""));
    if (whole.is_empty() && frac.is_empty()) || frac.contains('.') {
        return None;
    }

    let whole: u128 = if whole.is_empty() { 0 } else { whole.parse().ok()? };
    let mut nanos = whole.checked_mul(scale)?;

    if !frac.is_empty() {
        // Digits past 18 cannot change a nanosecond total.
        let digits = &frac[..frac.len().min(18)];
        let value: u128 = digits.parse().ok()?;
        nanos = nanos.checked_add(value * scale / 10u128.pow(digits.len() as u32))?;
    }
    Some(nanos)
}
