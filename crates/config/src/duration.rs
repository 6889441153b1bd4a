//! Parsing for human-friendly duration strings such as `"5s"` or `"1m30s"`.

use std::time::Duration;

use crate::error::{Error, Result};

/// Cache TTL used when none is configured or the configured value is unusable.
pub const DEFAULT_CACHE_TTL: Duration = Duration::from_secs(5);

/// Parse a duration string into a [`Duration`].
///
/// Accepts one or more `<number><unit>` pairs, where the number may carry a
/// fractional part and the unit is one of `ms`, `s`, `m`, `h`.
/// Examples: `"500ms"`, `"5s"`, `"1.5s"`, `"1m30s"`, `"2h"`.
pub fn parse_duration(input: &str) -> Result<Duration> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Err(Error::invalid_duration(input, "empty duration string"));
    }

    let mut rest = trimmed;
    let mut total_ms = 0f64;

    while !rest.is_empty() {
        let num_end = rest
            .find(|c: char| !(c.is_ascii_digit() || c == '.'))
            .unwrap_or(rest.len());
        let (num_str, after_num) = rest.split_at(num_end);
        if num_str.is_empty() {
            return Err(Error::invalid_duration(input, "expected a number"));
        }
        let value: f64 = num_str
            .parse()
            .map_err(|_| Error::invalid_duration(input, format!("invalid number: {num_str}")))?;

        let unit_end = after_num
            .find(|c: char| c.is_ascii_digit() || c == '.')
            .unwrap_or(after_num.len());
        let (unit, after_unit) = after_num.split_at(unit_end);

        let factor_ms = match unit {
            "ms" => 1.0,
            "s" => 1_000.0,
            "m" => 60_000.0,
            "h" => 3_600_000.0,
            "" => return Err(Error::invalid_duration(input, "missing unit suffix (ms/s/m/h)")),
            other => {
                return Err(Error::invalid_duration(
                    input,
                    format!("unknown unit: {other} (expected ms/s/m/h)"),
                ));
            },
        };

        total_ms += value * factor_ms;
        rest = after_unit;
    }

    Duration::try_from_secs_f64(total_ms / 1_000.0)
        .map_err(|_| Error::invalid_duration(input, "duration out of range"))
}

/// Parse a TTL, falling back to [`DEFAULT_CACHE_TTL`] when empty or invalid.
pub fn parse_ttl_or_default(input: &str) -> Duration {
    if input.trim().is_empty() {
        return DEFAULT_CACHE_TTL;
    }
    match parse_duration(input) {
        Ok(ttl) => ttl,
        Err(e) => {
            tracing::warn!(value = input, error = %e, "invalid cache ttl, using default");
            DEFAULT_CACHE_TTL
        },
    }
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;

    #[rstest]
    #[case("500ms", Duration::from_millis(500))]
    #[case("5s", Duration::from_secs(5))]
    #[case("1.5s", Duration::from_millis(1_500))]
    #[case("2m", Duration::from_secs(120))]
    #[case("1h", Duration::from_secs(3_600))]
    #[case("1m30s", Duration::from_secs(90))]
    #[case("  10s  ", Duration::from_secs(10))]
    #[case("0s", Duration::ZERO)]
    fn parses_valid_durations(#[case] input: &str, #[case] expected: Duration) {
        assert_eq!(parse_duration(input).unwrap(), expected);
    }

    #[rstest]
    #[case("")]
    #[case("   ")]
    #[case("100")]
    #[case("10x")]
    #[case("s")]
    #[case("1.2.3s")]
    #[case("-5s")]
    fn rejects_invalid_durations(#[case] input: &str) {
        assert!(parse_duration(input).is_err(), "{input:?} should not parse");
    }

    #[test]
    fn ttl_falls_back_to_default() {
        assert_eq!(parse_ttl_or_default(""), DEFAULT_CACHE_TTL);
        assert_eq!(parse_ttl_or_default("soon"), DEFAULT_CACHE_TTL);
        assert_eq!(parse_ttl_or_default("250ms"), Duration::from_millis(250));
    }
}
