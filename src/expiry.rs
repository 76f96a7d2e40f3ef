//! Absolute expiry timestamps and relative code lifetimes.

use chrono::{DateTime, Duration, NaiveDate, NaiveDateTime, SecondsFormat, Utc};
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum LifetimeError {
    #[error("Invalid duration format \"{0}\". Use e.g. 7d (days) or 48h (hours)")]
    Format(String),

    #[error("Duration \"{0}\" is too large")]
    Overflow(String),
}

/// Parse a configured expiry.
///
/// Accepts RFC 3339 (seconds optional), a naive `YYYY-MM-DDTHH:MM[:SS]` and
/// a bare `YYYY-MM-DD`; the last two are read as UTC. Anything else yields
/// `None`, which callers treat as already expired.
pub fn parse_instant(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if let Ok(instant) = DateTime::parse_from_rfc3339(raw) {
        return Some(instant.with_timezone(&Utc));
    }
    // %#z takes `Z` as well as `+02:00` and `+0200`
    if let Ok(instant) = DateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M%#z") {
        return Some(instant.with_timezone(&Utc));
    }
    for format in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%dT%H:%M"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(raw, format) {
            return Some(naive.and_utc());
        }
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}

/// Render an instant the way stored expiries are written: UTC, milliseconds, `Z`.
pub fn format_instant(instant: DateTime<Utc>) -> String {
    instant.to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Parse a lifetime such as `7d` or `48h`.
pub fn parse_lifetime(raw: &str) -> Result<Duration, LifetimeError> {
    let format_err = || LifetimeError::Format(raw.to_string());
    let trimmed = raw.trim();
    let unit = trimmed.chars().last().ok_or_else(format_err)?;
    let digits = &trimmed[..trimmed.len() - unit.len_utf8()];
    if digits.is_empty() || !digits.chars().all(|c| c.is_ascii_digit()) {
        return Err(format_err());
    }
    let value: i64 = digits
        .parse()
        .map_err(|_| LifetimeError::Overflow(raw.to_string()))?;

    let lifetime = match unit.to_ascii_lowercase() {
        'h' => Duration::try_hours(value),
        'd' => Duration::try_days(value),
        _ => return Err(format_err()),
    };
    lifetime.ok_or_else(|| LifetimeError::Overflow(raw.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use rstest::rstest;

    #[rstest]
    #[case("2099-01-01T00:00:00Z", Some((2099, 1, 1, 0)))]
    #[case("2026-03-15T10:00:00.000Z", Some((2026, 3, 15, 10)))]
    #[case("2026-03-15T12:00:00+02:00", Some((2026, 3, 15, 10)))]
    #[case("2026-03-15T10:00:00", Some((2026, 3, 15, 10)))]
    #[case("2099-01-01T00:00Z", Some((2099, 1, 1, 0)))]
    #[case("2026-03-15T12:00+02:00", Some((2026, 3, 15, 10)))]
    #[case("2026-03-15T12:00+0200", Some((2026, 3, 15, 10)))]
    #[case("2026-03-15T10:00", Some((2026, 3, 15, 10)))]
    #[case("2026-03-15", Some((2026, 3, 15, 0)))]
    #[case("", None)]
    #[case("next tuesday", None)]
    #[case("2026-13-01", None)]
    #[case("2026-03-15T10", None)]
    #[case("2026-03-15T25:00Z", None)]
    fn test_parse_instant(#[case] raw: &str, #[case] expected: Option<(i32, u32, u32, u32)>) {
        let expected = expected.map(|(y, m, d, h)| Utc.with_ymd_and_hms(y, m, d, h, 0, 0).unwrap());
        assert_eq!(parse_instant(raw), expected);
    }

    #[test]
    fn test_format_instant_uses_millis() {
        let instant = Utc.with_ymd_and_hms(2026, 3, 15, 0, 0, 0).unwrap();
        assert_eq!(format_instant(instant), "2026-03-15T00:00:00.000Z");
        assert_eq!(parse_instant(&format_instant(instant)), Some(instant));
    }

    #[rstest]
    #[case("7d", Duration::days(7))]
    #[case("30D", Duration::days(30))]
    #[case("48h", Duration::hours(48))]
    #[case("0h", Duration::zero())]
    fn test_parse_lifetime(#[case] raw: &str, #[case] expected: Duration) {
        assert_eq!(parse_lifetime(raw), Ok(expected));
    }

    #[rstest]
    #[case("")]
    #[case("d")]
    #[case("7")]
    #[case("7w")]
    #[case("-7d")]
    #[case("1.5d")]
    #[case("7 d")]
    fn test_parse_lifetime_rejects_bad_format(#[case] raw: &str) {
        assert_eq!(parse_lifetime(raw), Err(LifetimeError::Format(raw.to_string())));
    }

    #[test]
    fn test_parse_lifetime_overflow() {
        assert!(matches!(
            parse_lifetime("99999999999999999999d"),
            Err(LifetimeError::Overflow(_))
        ));
        assert!(matches!(
            parse_lifetime("9223372036854775807d"),
            Err(LifetimeError::Overflow(_))
        ));
    }
}
