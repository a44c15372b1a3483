//! Time offset parsing and formatting utilities.
//!
//! The provider reports offsets as protobuf durations (`"12.500s"`); the
//! timeline renders whole seconds as `MM:SS`, or `HH:MM:SS` past the hour.

use thiserror::Error;

/// Format whole seconds as `[HH:]MM:SS`.
///
/// The hour field is only emitted for `seconds >= 3600`.
///
/// # Examples
/// ```
/// use vidlens_models::timestamp::format_time;
/// assert_eq!(format_time(65), "01:05");
/// assert_eq!(format_time(3661), "01:01:01");
/// ```
pub fn format_time(seconds: u64) -> String {
    let hours = seconds / 3600;
    let minutes = (seconds % 3600) / 60;
    let secs = seconds % 60;

    if hours > 0 {
        format!("{:02}:{:02}:{:02}", hours, minutes, secs)
    } else {
        format!("{:02}:{:02}", minutes, secs)
    }
}

/// Parse a protobuf JSON duration (`"5s"`, `"1.500s"`, `"-0.25s"`) into
/// `(seconds, nanos)`.
pub fn parse_duration(value: &str) -> Result<(i64, i32), TimestampError> {
    let value = value.trim();
    if value.is_empty() {
        return Err(TimestampError::Empty);
    }

    let body = value
        .strip_suffix('s')
        .ok_or_else(|| TimestampError::InvalidFormat(value.to_string()))?;

    let (negative, body) = match body.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, body),
    };

    let (whole, fraction) = body.split_once('.').unwrap_or((body, ""));

    let seconds: i64 = whole
        .parse()
        .map_err(|_| TimestampError::InvalidValue("seconds", whole.to_string()))?;

    let nanos: i32 = if fraction.is_empty() {
        0
    } else {
        if fraction.len() > 9 || !fraction.chars().all(|c| c.is_ascii_digit()) {
            return Err(TimestampError::InvalidValue("nanos", fraction.to_string()));
        }
        // Right-pad to nanosecond precision: "5" -> 500_000_000
        let padded = format!("{:0<9}", fraction);
        padded
            .parse()
            .map_err(|_| TimestampError::InvalidValue("nanos", fraction.to_string()))?
    };

    if negative {
        Ok((-seconds, -nanos))
    } else {
        Ok((seconds, nanos))
    }
}

/// Duration parsing error.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TimestampError {
    #[error("Duration cannot be empty")]
    Empty,

    #[error("Invalid {0} value: {1}")]
    InvalidValue(&'static str, String),

    #[error("Invalid duration format '{0}'. Expected a value like \"12.5s\"")]
    InvalidFormat(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_time_minutes() {
        assert_eq!(format_time(0), "00:00");
        assert_eq!(format_time(5), "00:05");
        assert_eq!(format_time(65), "01:05");
        assert_eq!(format_time(3599), "59:59");
    }

    #[test]
    fn test_format_time_hours() {
        assert_eq!(format_time(3600), "01:00:00");
        assert_eq!(format_time(3661), "01:01:01");
        assert_eq!(format_time(36_000 + 59), "10:00:59");
    }

    #[test]
    fn test_parse_duration_whole_seconds() {
        assert_eq!(parse_duration("5s").unwrap(), (5, 0));
        assert_eq!(parse_duration("0s").unwrap(), (0, 0));
    }

    #[test]
    fn test_parse_duration_fractional() {
        assert_eq!(parse_duration("1.5s").unwrap(), (1, 500_000_000));
        assert_eq!(parse_duration("12.000001s").unwrap(), (12, 1_000));
        assert_eq!(parse_duration("-0.25s").unwrap(), (0, -250_000_000));
    }

    #[test]
    fn test_parse_duration_errors() {
        assert_eq!(parse_duration(""), Err(TimestampError::Empty));
        assert!(matches!(parse_duration("12"), Err(TimestampError::InvalidFormat(_))));
        assert!(matches!(parse_duration("abc s"), Err(TimestampError::InvalidValue("seconds", _))));
        assert!(matches!(parse_duration("1.2x3s"), Err(TimestampError::InvalidValue("nanos", _))));
    }
}
