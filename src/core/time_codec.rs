//! Time-of-day codec: wire text <-> canonical integer offsets.
//!
//! Wire values are `"HH:mm:ss"` or `"HH:mm"` (a missing seconds field is
//! treated as `:00`). In memory a time of day is an offset from midnight,
//! either in seconds or in minutes depending on the field.
//!
//! Formatting convention:
//! - [`TimeUnit::Seconds`] -> `"HH:mm:ss"`
//! - [`TimeUnit::Minutes`] -> `"HH:mm"`

use thiserror::Error;

pub const SECONDS_PER_DAY: u32 = 24 * 60 * 60;
pub const MINUTES_PER_DAY: u32 = 24 * 60;

/// Resolution of a canonical time-of-day offset.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimeUnit {
    Seconds,
    Minutes,
}

impl TimeUnit {
    /// Number of units in one day.
    pub fn per_day(self) -> u32 {
        match self {
            TimeUnit::Seconds => SECONDS_PER_DAY,
            TimeUnit::Minutes => MINUTES_PER_DAY,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TimeParseError {
    #[error("expected HH:mm or HH:mm:ss, got {0} field(s)")]
    FieldCount(usize),
    #[error("non-numeric field '{0}'")]
    NotNumeric(String),
    #[error("{field} out of range: {value}")]
    OutOfRange { field: &'static str, value: u32 },
}

/// Parse `"HH:mm:ss"` / `"HH:mm"` into an offset from midnight.
pub fn parse_time_of_day(text: &str, unit: TimeUnit) -> Result<u32, TimeParseError> {
    let fields: Vec<&str> = text.trim().split(':').collect();
    let (h, m, s) = match fields.as_slice() {
        [h, m] => (*h, *m, "00"),
        [h, m, s] => (*h, *m, *s),
        other => return Err(TimeParseError::FieldCount(other.len())),
    };

    let hours = parse_field(h)?;
    let minutes = parse_field(m)?;
    let seconds = parse_field(s)?;

    if hours > 23 {
        return Err(TimeParseError::OutOfRange { field: "hours", value: hours });
    }
    if minutes > 59 {
        return Err(TimeParseError::OutOfRange { field: "minutes", value: minutes });
    }
    if seconds > 59 {
        return Err(TimeParseError::OutOfRange { field: "seconds", value: seconds });
    }

    Ok(match unit {
        TimeUnit::Seconds => hours * 3600 + minutes * 60 + seconds,
        // Seconds are validated but do not survive minute resolution
        TimeUnit::Minutes => hours * 60 + minutes,
    })
}

/// Optional variant for wire fields: missing or blank text is "no value".
pub fn parse_optional(text: Option<&str>, unit: TimeUnit) -> Result<Option<u32>, TimeParseError> {
    match text.map(str::trim) {
        None | Some("") => Ok(None),
        Some(t) => parse_time_of_day(t, unit).map(Some),
    }
}

/// Format an offset from midnight. Values past the end of the day are clamped
/// to the last representable instant.
pub fn format_time_of_day(value: u32, unit: TimeUnit) -> String {
    let value = value.min(unit.per_day() - 1);
    match unit {
        TimeUnit::Seconds => format!(
            "{:02}:{:02}:{:02}",
            value / 3600,
            (value % 3600) / 60,
            value % 60
        ),
        TimeUnit::Minutes => format!("{:02}:{:02}", value / 60, value % 60),
    }
}

fn parse_field(field: &str) -> Result<u32, TimeParseError> {
    // u32::from_str accepts a leading '+', reject it along with everything non-digit
    if field.is_empty() || !field.bytes().all(|b| b.is_ascii_digit()) {
        return Err(TimeParseError::NotNumeric(field.to_string()));
    }
    field
        .parse::<u32>()
        .map_err(|_| TimeParseError::NotNumeric(field.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_seconds() {
        assert_eq!(parse_time_of_day("00:00:00", TimeUnit::Seconds), Ok(0));
        assert_eq!(parse_time_of_day("14:30:15", TimeUnit::Seconds), Ok(52215));
        assert_eq!(parse_time_of_day("23:59:59", TimeUnit::Seconds), Ok(86399));
    }

    #[test]
    fn test_two_fields_get_zero_seconds() {
        assert_eq!(parse_time_of_day("14:30", TimeUnit::Seconds), Ok(52200));
        assert_eq!(parse_time_of_day("14:30", TimeUnit::Minutes), Ok(870));
        assert_eq!(parse_time_of_day(" 9:05 ", TimeUnit::Minutes), Ok(545));
    }

    #[test]
    fn test_minutes_drop_seconds() {
        assert_eq!(parse_time_of_day("15:30:45", TimeUnit::Minutes), Ok(930));
    }

    #[test]
    fn test_parse_failures() {
        assert_eq!(
            parse_time_of_day("14", TimeUnit::Seconds),
            Err(TimeParseError::FieldCount(1))
        );
        assert_eq!(
            parse_time_of_day("1:2:3:4", TimeUnit::Seconds),
            Err(TimeParseError::FieldCount(4))
        );
        assert!(matches!(
            parse_time_of_day("ab:30", TimeUnit::Minutes),
            Err(TimeParseError::NotNumeric(_))
        ));
        assert!(matches!(
            parse_time_of_day("-1:30", TimeUnit::Minutes),
            Err(TimeParseError::NotNumeric(_))
        ));
        assert!(matches!(
            parse_time_of_day("12:", TimeUnit::Minutes),
            Err(TimeParseError::NotNumeric(_))
        ));
        assert_eq!(
            parse_time_of_day("12:60", TimeUnit::Minutes),
            Err(TimeParseError::OutOfRange { field: "minutes", value: 60 })
        );
        assert_eq!(
            parse_time_of_day("12:00:75", TimeUnit::Seconds),
            Err(TimeParseError::OutOfRange { field: "seconds", value: 75 })
        );
        assert_eq!(
            parse_time_of_day("24:00", TimeUnit::Seconds),
            Err(TimeParseError::OutOfRange { field: "hours", value: 24 })
        );
    }

    #[test]
    fn test_blank_is_none_not_zero() {
        assert_eq!(parse_optional(None, TimeUnit::Seconds), Ok(None));
        assert_eq!(parse_optional(Some(""), TimeUnit::Seconds), Ok(None));
        assert_eq!(parse_optional(Some("   "), TimeUnit::Minutes), Ok(None));
        assert_eq!(parse_optional(Some("08:15"), TimeUnit::Minutes), Ok(Some(495)));
        assert!(parse_optional(Some("8h15"), TimeUnit::Minutes).is_err());
    }

    #[test]
    fn test_format() {
        assert_eq!(format_time_of_day(0, TimeUnit::Seconds), "00:00:00");
        assert_eq!(format_time_of_day(52215, TimeUnit::Seconds), "14:30:15");
        assert_eq!(format_time_of_day(870, TimeUnit::Minutes), "14:30");
        assert_eq!(format_time_of_day(5, TimeUnit::Minutes), "00:05");
        // Clamped into the day
        assert_eq!(format_time_of_day(100_000, TimeUnit::Seconds), "23:59:59");
        assert_eq!(format_time_of_day(2000, TimeUnit::Minutes), "23:59");
    }

    #[test]
    fn test_seconds_round_trip_every_minute_boundary() {
        for h in 0..24 {
            for m in 0..60 {
                let text = format!("{:02}:{:02}:{:02}", h, m, (h + m) % 60);
                let value = parse_time_of_day(&text, TimeUnit::Seconds).unwrap();
                assert_eq!(format_time_of_day(value, TimeUnit::Seconds), text);
            }
        }
    }

    #[test]
    fn test_short_form_reparses_to_same_offset() {
        for text in ["00:00", "07:45", "14:30", "23:59"] {
            for unit in [TimeUnit::Seconds, TimeUnit::Minutes] {
                let value = parse_time_of_day(text, unit).unwrap();
                let formatted = format_time_of_day(value, unit);
                assert_eq!(parse_time_of_day(&formatted, unit).unwrap(), value);
            }
        }
    }
}
