use anyhow::{anyhow, Result};
use chrono::{DateTime, Duration, Local, NaiveDate, NaiveDateTime, NaiveTime};

/// Canonical persisted form of a reminder time.
pub const REMINDER_TIME_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";

const ABSOLUTE_FORMATS: [&str; 4] = [
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%d %H:%M",
];

pub fn parse_duration(input: &str) -> Result<Duration> {
    let input = input.trim();
    let (idx, unit) = input
        .char_indices()
        .last()
        .ok_or_else(|| anyhow!("Empty duration string"))?;
    let num: i64 = input[..idx]
        .parse()
        .map_err(|_| anyhow!("Invalid duration number"))?;

    let duration = match unit.to_ascii_lowercase() {
        'm' => Duration::try_minutes(num),
        'h' => Duration::try_hours(num),
        'd' => Duration::try_days(num),
        'w' => Duration::try_weeks(num),
        _ => return Err(anyhow!("Unknown duration unit: {}", unit)),
    };
    duration.ok_or_else(|| anyhow!("Duration out of range: {}", input))
}

/// Parses a reminder time as typed by a user, relative to the local clock.
pub fn parse_reminder_time(input: &str) -> Result<NaiveDateTime> {
    parse_reminder_time_at(input, Local::now().naive_local())
}

/// Like [`parse_reminder_time`], with an explicit "now" for relative forms
/// (`now`, `+30m`, `+2h`, `+1d`, `+1w`).
pub fn parse_reminder_time_at(input: &str, now: NaiveDateTime) -> Result<NaiveDateTime> {
    let input = input.trim();

    if input.eq_ignore_ascii_case("now") {
        return Ok(now);
    }

    if let Some(rest) = input.strip_prefix('+') {
        let offset = parse_duration(rest)?;
        return now
            .checked_add_signed(offset)
            .ok_or_else(|| anyhow!("Reminder time out of range: {}", input));
    }

    parse_absolute_time(input)
}

/// Parses the ISO-8601 shapes accepted in the persisted slot.
///
/// Zoned RFC 3339 values are converted to local wall-clock time. A bare date
/// means the end of that day.
pub fn parse_absolute_time(input: &str) -> Result<NaiveDateTime> {
    let input = input.trim();

    for format in ABSOLUTE_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(input, format) {
            return Ok(dt);
        }
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(input) {
        return Ok(dt.with_timezone(&Local).naive_local());
    }
    if let Ok(d) = NaiveDate::parse_from_str(input, "%Y-%m-%d") {
        return Ok(end_of_day(d));
    }

    Err(anyhow!("Could not parse reminder time: {}", input))
}

pub fn format_reminder_time(time: &NaiveDateTime) -> String {
    time.format(REMINDER_TIME_FORMAT).to_string()
}

fn end_of_day(date: NaiveDate) -> NaiveDateTime {
    date.and_time(NaiveTime::from_hms_opt(23, 59, 59).unwrap_or(NaiveTime::MIN))
}

/// Serde adapter for the `reminderTime` key.
pub(crate) mod reminder_time_serde {
    use chrono::NaiveDateTime;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(time: &NaiveDateTime, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_str(&super::format_reminder_time(time))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<NaiveDateTime, D::Error> {
        let raw = String::deserialize(d)?;
        super::parse_absolute_time(&raw).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(s: &str) -> NaiveDateTime {
        NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S").unwrap()
    }

    #[test]
    fn test_parse_duration() {
        assert_eq!(parse_duration("30m").unwrap(), Duration::minutes(30));
        assert_eq!(parse_duration("2H").unwrap(), Duration::hours(2));
        assert_eq!(parse_duration("1w").unwrap(), Duration::weeks(1));
        assert!(parse_duration("").is_err());
        assert!(parse_duration("5x").is_err());
        assert!(parse_duration("é").is_err());
    }

    #[test]
    fn test_huge_duration_is_an_error() {
        assert!(parse_duration("9999999999999999w").is_err());
        assert!(parse_duration("9223372036854775807m").is_err());
        let now = at("2024-03-10 08:15:00");
        assert!(parse_reminder_time_at("+9999999999999999w", now).is_err());
    }

    #[test]
    fn test_parse_datetime_local_shapes() {
        let expected = at("2024-01-01 10:00:00");
        assert_eq!(parse_absolute_time("2024-01-01T10:00").unwrap(), expected);
        assert_eq!(parse_absolute_time("2024-01-01T10:00:00").unwrap(), expected);
        assert_eq!(parse_absolute_time("2024-01-01 10:00").unwrap(), expected);
        assert_eq!(parse_absolute_time("2024-01-01").unwrap(), at("2024-01-01 23:59:59"));
        assert!(parse_absolute_time("yesterday-ish").is_err());
    }

    #[test]
    fn test_relative_forms_use_anchor() {
        let now = at("2024-03-10 08:15:00");
        assert_eq!(parse_reminder_time_at("now", now).unwrap(), now);
        assert_eq!(parse_reminder_time_at("+45m", now).unwrap(), at("2024-03-10 09:00:00"));
        assert_eq!(parse_reminder_time_at("+1d", now).unwrap(), at("2024-03-11 08:15:00"));
        assert!(parse_reminder_time_at("+", now).is_err());
    }

    #[test]
    fn test_format_is_reparseable() {
        let t = at("2024-12-31 23:05:00");
        assert_eq!(format_reminder_time(&t), "2024-12-31T23:05:00");
        assert_eq!(parse_absolute_time(&format_reminder_time(&t)).unwrap(), t);
    }
}
