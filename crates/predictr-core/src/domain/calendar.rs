//! Day-granular date helpers shared by price series and forecasts.

use time::{Date, Month, OffsetDateTime, Time};

use crate::ValidationError;

/// Format a date as `YYYY-MM-DD`.
pub fn format_date(date: Date) -> String {
    format!(
        "{:04}-{:02}-{:02}",
        date.year(),
        u8::from(date.month()),
        date.day()
    )
}

/// Parse a `YYYY-MM-DD` date.
pub fn parse_date(input: &str) -> Result<Date, ValidationError> {
    let invalid = || ValidationError::InvalidDate {
        value: input.to_owned(),
    };

    let mut parts = input.trim().splitn(3, '-');
    let year = parts
        .next()
        .and_then(|part| part.parse::<i32>().ok())
        .ok_or_else(invalid)?;
    let month = parts
        .next()
        .and_then(|part| part.parse::<u8>().ok())
        .and_then(|month| Month::try_from(month).ok())
        .ok_or_else(invalid)?;
    let day = parts
        .next()
        .and_then(|part| part.parse::<u8>().ok())
        .ok_or_else(invalid)?;

    Date::from_calendar_date(year, month, day).map_err(|_| invalid())
}

/// Unix timestamp of midnight UTC at the start of `date`.
pub fn unix_midnight(date: Date) -> i64 {
    date.with_time(Time::MIDNIGHT).assume_utc().unix_timestamp()
}

/// UTC calendar date of a unix timestamp.
pub fn date_from_unix(timestamp: i64) -> Option<Date> {
    OffsetDateTime::from_unix_timestamp(timestamp)
        .ok()
        .map(OffsetDateTime::date)
}

/// Serde adapter storing a [`Date`] as `YYYY-MM-DD`.
pub mod iso_date {
    use serde::{Deserialize, Deserializer, Serializer};
    use time::Date;

    pub fn serialize<S>(date: &Date, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&super::format_date(*date))
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Date, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        super::parse_date(&raw).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn formats_and_parses_dates() {
        let date = parse_date("2020-01-02").expect("valid date");
        assert_eq!(format_date(date), "2020-01-02");
        assert!(parse_date("2020-13-01").is_err());
        assert!(parse_date("yesterday").is_err());
    }

    #[test]
    fn unix_midnight_round_trips_to_same_date() {
        let date = parse_date("2024-02-29").expect("leap day");
        let ts = unix_midnight(date);
        assert_eq!(ts % 86_400, 0);
        assert_eq!(date_from_unix(ts), Some(date));
    }
}
