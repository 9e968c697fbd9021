use time::format_description::well_known::Rfc3339;
use time::{Date, OffsetDateTime};

/// Source of "now" for training timestamps and forecast dates.
pub trait Clock: Send + Sync {
    fn now(&self) -> OffsetDateTime;

    /// Current UTC calendar date.
    fn today(&self) -> Date {
        self.now().date()
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> OffsetDateTime {
        OffsetDateTime::now_utc()
    }
}

/// Clock frozen at one instant.
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub OffsetDateTime);

impl FixedClock {
    /// Midnight UTC on `date`.
    pub fn at_date(date: Date) -> Self {
        Self(date.midnight().assume_utc())
    }
}

impl Clock for FixedClock {
    fn now(&self) -> OffsetDateTime {
        self.0
    }
}

/// RFC 3339 rendering used for persisted timestamps.
pub fn rfc3339(at: OffsetDateTime) -> String {
    at.format(&Rfc3339)
        .unwrap_or_else(|_| at.unix_timestamp().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::{Month, Time};

    #[test]
    fn fixed_clock_reports_its_date_and_formats_utc() {
        let date = Date::from_calendar_date(2026, Month::October, 17).expect("date");
        let at = date
            .with_time(Time::from_hms(15, 30, 0).expect("time"))
            .assume_utc();
        let clock = FixedClock(at);

        assert_eq!(clock.today(), date);
        assert_eq!(rfc3339(clock.now()), "2026-10-17T15:30:00Z");
    }
}
