//! Legacy seven-field calendar timestamps.

use chrono::{Datelike, NaiveDate, NaiveDateTime, Timelike};
use std::fmt;

/// A local timestamp with millisecond precision.
///
/// Stored as `year.month.day.hour.minute.second.millisecond`, where the
/// month is zero-based (January is `0`). Anything finer than a millisecond
/// is dropped on construction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct CalendarStamp(NaiveDateTime);

impl CalendarStamp {
    /// Creates a stamp from a date-time, truncated to milliseconds.
    #[must_use]
    pub fn new(datetime: NaiveDateTime) -> Self {
        let millis = datetime.nanosecond() / 1_000_000;
        Self(
            datetime
                .with_nanosecond(millis * 1_000_000)
                .unwrap_or(datetime),
        )
    }

    /// Creates a stamp from its stored fields. `month0` is zero-based.
    ///
    /// Returns `None` if the fields do not name a real instant.
    #[must_use]
    pub fn from_fields(
        year: i32,
        month0: u32,
        day: u32,
        hour: u32,
        minute: u32,
        second: u32,
        millisecond: u32,
    ) -> Option<Self> {
        if millisecond >= 1000 {
            return None;
        }
        NaiveDate::from_ymd_opt(year, month0.checked_add(1)?, day)?
            .and_hms_milli_opt(hour, minute, second, millisecond)
            .map(Self)
    }

    /// Returns the underlying date-time.
    #[must_use]
    pub fn datetime(&self) -> NaiveDateTime {
        self.0
    }

    /// Returns the millisecond field.
    #[must_use]
    pub fn millisecond(&self) -> u32 {
        (self.0.nanosecond() / 1_000_000).min(999)
    }

    /// Parses the dotted seven-field form.
    #[must_use]
    pub fn parse(text: &str) -> Option<Self> {
        let mut parts = text.split('.');
        let year = parts.next()?.parse().ok()?;
        let mut fields = [0u32; 6];
        for field in &mut fields {
            *field = parts.next()?.parse().ok()?;
        }
        if parts.next().is_some() {
            return None;
        }
        let [month0, day, hour, minute, second, millisecond] = fields;
        Self::from_fields(year, month0, day, hour, minute, second, millisecond)
    }
}

impl From<NaiveDateTime> for CalendarStamp {
    fn from(datetime: NaiveDateTime) -> Self {
        Self::new(datetime)
    }
}

impl fmt::Display for CalendarStamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}.{}.{}.{}.{}.{}.{}",
            self.0.year(),
            self.0.month0(),
            self.0.day(),
            self.0.hour(),
            self.0.minute(),
            self.0.second(),
            self.millisecond()
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_uses_zero_based_month() {
        let stamp = CalendarStamp::from_fields(2020, 0, 31, 13, 5, 9, 7).unwrap();
        assert_eq!(stamp.to_string(), "2020.0.31.13.5.9.7");
        assert_eq!(stamp.datetime().month(), 1);
    }

    #[test]
    fn parse_display_output() {
        let stamp = CalendarStamp::from_fields(1999, 11, 31, 23, 59, 59, 999).unwrap();
        assert_eq!(CalendarStamp::parse(&stamp.to_string()), Some(stamp));
    }

    #[test]
    fn parse_rejects_bad_fields() {
        assert_eq!(CalendarStamp::parse("2020.12.1.0.0.0.0"), None);
        assert_eq!(CalendarStamp::parse("2020.1.1.0.0.0"), None);
        assert_eq!(CalendarStamp::parse("2020.1.1.0.0.0.0.0"), None);
        assert_eq!(CalendarStamp::parse("2020.x.1.0.0.0.0"), None);
        assert_eq!(CalendarStamp::parse("2020.1.1.0.0.0.1000"), None);
    }

    #[test]
    fn new_truncates_to_milliseconds() {
        let datetime = NaiveDate::from_ymd_opt(2021, 6, 1)
            .unwrap()
            .and_hms_nano_opt(8, 30, 0, 123_456_789)
            .unwrap();
        let stamp = CalendarStamp::new(datetime);
        assert_eq!(stamp.millisecond(), 123);
        assert_eq!(stamp.datetime().nanosecond(), 123_000_000);
    }
}
