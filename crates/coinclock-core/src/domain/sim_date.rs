use std::fmt::{Display, Formatter};

use serde::de::Error as DeError;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use time::format_description::well_known::Rfc3339;
use time::macros::format_description;
use time::{Date, Month, OffsetDateTime, PrimitiveDateTime, Time, UtcOffset};

use crate::ValidationError;

/// A point in simulated time, always UTC.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SimDate(OffsetDateTime);

impl SimDate {
    /// Midnight UTC on the given calendar day.
    pub fn from_ymd(year: i32, month: u8, day: u8) -> Result<Self, ValidationError> {
        let invalid = || ValidationError::InvalidDate {
            value: format!("{year:04}-{month:02}-{day:02}"),
        };
        let month = Month::try_from(month).map_err(|_| invalid())?;
        let date = Date::from_calendar_date(year, month, day).map_err(|_| invalid())?;
        Ok(Self(PrimitiveDateTime::new(date, Time::MIDNIGHT).assume_utc()))
    }

    /// Parse RFC3339 (any offset, normalised to UTC) or a bare `YYYY-MM-DD`.
    ///
    /// Anything finer than a millisecond is truncated, matching the
    /// resolution of [`unix_millis`](Self::unix_millis).
    pub fn parse(input: &str) -> Result<Self, ValidationError> {
        let trimmed = input.trim();
        if let Ok(parsed) = OffsetDateTime::parse(trimmed, &Rfc3339) {
            let utc = parsed.to_offset(UtcOffset::UTC);
            return utc
                .replace_millisecond(utc.millisecond())
                .map(Self)
                .map_err(|_| ValidationError::InvalidDate {
                    value: trimmed.to_owned(),
                });
        }

        let day_format = format_description!("[year]-[month]-[day]");
        Date::parse(trimmed, &day_format)
            .map(|date| Self(PrimitiveDateTime::new(date, Time::MIDNIGHT).assume_utc()))
            .map_err(|_| ValidationError::InvalidDate {
                value: trimmed.to_owned(),
            })
    }

    pub fn from_unix_millis(millis: i64) -> Result<Self, ValidationError> {
        OffsetDateTime::from_unix_timestamp_nanos(i128::from(millis) * 1_000_000)
            .map(Self)
            .map_err(|_| ValidationError::DateOutOfRange { value: millis })
    }

    /// Milliseconds since the Unix epoch, as sent to the upstream.
    pub fn unix_millis(self) -> i64 {
        self.0.unix_timestamp_nanos().div_euclid(1_000_000) as i64
    }

    /// Exactly 24 hours later, or `None` past the supported range.
    pub fn next_day(self) -> Option<Self> {
        self.0.checked_add(time::Duration::DAY).map(Self)
    }

    pub fn into_inner(self) -> OffsetDateTime {
        self.0
    }

    pub fn format_rfc3339(self) -> String {
        self.0
            .format(&Rfc3339)
            .unwrap_or_else(|_| format!("@{}ms", self.unix_millis()))
    }
}

impl Display for SimDate {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.format_rfc3339())
    }
}

impl Serialize for SimDate {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&self.format_rfc3339())
    }
}

impl<'de> Deserialize<'de> for SimDate {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = String::deserialize(deserializer)?;
        Self::parse(&value).map_err(D::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bare_day_parses_as_midnight_utc() {
        let parsed = SimDate::parse("2014-01-01").expect("must parse");
        assert_eq!(parsed.format_rfc3339(), "2014-01-01T00:00:00Z");
        assert_eq!(parsed.unix_millis(), 1_388_534_400_000);
    }

    #[test]
    fn offset_timestamps_are_normalised_to_utc() {
        let parsed = SimDate::parse("2014-01-01T01:00:00+01:00").expect("must parse");
        assert_eq!(parsed, SimDate::from_ymd(2014, 1, 1).expect("valid"));
    }

    #[test]
    fn next_day_adds_exactly_twenty_four_hours() {
        let day = SimDate::from_ymd(2016, 2, 28).expect("valid");
        let next = day.next_day().expect("in range");
        assert_eq!(next.unix_millis() - day.unix_millis(), 86_400_000);
        assert_eq!(next, SimDate::from_ymd(2016, 2, 29).expect("leap day"));
    }

    #[test]
    fn rejects_garbage_and_impossible_days() {
        assert!(SimDate::parse("yesterday").is_err());
        assert!(SimDate::from_ymd(2014, 2, 30).is_err());
        assert!(SimDate::from_ymd(2014, 13, 1).is_err());
    }

    #[test]
    fn sub_millisecond_digits_are_truncated() {
        let parsed = SimDate::parse("2014-01-01T00:00:00.0005Z").expect("must parse");
        assert_eq!(parsed, SimDate::from_ymd(2014, 1, 1).expect("valid"));

        let parsed = SimDate::parse("2014-01-01T00:00:00.123987Z").expect("must parse");
        assert_eq!(parsed.unix_millis(), 1_388_534_400_123);
        assert_eq!(SimDate::from_unix_millis(parsed.unix_millis()), Ok(parsed));
    }

    #[test]
    fn millis_round_trip() {
        let day = SimDate::from_ymd(2020, 5, 17).expect("valid");
        let back = SimDate::from_unix_millis(day.unix_millis()).expect("in range");
        assert_eq!(back, day);
    }
}
