//! Calendar-month handling and CF time decoding for monthly climate data.

use chrono::{Datelike, Duration, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use std::fmt;

/// A calendar month of a specific year.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct YearMonth {
    pub year: i32,
    pub month: u32,
}

impl YearMonth {
    /// Create a year/month pair; `month` must be 1-12.
    pub fn new(year: i32, month: u32) -> Result<Self, TimeParseError> {
        if !(1..=12).contains(&month) {
            return Err(TimeParseError::InvalidMonth(month));
        }
        Ok(Self { year, month })
    }

    /// Whether a timestamp falls inside this calendar month.
    pub fn contains(&self, dt: &NaiveDateTime) -> bool {
        dt.year() == self.year && dt.month() == self.month
    }

    /// The following calendar month.
    pub fn succ(&self) -> Self {
        if self.month == 12 {
            Self {
                year: self.year + 1,
                month: 1,
            }
        } else {
            Self {
                year: self.year,
                month: self.month + 1,
            }
        }
    }

    /// Months elapsed since year 0, used for range arithmetic.
    fn ordinal(&self) -> i64 {
        self.year as i64 * 12 + (self.month as i64 - 1)
    }
}

impl fmt::Display for YearMonth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{:02}", self.year, self.month)
    }
}

impl From<NaiveDate> for YearMonth {
    fn from(date: NaiveDate) -> Self {
        Self {
            year: date.year(),
            month: date.month(),
        }
    }
}

/// An inclusive range of calendar months, iterated in chronological order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MonthRange {
    pub start: YearMonth,
    pub end: YearMonth,
}

impl MonthRange {
    pub fn new(start: YearMonth, end: YearMonth) -> Self {
        Self { start, end }
    }

    /// January of `start_year` through December of `end_year`.
    pub fn years(start_year: i32, end_year: i32) -> Self {
        Self {
            start: YearMonth {
                year: start_year,
                month: 1,
            },
            end: YearMonth {
                year: end_year,
                month: 12,
            },
        }
    }

    /// Number of months in the range (0 when end precedes start).
    pub fn len(&self) -> usize {
        (self.end.ordinal() - self.start.ordinal() + 1).max(0) as usize
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn iter(&self) -> impl Iterator<Item = YearMonth> {
        let mut next = self.start;
        let count = self.len();
        (0..count).map(move |_| {
            let current = next;
            next = next.succ();
            current
        })
    }
}

#[derive(Debug, thiserror::Error, PartialEq)]
pub enum TimeParseError {
    #[error("Invalid time format: {0}")]
    InvalidFormat(String),

    #[error("Unsupported time unit: {0}")]
    UnsupportedUnit(String),

    #[error("Month out of range: {0}")]
    InvalidMonth(u32),
}

/// Unit of a CF `"<unit> since <epoch>"` time axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CfUnit {
    Days,
    Hours,
    Minutes,
    Seconds,
}

impl CfUnit {
    fn millis(&self) -> f64 {
        match self {
            CfUnit::Days => 86_400_000.0,
            CfUnit::Hours => 3_600_000.0,
            CfUnit::Minutes => 60_000.0,
            CfUnit::Seconds => 1_000.0,
        }
    }
}

/// Parsed CF time units, e.g. `days since 1800-01-01 00:00:00`.
///
/// Offsets are decoded on the proleptic Gregorian calendar.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CfTimeUnits {
    pub unit: CfUnit,
    pub epoch: NaiveDateTime,
}

impl CfTimeUnits {
    pub fn parse(units: &str) -> Result<Self, TimeParseError> {
        let (unit_str, epoch_str) = units
            .split_once(" since ")
            .ok_or_else(|| TimeParseError::InvalidFormat(units.to_string()))?;

        let unit = match unit_str.trim().to_ascii_lowercase().as_str() {
            "days" | "day" | "d" => CfUnit::Days,
            "hours" | "hour" | "h" => CfUnit::Hours,
            "minutes" | "minute" | "min" => CfUnit::Minutes,
            "seconds" | "second" | "s" => CfUnit::Seconds,
            other => return Err(TimeParseError::UnsupportedUnit(other.to_string())),
        };

        let epoch = parse_epoch(epoch_str.trim())
            .ok_or_else(|| TimeParseError::InvalidFormat(units.to_string()))?;

        Ok(Self { unit, epoch })
    }

    /// Convert a raw axis value to a timestamp.
    pub fn decode(&self, offset: f64) -> Option<NaiveDateTime> {
        if !offset.is_finite() {
            return None;
        }
        let millis = (offset * self.unit.millis()).round();
        if millis.abs() >= i64::MAX as f64 {
            return None;
        }
        self.epoch
            .checked_add_signed(Duration::try_milliseconds(millis as i64)?)
    }
}

fn parse_epoch(s: &str) -> Option<NaiveDateTime> {
    let s = s
        .trim_end_matches(" UTC")
        .trim_end_matches('Z')
        .trim();

    const FORMATS: [&str; 4] = [
        "%Y-%m-%d %H:%M:%S%.f",
        "%Y-%m-%dT%H:%M:%S%.f",
        "%Y-%m-%d %H:%M",
        "%Y-%m-%dT%H:%M",
    ];

    FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(s, fmt).ok())
        .or_else(|| {
            NaiveDate::parse_from_str(s, "%Y-%m-%d")
                .ok()
                .and_then(|d| d.and_hms_opt(0, 0, 0))
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Timelike;

    #[test]
    fn test_year_month_display() {
        let ym = YearMonth::new(2000, 3).unwrap();
        assert_eq!(ym.to_string(), "2000-03");
    }

    #[test]
    fn test_year_month_rejects_bad_month() {
        assert_eq!(YearMonth::new(2000, 13), Err(TimeParseError::InvalidMonth(13)));
        assert_eq!(YearMonth::new(2000, 0), Err(TimeParseError::InvalidMonth(0)));
    }

    #[test]
    fn test_succ_wraps_year() {
        let dec = YearMonth::new(1999, 12).unwrap();
        assert_eq!(dec.succ(), YearMonth::new(2000, 1).unwrap());
    }

    #[test]
    fn test_parse_noaa_units() {
        let units = CfTimeUnits::parse("days since 1800-01-01 00:00:00").unwrap();
        assert_eq!(units.unit, CfUnit::Days);
        assert_eq!(units.epoch.year(), 1800);

        let dt = units.decode(73048.0).unwrap();
        assert_eq!((dt.year(), dt.month(), dt.day()), (2000, 1, 1));
    }

    #[test]
    fn test_parse_hours_with_t_separator() {
        let units = CfTimeUnits::parse("hours since 1970-01-01T00:00:00Z").unwrap();
        let dt = units.decode(36.5).unwrap();
        assert_eq!((dt.day(), dt.hour(), dt.minute()), (2, 12, 30));
    }

    #[test]
    fn test_parse_date_only_epoch() {
        let units = CfTimeUnits::parse("seconds since 2023-01-01").unwrap();
        assert_eq!(units.unit, CfUnit::Seconds);
        assert_eq!(units.decode(60.0).unwrap().minute(), 1);
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert!(matches!(
            CfTimeUnits::parse("fortnights since 1800-01-01"),
            Err(TimeParseError::UnsupportedUnit(_))
        ));
        assert!(matches!(
            CfTimeUnits::parse("days after 1800-01-01"),
            Err(TimeParseError::InvalidFormat(_))
        ));
        assert!(CfTimeUnits::parse("days since yesterday").is_err());
    }

    #[test]
    fn test_decode_non_finite() {
        let units = CfTimeUnits::parse("days since 1800-01-01").unwrap();
        assert_eq!(units.decode(f64::NAN), None);
    }

    #[test]
    fn test_decode_out_of_range_offsets() {
        let units = CfTimeUnits::parse("seconds since 1970-01-01").unwrap();
        assert_eq!(units.decode(-9.223372036854776e15), None);
        assert_eq!(units.decode(9.223372036854776e15), None);
        assert_eq!(units.decode(-1.0e300), None);
    }
}
