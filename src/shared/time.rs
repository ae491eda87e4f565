use std::{fmt::Display, str::FromStr};

use chrono::{Datelike, NaiveDate, NaiveDateTime, TimeDelta};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// The instant a tap happened, on the calendar of the network.
pub type Timestamp = NaiveDateTime;

const DAY_FORMAT: &str = "%Y-%m-%d";

/// A calendar day, the key of every per-day aggregate.
///
/// Renders and parses as `YYYY-MM-DD`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Day(NaiveDate);

impl Day {
    pub const fn new(date: NaiveDate) -> Self {
        Self(date)
    }

    pub fn from_ymd(year: i32, month: u32, day: u32) -> Option<Self> {
        NaiveDate::from_ymd_opt(year, month, day).map(Self)
    }

    pub fn of(instant: &Timestamp) -> Self {
        Self(instant.date())
    }

    pub const fn date(&self) -> NaiveDate {
        self.0
    }

    pub fn year(&self) -> i32 {
        self.0.year()
    }

    pub fn month(&self) -> u32 {
        self.0.month()
    }

    /// Whole days from `earlier` to `self`, negative when `earlier` is later.
    pub fn days_since(&self, earlier: Day) -> i64 {
        (self.0 - earlier.0).num_days()
    }

    /// The day `days` before this one, clamped to the earliest representable day.
    pub fn days_before(&self, days: i64) -> Day {
        Self(
            TimeDelta::try_days(days)
                .and_then(|delta| self.0.checked_sub_signed(delta))
                .unwrap_or(NaiveDate::MIN),
        )
    }

    pub fn to_day_string(&self) -> String {
        self.0.format(DAY_FORMAT).to_string()
    }

    pub fn from_day_str(day: &str) -> Option<Self> {
        NaiveDate::parse_from_str(day, DAY_FORMAT).ok().map(Self)
    }
}

impl From<NaiveDate> for Day {
    fn from(value: NaiveDate) -> Self {
        Self(value)
    }
}

impl From<&Timestamp> for Day {
    fn from(value: &Timestamp) -> Self {
        Self::of(value)
    }
}

impl Display for Day {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0.format(DAY_FORMAT))
    }
}

impl FromStr for Day {
    type Err = chrono::ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        NaiveDate::parse_from_str(s, DAY_FORMAT).map(Self)
    }
}

impl Serialize for Day {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Day {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

/// Whole minutes elapsed from `from` to `to`, truncated toward zero.
pub fn elapsed_minutes(from: &Timestamp, to: &Timestamp) -> i64 {
    (*to - *from).num_minutes()
}

pub fn seconds(secs: i64) -> TimeDelta {
    TimeDelta::seconds(secs)
}

#[test]
fn parse_unparse_1() {
    let day = "2024-03-09";
    let parsed = Day::from_day_str(day).unwrap();
    assert_eq!(day, parsed.to_day_string())
}

#[test]
fn parse_unparse_2() {
    let day = "1999-12-31";
    let parsed: Day = day.parse().unwrap();
    assert_eq!(day, parsed.to_string())
}

#[test]
fn invalid_day_test_1() {
    assert!(Day::from_day_str("2024-13-01").is_none())
}

#[test]
fn invalid_day_test_2() {
    assert!(Day::from_day_str("2024-03").is_none())
}

#[test]
fn day_of_instant_drops_time() {
    let instant = NaiveDate::from_ymd_opt(2024, 3, 9)
        .unwrap()
        .and_hms_opt(23, 59, 59)
        .unwrap();
    assert_eq!(Day::of(&instant).to_day_string(), "2024-03-09");
}

#[test]
fn days_since_counts_calendar_days() {
    let start = Day::from_ymd(2024, 2, 27).unwrap();
    let end = Day::from_ymd(2024, 3, 6).unwrap();
    assert_eq!(end.days_since(start), 8);
    assert_eq!(start.days_since(end), -8);
}

#[test]
fn elapsed_minutes_truncates() {
    let day = NaiveDate::from_ymd_opt(2024, 3, 9).unwrap();
    let a = day.and_hms_opt(8, 0, 0).unwrap();
    let b = day.and_hms_opt(10, 0, 59).unwrap();
    assert_eq!(elapsed_minutes(&a, &b), 120);
}
