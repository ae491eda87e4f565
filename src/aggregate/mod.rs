mod owner;

pub use owner::*;

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::shared::{Day, Fare};

/// Taps and money charged on one day.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct DailyTally {
    pub taps: u32,
    pub total: Fare,
}

impl DailyTally {
    pub fn record(&mut self, fare: Fare) {
        self.taps += 1;
        self.total += fare;
    }

    pub fn merge(&mut self, other: &Self) {
        self.taps += other.taps;
        self.total += other.total;
    }

    /// Mean fare per tap, `None` without taps.
    pub fn average(&self) -> Option<Fare> {
        (self.taps > 0).then(|| Fare::from_units(self.total.as_units() / self.taps as f64))
    }
}

/// Per-day tallies keyed by calendar day.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DayTallies(HashMap<Day, DailyTally>);

impl DayTallies {
    pub fn new() -> Self {
        Default::default()
    }

    pub fn record(&mut self, day: Day, fare: Fare) {
        self.0.entry(day).or_default().record(fare);
    }

    pub fn get(&self, day: Day) -> DailyTally {
        self.0.get(&day).copied().unwrap_or_default()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&Day, &DailyTally)> {
        self.0.iter()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Sum over the days of one month.
    pub fn month(&self, year: i32, month: u32) -> DailyTally {
        self.0
            .iter()
            .filter(|(day, _)| day.year() == year && day.month() == month)
            .fold(DailyTally::default(), |mut acc, (_, tally)| {
                acc.merge(tally);
                acc
            })
    }

    /// Drops every day before `cutoff`, returns how many were dropped.
    pub fn prune_before(&mut self, cutoff: Day) -> usize {
        let before = self.0.len();
        self.0.retain(|day, _| *day >= cutoff);
        before - self.0.len()
    }
}

/// Stations traversed per day, across all cards.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StationCounts(HashMap<Day, u64>);

impl StationCounts {
    pub fn new() -> Self {
        Default::default()
    }

    pub fn record(&mut self, day: Day, count: u32) {
        *self.0.entry(day).or_default() += count as u64;
    }

    pub fn get(&self, day: Day) -> u64 {
        self.0.get(&day).copied().unwrap_or_default()
    }

    pub fn prune_before(&mut self, cutoff: Day) -> usize {
        let before = self.0.len();
        self.0.retain(|day, _| *day >= cutoff);
        before - self.0.len()
    }
}

#[test]
fn tally_average() {
    let mut tally = DailyTally::default();
    assert_eq!(tally.average(), None);
    tally.record(Fare::from_units(2.0));
    tally.record(Fare::from_units(1.0));
    assert_eq!(tally.average(), Some(Fare::from_units(1.5)));
}

#[test]
fn zero_fare_still_counts_a_tap() {
    let mut tallies = DayTallies::new();
    let day = Day::from_ymd(2024, 3, 9).unwrap();
    tallies.record(day, crate::shared::money::ZERO);
    assert_eq!(tallies.get(day).taps, 1);
    assert_eq!(tallies.get(day).total, crate::shared::money::ZERO);
}

#[test]
fn prune_keeps_cutoff_day() {
    let mut counts = StationCounts::new();
    let old = Day::from_ymd(2010, 1, 1).unwrap();
    let cutoff = Day::from_ymd(2014, 1, 1).unwrap();
    counts.record(old, 3);
    counts.record(cutoff, 4);
    assert_eq!(counts.prune_before(cutoff), 1);
    assert_eq!(counts.get(old), 0);
    assert_eq!(counts.get(cutoff), 4);
}
