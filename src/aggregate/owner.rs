use std::{collections::HashMap, sync::Arc};

use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::{
    aggregate::{DailyTally, DayTallies},
    card::CostSink,
    shared::{Day, Fare},
};

/// Per-day cost of every owner account that has a card bound to it.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OwnerTotals(HashMap<Arc<str>, DayTallies>);

impl CostSink for OwnerTotals {
    fn record(&mut self, owner: &str, day: Day, fare: Fare) {
        self.0.entry(owner.into()).or_default().record(day, fare);
    }
}

impl OwnerTotals {
    pub fn new() -> Self {
        Default::default()
    }

    pub fn owner_daily(&self, owner: &str, day: Day) -> DailyTally {
        self.0
            .get(owner)
            .map(|tallies| tallies.get(day))
            .unwrap_or_default()
    }

    /// Average fare per tap over one month, `None` when the owner did not ride.
    pub fn owner_monthly_average(&self, owner: &str, year: i32, month: u32) -> Option<Fare> {
        self.0.get(owner)?.month(year, month).average()
    }

    /// Money charged to owned cards on `day`.
    pub fn daily_revenue(&self, day: Day) -> Fare {
        self.0
            .par_iter()
            .map(|(_, tallies)| tallies.get(day).total)
            .reduce(Fare::default, |a, b| a + b)
    }

    pub fn prune_before(&mut self, cutoff: Day) -> usize {
        self.0
            .values_mut()
            .map(|tallies| tallies.prune_before(cutoff))
            .sum()
    }
}
