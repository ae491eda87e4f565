use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::{
    fare::FareStrategy,
    network::{self, Network, Station},
    shared::{Fare, Timestamp, money, time},
    trip::{Leg, Violation, Visit},
};

/// Where a journey stands relative to the next tap.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TripState {
    Empty,
    /// The latest leg has no exit yet.
    Open,
    /// Between legs, a new entry may still continue the journey.
    PendingContinuation,
    /// The continuity window has lapsed, the next entry starts a new journey.
    Expired,
}

/// Legs billed as one journey, with a running total that never exceeds the
/// same-journey cap.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContinuousTrip {
    legs: Vec<Leg>,
    total: Fare,
    cap: Fare,
}

impl ContinuousTrip {
    pub fn new(cap: Fare) -> Self {
        Self {
            legs: Vec::new(),
            total: money::ZERO,
            cap,
        }
    }

    pub fn legs(&self) -> &[Leg] {
        &self.legs
    }

    pub fn is_empty(&self) -> bool {
        self.legs.is_empty()
    }

    pub fn total(&self) -> Fare {
        self.total
    }

    pub fn cap(&self) -> Fare {
        self.cap
    }

    pub fn first_entry(&self) -> Option<&Visit> {
        self.legs.first().map(|leg| &leg.enter)
    }

    pub fn latest(&self) -> Option<&Leg> {
        self.legs.last()
    }

    pub fn open_leg(&self) -> Option<&Leg> {
        self.legs.last().filter(|leg| leg.is_open())
    }

    pub fn state(&self, now: &Timestamp, window_minutes: i64) -> TripState {
        match (self.legs.first(), self.legs.last()) {
            (Some(_), Some(last)) if last.is_open() => TripState::Open,
            (Some(first), Some(_)) => {
                if time::elapsed_minutes(&first.enter.at, now) <= window_minutes {
                    TripState::PendingContinuation
                } else {
                    TripState::Expired
                }
            }
            _ => TripState::Empty,
        }
    }

    pub fn can_enter(&self, now: &Timestamp) -> bool {
        self.check_enter(now).is_ok()
    }

    pub fn check_enter(&self, now: &Timestamp) -> Result<(), Violation> {
        match self.legs.last() {
            None => Ok(()),
            Some(last) if last.is_open() => Err(Violation::AlreadyInTransit),
            Some(last) if *now <= last.enter.at => Err(Violation::EntryNotAfterPrevious),
            Some(_) => Ok(()),
        }
    }

    pub fn can_exit(&self, station: &Station, now: &Timestamp) -> bool {
        self.check_exit(station, now).is_ok()
    }

    pub fn check_exit(&self, station: &Station, now: &Timestamp) -> Result<(), Violation> {
        let leg = self.open_leg().ok_or(Violation::NotInTransit)?;
        if leg.enter.kind != station.kind {
            return Err(Violation::KindMismatch);
        }
        if *now <= leg.enter.at {
            return Err(Violation::ExitNotAfterEntry);
        }
        Ok(())
    }

    /// True when an entry at `station` at `now` belongs to this journey: the
    /// window since the first entry has not lapsed and the rider enters where
    /// the previous leg left off.
    pub fn is_continuous(&self, station: &Station, now: &Timestamp, window_minutes: i64) -> bool {
        let (Some(first), Some(last)) = (self.legs.first(), self.legs.last()) else {
            return true;
        };
        let Some(exit) = &last.exit else {
            return false;
        };
        time::elapsed_minutes(&first.enter.at, now) <= window_minutes
            && exit.location == station.location
    }

    pub fn append_enter(
        &mut self,
        station: &Station,
        now: Timestamp,
        window_minutes: i64,
    ) -> Result<(), Violation> {
        self.check_enter(&now)?;
        if !self.is_continuous(station, &now, window_minutes) {
            return Err(Violation::NotContinuous);
        }
        self.legs.push(Leg::new(station, now));
        Ok(())
    }

    pub fn append_exit(&mut self, station: &Station, now: Timestamp) -> Result<(), Violation> {
        self.check_exit(station, &now)?;
        if let Some(leg) = self.legs.last_mut() {
            leg.exit = Some(Visit::new(station, now));
        }
        Ok(())
    }

    /// Adds `fare` to the running total, clamped to the cap. Returns what was
    /// actually added.
    fn charge(&mut self, fare: Fare) -> Fare {
        let headroom = (self.cap - self.total).max(money::ZERO);
        let charged = fare.max(money::ZERO).min(headroom);
        self.total += charged;
        if let Some(leg) = self.legs.last_mut() {
            leg.charged += charged;
        }
        charged
    }

    /// Incomplete-leg full-cap charge: a journey whose latest leg cannot be
    /// priced is charged everything left under the cap.
    fn charge_remaining(&mut self) -> Fare {
        let remaining = (self.cap - self.total).max(money::ZERO);
        debug!("Latest leg is incomplete, charging remaining {remaining}");
        self.charge(remaining)
    }

    /// Prices the latest rail leg on exit. An empty journey costs nothing and
    /// an unclosed latest leg takes the incomplete-leg full-cap charge.
    pub fn price_rail_leg(
        &mut self,
        network: &Network,
        strategy: &dyn FareStrategy,
    ) -> Result<Fare, network::Error> {
        let Some(leg) = self.legs.last() else {
            return Ok(money::ZERO);
        };
        let Some(exit) = &leg.exit else {
            return Ok(self.charge_remaining());
        };
        let fare = strategy.fare(network, leg.enter.station, exit.station)?;
        Ok(self.charge(fare))
    }

    /// Prices the latest surface leg on entry.
    pub fn price_surface_leg(
        &mut self,
        network: &Network,
        strategy: &dyn FareStrategy,
    ) -> Result<Fare, network::Error> {
        let Some(leg) = self.legs.last() else {
            return Ok(money::ZERO);
        };
        let station = leg.enter.station;
        let fare = strategy.fare(network, station, station)?;
        Ok(self.charge(fare))
    }

    /// Hops covered by the latest closed leg, zero while it is still open.
    pub fn stations_traversed(&self, network: &Network) -> Result<u32, network::Error> {
        match self.legs.last() {
            Some(Leg {
                enter,
                exit: Some(exit),
                ..
            }) => network.shortest_hop_count(enter.station, exit.station),
            _ => Ok(0),
        }
    }

    /// Sum of what every leg was charged. Always equals [`Self::total`].
    pub fn charged_per_leg(&self) -> Fare {
        self.legs.iter().map(|leg| leg.charged).sum()
    }
}
