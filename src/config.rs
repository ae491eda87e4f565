use serde::Deserialize;

use crate::shared::{Fare, time};

/// Rides bought by one accepted top-up amount.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct TopUp {
    pub amount: f64,
    pub rides: u32,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Charged per hop on a rail leg.
    pub rail_rate: f64,
    /// Flat fare of a surface ride.
    pub surface_fare: f64,
    /// Most a single continuous trip can cost.
    pub journey_cap: f64,
    /// Whole minutes from the first entry of a chain in which a new entry still continues it.
    pub continuity_window_minutes: i64,
    /// How far behind the last accepted tap a new tap may be stamped.
    pub clock_skew_seconds: i64,
    pub stored_value_initial: f64,
    pub ride_count_initial: i32,
    /// Currency worth of one ride, used when a ride balance is shown as money.
    pub ride_value: f64,
    pub pass_days: i64,
    pub top_ups: Vec<TopUp>,
    pub retention_days: i64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            rail_rate: 0.5,
            surface_fare: 2.0,
            journey_cap: 6.0,
            continuity_window_minutes: 120,
            clock_skew_seconds: 10,
            stored_value_initial: 19.0,
            ride_count_initial: 10,
            ride_value: 2.0,
            pass_days: 7,
            top_ups: vec![
                TopUp {
                    amount: 10.0,
                    rides: 5,
                },
                TopUp {
                    amount: 20.0,
                    rides: 10,
                },
                TopUp {
                    amount: 50.0,
                    rides: 25,
                },
            ],
            retention_days: 3652,
        }
    }
}

impl Config {
    pub fn rail_rate(&self) -> Fare {
        Fare::from_units(self.rail_rate)
    }

    pub fn surface_fare(&self) -> Fare {
        Fare::from_units(self.surface_fare)
    }

    pub fn journey_cap(&self) -> Fare {
        Fare::from_units(self.journey_cap)
    }

    pub fn ride_value(&self) -> Fare {
        Fare::from_units(self.ride_value)
    }

    pub fn clock_skew(&self) -> chrono::TimeDelta {
        time::seconds(self.clock_skew_seconds)
    }

    /// Rides bought by `amount`, or `None` when the amount is not an accepted top-up.
    pub fn rides_for(&self, amount: Fare) -> Option<u32> {
        self.top_ups
            .iter()
            .find(|top_up| Fare::from_units(top_up.amount) == amount)
            .map(|top_up| top_up.rides)
    }
}
