//! Fare computation and trip continuity for a subway and bus network.
//!
//! A [`transit::TransitSystem`] is built from a [`network::Network`] and a
//! [`config::Config`], issues cards, and judges every tap-in and tap-out
//! against the card's journey so far.

pub mod aggregate;
pub mod card;
pub mod config;
pub mod fare;
pub mod network;
pub mod shared;
pub mod transit;
pub mod trip;

pub mod prelude {
    pub use crate::aggregate::{DailyTally, OwnerTotals};
    pub use crate::card::{BalanceView, Card, CardId, CardKind, CostSink, Pass, Wallet};
    pub use crate::config::Config;
    pub use crate::fare::{FareStrategy, RailFare, SurfaceFare, Tariff};
    pub use crate::network::{
        LineSpec, Network, Station, StationId, StationKind, read_description,
        read_description_file,
    };
    pub use crate::shared::{Day, Fare, Timestamp};
    pub use crate::transit::{
        Persistence, Snapshot, TapReceipt, TransitEvent, TransitSystem,
    };
    pub use crate::trip::{ContinuousTrip, Leg, TripState, Violation};
}
