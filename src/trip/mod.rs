mod continuous;

pub use continuous::*;

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::{
    network::{Station, StationId, StationKind},
    shared::{Fare, Timestamp, money},
};

/// Why a tap does not fit the card's journey so far.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Violation {
    #[error("tap is stamped earlier than the last tap accepted by the system")]
    OutOfOrder,
    #[error("the same tap was presented twice")]
    DuplicateTap,
    #[error("the card is already tapped in")]
    AlreadyInTransit,
    #[error("entry must come after the previous entry")]
    EntryNotAfterPrevious,
    #[error("entry does not continue the current journey")]
    NotContinuous,
    #[error("the card is not tapped in")]
    NotInTransit,
    #[error("entered a station and tried to exit a stop, or the other way around")]
    KindMismatch,
    #[error("exit must come after the entry")]
    ExitNotAfterEntry,
}

/// A station passed through at a given time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Visit {
    pub station: StationId,
    pub location: Arc<str>,
    pub kind: StationKind,
    pub at: Timestamp,
}

impl Visit {
    pub fn new(station: &Station, at: Timestamp) -> Self {
        Self {
            station: station.id(),
            location: station.location.clone(),
            kind: station.kind,
            at,
        }
    }
}

/// One ride: an entry and, once the rider taps out, an exit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Leg {
    pub enter: Visit,
    pub exit: Option<Visit>,
    /// What this leg added to the journey total.
    pub charged: Fare,
}

impl Leg {
    pub fn new(station: &Station, at: Timestamp) -> Self {
        Self {
            enter: Visit::new(station, at),
            exit: None,
            charged: money::ZERO,
        }
    }

    pub fn is_open(&self) -> bool {
        self.exit.is_none()
    }

    pub fn kind(&self) -> StationKind {
        self.enter.kind
    }
}
