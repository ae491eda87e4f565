use std::{collections::HashMap, io};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::{
    aggregate::{OwnerTotals, StationCounts},
    card::{CardId, Wallet},
    shared::{Day, Timestamp},
    transit::Registry,
    trip::ContinuousTrip,
};

/// Every piece of mutable state the engine owns. Stations are not part of
/// it, they come from the network description.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Snapshot {
    pub wallet: Wallet,
    /// Journeys per card, oldest first. The last one is the current journey.
    pub trips: HashMap<CardId, Vec<ContinuousTrip>>,
    pub registry: Registry,
    pub station_counts: StationCounts,
    pub owners: OwnerTotals,
    /// Latest tap time accepted anywhere in the system.
    pub last_tap: Option<Timestamp>,
    pub accepting: bool,
    pub today: Option<Day>,
}

impl Default for Snapshot {
    fn default() -> Self {
        Self {
            wallet: Wallet::new(),
            trips: HashMap::new(),
            registry: Registry::new(),
            station_counts: StationCounts::new(),
            owners: OwnerTotals::new(),
            last_tap: None,
            accepting: true,
            today: None,
        }
    }
}

#[derive(Error, Debug)]
pub enum PersistError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
    #[error("Could not store snapshot: {0}")]
    Store(String),
}

/// Durable storage, called after every committed change. A failure is
/// logged and the in-memory state stays as committed.
pub trait Persistence: Send + Sync {
    fn save(&self, snapshot: &Snapshot) -> Result<(), PersistError>;
}

/// Keeps nothing.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoPersistence;

impl Persistence for NoPersistence {
    fn save(&self, _: &Snapshot) -> Result<(), PersistError> {
        Ok(())
    }
}
