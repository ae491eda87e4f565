use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::{card::CardId, network::StationId, shared::Timestamp};

/// Where and when a card tapped in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transit {
    pub station: StationId,
    pub since: Timestamp,
}

/// Cards currently between a tap-in and a tap-out.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Registry(HashMap<CardId, Transit>);

impl Registry {
    pub fn new() -> Self {
        Default::default()
    }

    pub fn enter(&mut self, card: CardId, station: StationId, since: Timestamp) {
        self.0.insert(card, Transit { station, since });
    }

    pub fn leave(&mut self, card: CardId) -> Option<Transit> {
        self.0.remove(&card)
    }

    pub fn get(&self, card: CardId) -> Option<&Transit> {
        self.0.get(&card)
    }

    pub fn contains(&self, card: CardId) -> bool {
        self.0.contains_key(&card)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}
