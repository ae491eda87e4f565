use std::{fmt::Display, sync::Arc};

use serde::{Deserialize, Serialize};

/// Which of the two disjoint networks a station belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum StationKind {
    /// Subway stations, priced per hop on exit.
    Rail,
    /// Bus stops, priced flat on entry.
    Surface,
}

impl StationKind {
    /// Maps a line keyword of the network description to a kind.
    pub fn from_keyword(keyword: &str) -> Option<Self> {
        match keyword {
            "Subway" | "Rail" => Some(Self::Rail),
            "Bus" | "Surface" => Some(Self::Surface),
            _ => None,
        }
    }

    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Rail => "Rail",
            Self::Surface => "Surface",
        }
    }
}

impl Display for StationKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Stable handle of a station inside its [`Network`](super::Network).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StationId(pub(crate) u32);

impl StationId {
    pub const fn index(&self) -> usize {
        self.0 as usize
    }
}

impl From<u32> for StationId {
    fn from(value: u32) -> Self {
        Self(value)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Station {
    pub index: u32,
    pub location: Arc<str>,
    pub kind: StationKind,
    /// Neighbours on any line through this station, always of the same kind.
    pub neighbors: Vec<u32>,
}

impl Station {
    pub fn id(&self) -> StationId {
        StationId(self.index)
    }

    pub(crate) fn link(&mut self, other: u32) {
        if other != self.index && !self.neighbors.contains(&other) {
            self.neighbors.push(other);
        }
    }
}

/// Identity is location and kind; adjacency does not take part.
impl PartialEq for Station {
    fn eq(&self, other: &Self) -> bool {
        self.location == other.location && self.kind == other.kind
    }
}

impl Eq for Station {}

impl Display for Station {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({})", self.location, self.kind)
    }
}
