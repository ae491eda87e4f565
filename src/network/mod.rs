mod description;
mod station;

pub use description::*;
pub use station::*;

use std::{
    collections::{HashMap, VecDeque},
    io,
    sync::Arc,
    time::Instant,
};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, warn};

#[derive(Error, Debug)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
    #[error("Csv error: {0}")]
    Csv(#[from] csv::Error),
    #[error("Line {0} of the network description has no stop list")]
    MalformedLine(usize),
    #[error("Unknown line kind: {0}")]
    UnknownKind(String),
    #[error("Line {line} has {count} stops, at least two are needed")]
    TooFewStops { line: String, count: usize },
    #[error("No station matches the given id")]
    StationNotFound,
    #[error("{from} and {to} are on different networks")]
    KindMismatch { from: Arc<str>, to: Arc<str> },
    #[error("No path connects {from} and {to}")]
    Unreachable { from: Arc<str>, to: Arc<str> },
}

impl Error {
    /// Errors that make a network description unusable at load.
    pub fn is_configuration(&self) -> bool {
        matches!(
            self,
            Self::Io(_)
                | Self::Csv(_)
                | Self::MalformedLine(_)
                | Self::UnknownKind(_)
                | Self::TooFewStops { .. }
        )
    }
}

type StationLookup = HashMap<(Arc<str>, StationKind), u32>;

/// The station graph. Rail stations only ever neighbour rail stations and
/// surface stops only surface stops, so the graph is two disjoint networks
/// sharing one arena.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(from = "Vec<Station>", into = "Vec<Station>")]
pub struct Network {
    stations: Vec<Station>,
    station_lookup: StationLookup,
}

impl From<Vec<Station>> for Network {
    fn from(stations: Vec<Station>) -> Self {
        let station_lookup = stations
            .iter()
            .map(|station| ((station.location.clone(), station.kind), station.index))
            .collect();
        Self {
            stations,
            station_lookup,
        }
    }
}

impl From<Network> for Vec<Station> {
    fn from(network: Network) -> Self {
        network.stations
    }
}

impl Network {
    pub fn new() -> Self {
        Default::default()
    }

    /// Builds a network from its lines. Every line is validated before any is
    /// added, so a bad description leaves nothing half built.
    pub fn load<I>(lines: I) -> Result<Self, self::Error>
    where
        I: IntoIterator<Item = LineSpec>,
    {
        debug!("Loading network...");
        let now = Instant::now();
        let lines: Vec<LineSpec> = lines.into_iter().collect();
        if let Some(line) = lines.iter().find(|line| line.stops.len() < 2) {
            return Err(Error::TooFewStops {
                line: line.label.clone(),
                count: line.stops.len(),
            });
        }

        let mut network = Self::new();
        for line in lines.iter() {
            network.add_line(line.kind, &line.stops)?;
        }
        for kind in [StationKind::Rail, StationKind::Surface] {
            if !network.is_connected(kind) {
                warn!("The {kind} network is not connected, some fares cannot be computed");
            }
        }
        debug!(
            "Loading {} stations from {} lines took {:?}",
            network.stations.len(),
            lines.len(),
            now.elapsed()
        );
        Ok(network)
    }

    /// Adds a line, reusing stations already known and linking each stop to
    /// its neighbours on the line.
    pub fn add_line<S: AsRef<str>>(
        &mut self,
        kind: StationKind,
        locations: &[S],
    ) -> Result<(), self::Error> {
        if locations.len() < 2 {
            return Err(Error::TooFewStops {
                line: kind.as_str().into(),
                count: locations.len(),
            });
        }
        let indices: Vec<u32> = locations
            .iter()
            .map(|location| self.intern(location.as_ref(), kind))
            .collect();
        indices.windows(2).for_each(|pair| {
            self.stations[pair[0] as usize].link(pair[1]);
            self.stations[pair[1] as usize].link(pair[0]);
        });
        Ok(())
    }

    fn intern(&mut self, location: &str, kind: StationKind) -> u32 {
        let location: Arc<str> = location.into();
        if let Some(index) = self.station_lookup.get(&(location.clone(), kind)) {
            return *index;
        }
        let index = self.stations.len() as u32;
        self.stations.push(Station {
            index,
            location: location.clone(),
            kind,
            neighbors: Vec::new(),
        });
        self.station_lookup.insert((location, kind), index);
        index
    }

    pub fn find_station(&self, location: &str, kind: StationKind) -> Option<&Station> {
        let index = self.station_lookup.get(&(Arc::from(location), kind))?;
        Some(&self.stations[*index as usize])
    }

    pub fn station(&self, id: StationId) -> Option<&Station> {
        self.stations.get(id.index())
    }

    pub(crate) fn try_station(&self, id: StationId) -> Result<&Station, self::Error> {
        self.station(id).ok_or(Error::StationNotFound)
    }

    pub fn stations(&self) -> &[Station] {
        &self.stations
    }

    pub fn stations_of(&self, kind: StationKind) -> impl Iterator<Item = &Station> {
        self.stations
            .iter()
            .filter(move |station| station.kind == kind)
    }

    pub fn is_empty(&self) -> bool {
        self.stations.is_empty()
    }

    /// Fewest hops between two stations of the same kind, breadth first over
    /// the adjacency of that kind. Zero when `from == to`.
    pub fn shortest_hop_count(&self, from: StationId, to: StationId) -> Result<u32, self::Error> {
        let start = self.try_station(from)?;
        let target = self.try_station(to)?;
        if start.kind != target.kind {
            return Err(Error::KindMismatch {
                from: start.location.clone(),
                to: target.location.clone(),
            });
        }
        if start.index == target.index {
            return Ok(0);
        }

        let mut visited = vec![false; self.stations.len()];
        let mut queue: VecDeque<(u32, u32)> = VecDeque::new();
        visited[start.index as usize] = true;
        queue.push_back((start.index, 0));
        while let Some((index, hops)) = queue.pop_front() {
            for &next in self.stations[index as usize].neighbors.iter() {
                if next == target.index {
                    return Ok(hops + 1);
                }
                if !visited[next as usize] {
                    visited[next as usize] = true;
                    queue.push_back((next, hops + 1));
                }
            }
        }
        Err(Error::Unreachable {
            from: start.location.clone(),
            to: target.location.clone(),
        })
    }

    /// True when every station of `kind` can reach every other. An empty
    /// network of a kind is connected.
    pub fn is_connected(&self, kind: StationKind) -> bool {
        let mut stations = self.stations_of(kind);
        let Some(first) = stations.next() else {
            return true;
        };
        let mut visited = vec![false; self.stations.len()];
        let mut stack = vec![first.index];
        visited[first.index as usize] = true;
        let mut reached = 1;
        while let Some(index) = stack.pop() {
            for &next in self.stations[index as usize].neighbors.iter() {
                if !visited[next as usize] {
                    visited[next as usize] = true;
                    reached += 1;
                    stack.push(next);
                }
            }
        }
        reached == self.stations_of(kind).count()
    }
}
