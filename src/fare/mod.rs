use crate::{
    config::Config,
    network::{self, Network, StationId, StationKind},
    shared::Fare,
};

/// Prices one ride between two stations of the same kind.
///
/// Strategies are pure: they read the network and nothing else.
pub trait FareStrategy: Send + Sync {
    fn fare(&self, network: &Network, from: StationId, to: StationId)
    -> Result<Fare, network::Error>;
}

/// Rail rides cost a fixed rate for every hop of the shortest path.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RailFare {
    pub per_hop: Fare,
}

impl FareStrategy for RailFare {
    fn fare(
        &self,
        network: &Network,
        from: StationId,
        to: StationId,
    ) -> Result<Fare, network::Error> {
        let hops = network.shortest_hop_count(from, to)?;
        Ok(self.per_hop * hops)
    }
}

/// Surface rides cost the same wherever they go.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SurfaceFare {
    pub flat: Fare,
}

impl FareStrategy for SurfaceFare {
    fn fare(&self, _: &Network, _: StationId, _: StationId) -> Result<Fare, network::Error> {
        Ok(self.flat)
    }
}

/// One strategy per station kind.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Tariff {
    pub rail: RailFare,
    pub surface: SurfaceFare,
}

impl Default for Tariff {
    fn default() -> Self {
        Self::from(&Config::default())
    }
}

impl From<&Config> for Tariff {
    fn from(config: &Config) -> Self {
        Self {
            rail: RailFare {
                per_hop: config.rail_rate(),
            },
            surface: SurfaceFare {
                flat: config.surface_fare(),
            },
        }
    }
}

impl Tariff {
    pub fn strategy(&self, kind: StationKind) -> &dyn FareStrategy {
        match kind {
            StationKind::Rail => &self.rail,
            StationKind::Surface => &self.surface,
        }
    }
}
