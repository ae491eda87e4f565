use crate::{
    card::CardId,
    network::StationId,
    shared::{Day, Fare, Timestamp},
};

/// A committed change, queued for whoever shows live status. Read them with
/// [`TransitSystem::drain_events`](super::TransitSystem::drain_events).
#[derive(Debug, Clone, PartialEq)]
pub enum TransitEvent {
    TappedIn {
        card: CardId,
        station: StationId,
        at: Timestamp,
        charged: Fare,
        in_transit: usize,
    },
    TappedOut {
        card: CardId,
        station: StationId,
        at: Timestamp,
        charged: Fare,
        stations_traversed: u32,
        in_transit: usize,
    },
    DateAdvanced(Day),
    AcceptingChanged(bool),
}
