use tracing::warn;

use crate::{
    card::{self, CardId},
    config::Config,
    fare::Tariff,
    network::{Network, Station, StationKind},
    shared::{Day, Timestamp, money},
    transit::{Direction, Error, Snapshot, TapReceipt, TransitEvent},
    trip::{ContinuousTrip, Violation},
};

/// The read-only half of the engine a tap is judged against.
pub(super) struct Context<'a> {
    pub network: &'a Network,
    pub config: &'a Config,
    pub tariff: &'a Tariff,
}

/// Gate and clock checks shared by both tap directions.
fn admit(state: &Snapshot, config: &Config, at: &Timestamp) -> Result<(), Error> {
    if !state.accepting {
        return Err(Error::SystemClosed);
    }
    if let Some(last) = state.last_tap
        && last
            .checked_sub_signed(config.clock_skew())
            .is_some_and(|earliest| *at < earliest)
    {
        return Err(Violation::OutOfOrder.into());
    }
    Ok(())
}

fn advance_clock(state: &mut Snapshot, at: Timestamp) {
    state.last_tap = Some(state.last_tap.map_or(at, |last| last.max(at)));
}

/// Judges a tap-in and applies it. Every check runs against copies, state is
/// only written once the tap is known to succeed.
pub(super) fn tap_in(
    state: &mut Snapshot,
    ctx: &Context,
    card_id: CardId,
    at: Timestamp,
    station: &Station,
) -> Result<(TapReceipt, TransitEvent), Error> {
    admit(state, ctx.config, &at)?;
    if let Some(transit) = state.registry.get(card_id)
        && transit.station == station.id()
        && transit.since == at
    {
        return Err(Violation::DuplicateTap.into());
    }

    let mut card = state
        .wallet
        .find(card_id)
        .cloned()
        .ok_or(card::Error::UnknownCard(card_id))?;
    let day = Day::of(&at);
    card.observe_day(day);
    card.check_deductible()?;

    let window = ctx.config.continuity_window_minutes;
    let (mut trip, new_journey) = match state.trips.get(&card_id).and_then(|trips| trips.last()) {
        Some(current) => {
            current.check_enter(&at)?;
            if current.is_continuous(station, &at, window) {
                (current.clone(), false)
            } else {
                (ContinuousTrip::new(ctx.config.journey_cap()), true)
            }
        }
        None => (ContinuousTrip::new(ctx.config.journey_cap()), true),
    };
    trip.append_enter(station, at, window)?;

    let charged = match station.kind {
        StationKind::Surface => trip.price_surface_leg(ctx.network, &ctx.tariff.surface)?,
        StationKind::Rail => money::ZERO,
    };
    let debited = station.kind == StationKind::Surface;

    let slot = state.wallet.find_mut(card_id)?;
    let balance = if debited {
        card.debit(charged, day, &mut state.owners)
    } else {
        card.view_balance()
    };
    *slot = card;

    let trips = state.trips.entry(card_id).or_default();
    if new_journey {
        trips.push(trip);
    } else if let Some(last) = trips.last_mut() {
        *last = trip;
    }
    state.registry.enter(card_id, station.id(), at);
    advance_clock(state, at);

    let event = TransitEvent::TappedIn {
        card: card_id,
        station: station.id(),
        at,
        charged,
        in_transit: state.registry.len(),
    };
    let receipt = TapReceipt {
        card: card_id,
        station: station.id(),
        direction: Direction::In,
        at,
        charged,
        debited,
        balance,
        new_journey,
    };
    Ok((receipt, event))
}

/// Judges a tap-out and applies it. The ledger is not consulted, a rider can
/// always leave.
pub(super) fn tap_out(
    state: &mut Snapshot,
    ctx: &Context,
    card_id: CardId,
    at: Timestamp,
    station: &Station,
) -> Result<(TapReceipt, TransitEvent), Error> {
    admit(state, ctx.config, &at)?;

    let mut card = state
        .wallet
        .find(card_id)
        .cloned()
        .ok_or(card::Error::UnknownCard(card_id))?;
    let current = state
        .trips
        .get(&card_id)
        .and_then(|trips| trips.last())
        .ok_or(Violation::NotInTransit)?;
    current.check_exit(station, &at)?;
    let mut trip = current.clone();
    trip.append_exit(station, at)?;

    let charged = match station.kind {
        StationKind::Rail => trip.price_rail_leg(ctx.network, &ctx.tariff.rail)?,
        StationKind::Surface => money::ZERO,
    };
    let debited = station.kind == StationKind::Rail;
    // Rail legs were already walked by the fare, only a split bus network can fail here.
    let traversed = match trip.stations_traversed(ctx.network) {
        Ok(count) => count,
        Err(err) => {
            warn!("Card {card_id} left at {station} over a gap in the network: {err}");
            0
        }
    };

    let day = Day::of(&at);
    let slot = state.wallet.find_mut(card_id)?;
    let balance = if debited {
        card.debit(charged, day, &mut state.owners)
    } else {
        card.view_balance()
    };
    *slot = card;

    if let Some(last) = state.trips.get_mut(&card_id).and_then(|trips| trips.last_mut()) {
        *last = trip;
    }
    state.station_counts.record(day, traversed);
    state.registry.leave(card_id);
    advance_clock(state, at);

    let event = TransitEvent::TappedOut {
        card: card_id,
        station: station.id(),
        at,
        charged,
        stations_traversed: traversed,
        in_transit: state.registry.len(),
    };
    let receipt = TapReceipt {
        card: card_id,
        station: station.id(),
        direction: Direction::Out,
        at,
        charged,
        debited,
        balance,
        new_journey: false,
    };
    Ok((receipt, event))
}
