mod event;
mod persistence;
mod receipt;
mod registry;
mod tap;

pub use event::*;
pub use persistence::*;
pub use receipt::*;
pub use registry::*;

use std::{
    collections::BTreeMap,
    sync::{Mutex, MutexGuard, PoisonError},
    time::Instant,
};

use thiserror::Error;
use tracing::{debug, info, warn};

use crate::{
    aggregate::DailyTally,
    card::{self, BalanceView, Card, CardId, CardKind},
    config::Config,
    fare::Tariff,
    network::{self, Network, Station, StationId},
    shared::{Day, Fare, Timestamp},
    trip::{ContinuousTrip, Violation},
};

#[derive(Error, Debug)]
pub enum Error {
    #[error("The system is not accepting taps")]
    SystemClosed,
    #[error("Illegal tap: {0}")]
    IllegalTapSequence(#[from] Violation),
    #[error(transparent)]
    Card(#[from] card::Error),
    #[error(transparent)]
    Network(#[from] network::Error),
}

/// What [`TransitSystem::prune_history`] dropped.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PruneReport {
    pub trips: usize,
    pub days: usize,
}

struct Inner {
    state: Snapshot,
    events: Vec<TransitEvent>,
}

/// The fare engine. Taps from any number of gates are serialized through one
/// lock, so every tap sees the effects of all taps committed before it.
pub struct TransitSystem {
    network: Network,
    config: Config,
    tariff: Tariff,
    inner: Mutex<Inner>,
    persistence: Box<dyn Persistence>,
}

impl TransitSystem {
    pub fn new(network: Network, config: Config) -> Self {
        Self::restore(network, config, Snapshot::default())
    }

    /// Rebuilds an engine from a snapshot taken with [`Self::snapshot`].
    pub fn restore(network: Network, config: Config, snapshot: Snapshot) -> Self {
        Self {
            tariff: Tariff::from(&config),
            network,
            config,
            inner: Mutex::new(Inner {
                state: snapshot,
                events: Vec::new(),
            }),
            persistence: Box::new(NoPersistence),
        }
    }

    pub fn with_persistence(mut self, persistence: impl Persistence + 'static) -> Self {
        self.persistence = Box::new(persistence);
        self
    }

    pub fn network(&self) -> &Network {
        &self.network
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn tariff(&self) -> &Tariff {
        &self.tariff
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        // Taps only write state after every check has passed, so a panic
        // while the lock is held cannot leave a half applied tap behind.
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn context(&self) -> tap::Context<'_> {
        tap::Context {
            network: &self.network,
            config: &self.config,
            tariff: &self.tariff,
        }
    }

    fn persist(&self, state: &Snapshot) {
        let now = Instant::now();
        match self.persistence.save(state) {
            Ok(()) => debug!("Persisted state in {:?}", now.elapsed()),
            Err(err) => warn!("Failed to persist state, keeping it in memory: {err}"),
        }
    }

    fn commit(&self, inner: &mut Inner, event: Option<TransitEvent>) {
        if let Some(event) = event {
            inner.events.push(event);
        }
        self.persist(&inner.state);
    }

    pub fn tap_in(
        &self,
        card: CardId,
        at: Timestamp,
        station: StationId,
    ) -> Result<TapReceipt, self::Error> {
        let station = self.network.try_station(station)?;
        let mut inner = self.lock();
        match tap::tap_in(&mut inner.state, &self.context(), card, at, station) {
            Ok((receipt, event)) => {
                info!(
                    "Card {card} tapped in at {station}, charged {}",
                    receipt.charged
                );
                self.commit(&mut inner, Some(event));
                Ok(receipt)
            }
            Err(err) => {
                warn!("Refused tap in of card {card} at {station}: {err}");
                Err(err)
            }
        }
    }

    pub fn tap_out(
        &self,
        card: CardId,
        at: Timestamp,
        station: StationId,
    ) -> Result<TapReceipt, self::Error> {
        let station = self.network.try_station(station)?;
        let mut inner = self.lock();
        match tap::tap_out(&mut inner.state, &self.context(), card, at, station) {
            Ok((receipt, event)) => {
                info!(
                    "Card {card} tapped out at {station}, charged {}",
                    receipt.charged
                );
                self.commit(&mut inner, Some(event));
                Ok(receipt)
            }
            Err(err) => {
                warn!("Refused tap out of card {card} at {station}: {err}");
                Err(err)
            }
        }
    }

    /// Issues a card. A time window pass needs its first valid day.
    pub fn apply_for_card(&self, kind: CardKind, start: Option<Day>) -> Result<Card, card::Error> {
        let mut inner = self.lock();
        let today = inner.state.today;
        let id = inner.state.wallet.apply(kind, start, &self.config)?.id;
        let card = inner.state.wallet.find_mut(id)?;
        if let Some(today) = today {
            card.observe_day(today);
        }
        let card = card.clone();
        self.commit(&mut inner, None);
        Ok(card)
    }

    pub fn find_card(&self, id: CardId) -> Option<Card> {
        self.lock().state.wallet.find(id).cloned()
    }

    pub fn is_able_to_deduct(&self, id: CardId) -> bool {
        self.lock().state.wallet.is_able_to_deduct(id)
    }

    pub fn check_deductible(&self, id: CardId) -> Result<(), card::Error> {
        self.lock().state.wallet.check_deductible(id)
    }

    fn update_wallet<T>(
        &self,
        update: impl FnOnce(&mut card::Wallet, &Config) -> Result<T, card::Error>,
    ) -> Result<T, card::Error> {
        let mut inner = self.lock();
        let value = update(&mut inner.state.wallet, &self.config)?;
        self.commit(&mut inner, None);
        Ok(value)
    }

    pub fn top_up(&self, id: CardId, amount: Fare) -> Result<BalanceView, card::Error> {
        self.update_wallet(|wallet, config| wallet.top_up(id, amount, config))
    }

    pub fn suspend_card(&self, id: CardId) -> Result<(), card::Error> {
        self.update_wallet(|wallet, _| wallet.suspend(id))
    }

    pub fn activate_card(&self, id: CardId) -> Result<(), card::Error> {
        self.update_wallet(|wallet, _| wallet.activate(id))
    }

    pub fn bind_owner(&self, id: CardId, owner: &str) -> Result<(), card::Error> {
        self.update_wallet(|wallet, _| wallet.bind_owner(id, owner))
    }

    pub fn unbind_owner(&self, id: CardId) -> Result<(), card::Error> {
        self.update_wallet(|wallet, _| wallet.unbind_owner(id))
    }

    pub fn is_in_transit(&self, id: CardId) -> bool {
        self.lock().state.registry.contains(id)
    }

    /// Station and time of the card's tap-in while it is in transit.
    pub fn transit_info(&self, id: CardId) -> Option<(Station, Timestamp)> {
        let transit = *self.lock().state.registry.get(id)?;
        let station = self.network.station(transit.station)?.clone();
        Some((station, transit.since))
    }

    pub fn in_transit_population_count(&self) -> usize {
        self.lock().state.registry.len()
    }

    /// True when nobody is between a tap-in and a tap-out.
    pub fn can_close(&self) -> bool {
        self.lock().state.registry.is_empty()
    }

    pub fn set_accepting_taps(&self, accepting: bool) {
        let mut inner = self.lock();
        if inner.state.accepting == accepting {
            return;
        }
        inner.state.accepting = accepting;
        info!("Accepting taps: {accepting}");
        self.commit(&mut inner, Some(TransitEvent::AcceptingChanged(accepting)));
    }

    pub fn is_accepting_taps(&self) -> bool {
        self.lock().state.accepting
    }

    /// Moves the system calendar to `day`. Time window passes count their
    /// remaining days from it. The calendar never moves back.
    pub fn advance_date(&self, day: Day) {
        let mut inner = self.lock();
        if inner.state.today.is_some_and(|today| today >= day) {
            return;
        }
        inner.state.today = Some(day);
        inner.state.wallet.advance_date(day);
        info!("System date advanced to {day}");
        self.commit(&mut inner, Some(TransitEvent::DateAdvanced(day)));
    }

    pub fn today(&self) -> Option<Day> {
        self.lock().state.today
    }

    pub fn stations_traversed(&self, day: Day) -> u64 {
        self.lock().state.station_counts.get(day)
    }

    pub fn daily_cost_and_count(&self, id: CardId, day: Day) -> Option<DailyTally> {
        self.lock().state.wallet.daily_cost_and_count(id, day)
    }

    pub fn card_daily_totals(&self, day: Day) -> Vec<(CardId, DailyTally)> {
        self.lock().state.wallet.card_daily_totals(day)
    }

    pub fn all_card_type_totals(&self, day: Day) -> BTreeMap<CardKind, DailyTally> {
        self.lock().state.wallet.kind_totals(day)
    }

    pub fn daily_totals_across_cards(&self, day: Day) -> DailyTally {
        self.lock().state.wallet.daily_totals_across_cards(day)
    }

    pub fn owner_daily(&self, owner: &str, day: Day) -> DailyTally {
        self.lock().state.owners.owner_daily(owner, day)
    }

    pub fn owner_monthly_average(&self, owner: &str, year: i32, month: u32) -> Option<Fare> {
        self.lock()
            .state
            .owners
            .owner_monthly_average(owner, year, month)
    }

    pub fn owner_revenue(&self, day: Day) -> Fare {
        self.lock().state.owners.daily_revenue(day)
    }

    /// The journey the card's next tap is judged against.
    pub fn current_trip(&self, id: CardId) -> Option<ContinuousTrip> {
        self.lock().state.trips.get(&id)?.last().cloned()
    }

    /// The last `n` journeys of a card, newest first.
    pub fn recent_trips(&self, id: CardId, n: usize) -> Vec<ContinuousTrip> {
        self.lock()
            .state
            .trips
            .get(&id)
            .map(|trips| trips.iter().rev().take(n).cloned().collect())
            .unwrap_or_default()
    }

    /// The last `n` journeys over several cards, newest first by the time
    /// each journey started.
    pub fn recent_trips_for(&self, ids: &[CardId], n: usize) -> Vec<(CardId, ContinuousTrip)> {
        let inner = self.lock();
        let mut trips: Vec<(CardId, &ContinuousTrip)> = ids
            .iter()
            .filter_map(|id| inner.state.trips.get(id).map(|trips| (*id, trips)))
            .flat_map(|(id, trips)| trips.iter().map(move |trip| (id, trip)))
            .collect();
        trips.sort_by(|(_, a), (_, b)| {
            let a = a.first_entry().map(|visit| visit.at);
            let b = b.first_entry().map(|visit| visit.at);
            b.cmp(&a)
        });
        trips
            .into_iter()
            .take(n)
            .map(|(id, trip)| (id, trip.clone()))
            .collect()
    }

    /// Drops journeys, station counts and day tallies older than the
    /// configured retention. The current journey of every card is kept.
    pub fn prune_history(&self, today: Day) -> PruneReport {
        let cutoff = today.days_before(self.config.retention_days);
        let mut inner = self.lock();
        let state = &mut inner.state;

        let mut report = PruneReport::default();
        for trips in state.trips.values_mut() {
            let keep_from = trips.len().saturating_sub(1);
            let stale = trips
                .iter()
                .take(keep_from)
                .take_while(|trip| {
                    trip.first_entry()
                        .is_some_and(|visit| Day::of(&visit.at) < cutoff)
                })
                .count();
            trips.drain(..stale);
            report.trips += stale;
        }
        report.days += state.station_counts.prune_before(cutoff);
        report.days += state.wallet.prune_before(cutoff);
        report.days += state.owners.prune_before(cutoff);

        info!(
            "Pruned {} journeys and {} day entries before {cutoff}",
            report.trips, report.days
        );
        self.commit(&mut inner, None);
        report
    }

    /// Takes every event queued since the last call, oldest first.
    pub fn drain_events(&self) -> Vec<TransitEvent> {
        std::mem::take(&mut self.lock().events)
    }

    pub fn snapshot(&self) -> Snapshot {
        self.lock().state.clone()
    }
}
