use std::{
    collections::{BTreeMap, HashMap},
    sync::Arc,
};

use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::{
    aggregate::DailyTally,
    card::{BalanceView, Card, CardId, CardKind, Error, Pass},
    config::Config,
    shared::{Day, Fare},
};

/// Every card issued by the system. Ids are handed out in order from 1 and
/// never reused.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Wallet {
    cards: HashMap<CardId, Card>,
    next_id: u32,
}

impl Default for Wallet {
    fn default() -> Self {
        Self {
            cards: HashMap::new(),
            next_id: 1,
        }
    }
}

impl Wallet {
    pub fn new() -> Self {
        Default::default()
    }

    /// Issues a new card. A time window pass starts on `start`.
    pub fn apply(
        &mut self,
        kind: CardKind,
        start: Option<Day>,
        config: &Config,
    ) -> Result<&Card, Error> {
        let pass = match kind {
            CardKind::StoredValue => Pass::StoredValue {
                balance: Fare::from_units(config.stored_value_initial),
            },
            CardKind::RideCount => Pass::RideCount {
                rides: config.ride_count_initial,
            },
            CardKind::TimeWindow => {
                let start = start.ok_or(Error::MissingStartDate)?;
                Pass::TimeWindow {
                    start,
                    today: start,
                    days: config.pass_days,
                }
            }
        };
        let id = CardId(self.next_id);
        self.next_id += 1;
        info!("Issued {kind} card {id}");
        let card = self.cards.entry(id).or_insert(Card::new(id, pass));
        Ok(&*card)
    }

    pub fn find(&self, id: CardId) -> Option<&Card> {
        self.cards.get(&id)
    }

    pub(crate) fn find_mut(&mut self, id: CardId) -> Result<&mut Card, Error> {
        self.cards.get_mut(&id).ok_or(Error::UnknownCard(id))
    }

    pub fn cards(&self) -> impl Iterator<Item = &Card> {
        self.cards.values()
    }

    pub fn len(&self) -> usize {
        self.cards.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cards.is_empty()
    }

    pub fn is_able_to_deduct(&self, id: CardId) -> bool {
        self.check_deductible(id).is_ok()
    }

    pub fn check_deductible(&self, id: CardId) -> Result<(), Error> {
        self.find(id).ok_or(Error::UnknownCard(id))?.check_deductible()
    }

    pub fn suspend(&mut self, id: CardId) -> Result<(), Error> {
        self.find_mut(id)?.set_suspended(true);
        info!("Card {id} has been suspended");
        Ok(())
    }

    pub fn activate(&mut self, id: CardId) -> Result<(), Error> {
        self.find_mut(id)?.set_suspended(false);
        info!("Card {id} has been activated");
        Ok(())
    }

    /// Loads `amount` onto a card. Only the configured top-up amounts are
    /// accepted and suspended cards are refused.
    pub fn top_up(&mut self, id: CardId, amount: Fare, config: &Config) -> Result<BalanceView, Error> {
        let rides = config
            .rides_for(amount)
            .ok_or(Error::InvalidTopUpAmount(amount))?;
        let card = self.find_mut(id)?;
        if card.is_suspended() {
            return Err(Error::Suspended(id));
        }
        let balance = card.top_up(amount, rides)?;
        info!("Card {id} topped up with {amount}, {balance}");
        Ok(balance)
    }

    pub fn bind_owner(&mut self, id: CardId, owner: &str) -> Result<(), Error> {
        let card = self.find_mut(id)?;
        if let Some(current) = card.owner() {
            return Err(Error::AlreadyBound(id, current.into()));
        }
        card.set_owner(Some(Arc::from(owner)));
        info!("Card {id} bound to {owner}");
        Ok(())
    }

    pub fn unbind_owner(&mut self, id: CardId) -> Result<(), Error> {
        let card = self.find_mut(id)?;
        if card.owner().is_none() {
            return Err(Error::NotBound(id));
        }
        card.set_owner(None);
        info!("Card {id} unbound");
        Ok(())
    }

    /// Moves every time window pass to `day`.
    pub fn advance_date(&mut self, day: Day) {
        self.cards
            .values_mut()
            .for_each(|card| card.observe_day(day));
    }

    pub fn daily_cost_and_count(&self, id: CardId, day: Day) -> Option<DailyTally> {
        self.find(id).map(|card| card.daily(day))
    }

    /// Tally of every card that rode on `day`, ordered by card id.
    pub fn card_daily_totals(&self, day: Day) -> Vec<(CardId, DailyTally)> {
        let mut totals: Vec<(CardId, DailyTally)> = self
            .cards
            .par_iter()
            .map(|(id, card)| (*id, card.daily(day)))
            .filter(|(_, tally)| tally.taps > 0)
            .collect();
        totals.par_sort_unstable_by_key(|(id, _)| *id);
        totals
    }

    /// Taps and revenue of `day` summed over all cards.
    pub fn daily_totals_across_cards(&self, day: Day) -> DailyTally {
        self.cards
            .par_iter()
            .map(|(_, card)| card.daily(day))
            .reduce(DailyTally::default, |mut acc, tally| {
                acc.merge(&tally);
                acc
            })
    }

    /// Taps and revenue of `day` per card kind. Every kind held by at least
    /// one card is listed, idle kinds with an empty tally.
    pub fn kind_totals(&self, day: Day) -> BTreeMap<CardKind, DailyTally> {
        self.cards
            .values()
            .fold(BTreeMap::new(), |mut totals, card| {
                totals
                    .entry(card.kind())
                    .or_insert_with(DailyTally::default)
                    .merge(&card.daily(day));
                totals
            })
    }

    pub(crate) fn prune_before(&mut self, cutoff: Day) -> usize {
        self.cards
            .values_mut()
            .map(|card| card.prune_costs(cutoff))
            .sum()
    }
}
