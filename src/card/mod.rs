mod pass;
mod wallet;

pub use pass::*;
pub use wallet::*;

use std::{fmt::Display, sync::Arc};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::{
    aggregate::{DailyTally, DayTallies},
    shared::{Day, Fare},
};

#[derive(Error, Debug, Clone, PartialEq)]
pub enum Error {
    #[error("Card {0} does not exist")]
    UnknownCard(CardId),
    #[error("Card {0} is suspended")]
    Suspended(CardId),
    #[error("Card {0} does not have enough balance")]
    InsufficientFunds(CardId),
    #[error("Card {0} has no rides left")]
    RidesExhausted(CardId),
    #[error("The pass on card {0} has expired")]
    PassExpired(CardId),
    #[error("Card {0} cannot be topped up")]
    NotToppable(CardId),
    #[error("{0} is not an accepted top-up amount")]
    InvalidTopUpAmount(Fare),
    #[error("A time window pass needs a start date")]
    MissingStartDate,
    #[error("Card {0} already belongs to {1}")]
    AlreadyBound(CardId, Arc<str>),
    #[error("Card {0} has no owner")]
    NotBound(CardId),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CardId(pub u32);

impl Display for CardId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u32> for CardId {
    fn from(value: u32) -> Self {
        Self(value)
    }
}

/// Receives the cost of every debit on a card bound to an owner. The card
/// only ever writes to it.
pub trait CostSink {
    fn record(&mut self, owner: &str, day: Day, fare: Fare);
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Card {
    pub id: CardId,
    pub pass: Pass,
    suspended: bool,
    owner: Option<Arc<str>>,
    costs: DayTallies,
}

impl Card {
    pub fn new(id: CardId, pass: Pass) -> Self {
        Self {
            id,
            pass,
            suspended: false,
            owner: None,
            costs: DayTallies::new(),
        }
    }

    pub fn kind(&self) -> CardKind {
        self.pass.kind()
    }

    pub fn is_suspended(&self) -> bool {
        self.suspended
    }

    pub fn set_suspended(&mut self, suspended: bool) {
        self.suspended = suspended;
    }

    pub fn owner(&self) -> Option<&str> {
        self.owner.as_deref()
    }

    pub(crate) fn set_owner(&mut self, owner: Option<Arc<str>>) {
        self.owner = owner;
    }

    pub fn is_owing(&self) -> bool {
        self.pass.is_owing()
    }

    /// Ok when the card may be charged for another ride, otherwise the
    /// reason it may not.
    pub fn check_deductible(&self) -> Result<(), self::Error> {
        if self.suspended {
            return Err(Error::Suspended(self.id));
        }
        if self.is_owing() {
            return Err(match self.kind() {
                CardKind::StoredValue => Error::InsufficientFunds(self.id),
                CardKind::RideCount => Error::RidesExhausted(self.id),
                CardKind::TimeWindow => Error::PassExpired(self.id),
            });
        }
        Ok(())
    }

    /// Takes `fare` off the pass and books it on `day`, on the card and on its
    /// owner when one is bound.
    pub fn debit(&mut self, fare: Fare, day: Day, sink: &mut dyn CostSink) -> BalanceView {
        self.pass.debit(fare);
        self.costs.record(day, fare);
        if let Some(owner) = &self.owner {
            sink.record(owner, day, fare);
        }
        self.view_balance()
    }

    /// Adds `rides` to a ride pass or `amount` to stored value.
    pub(crate) fn top_up(&mut self, amount: Fare, rides: u32) -> Result<BalanceView, self::Error> {
        match &mut self.pass {
            Pass::StoredValue { balance } => *balance += amount,
            Pass::RideCount { rides: left } => *left += rides as i32,
            Pass::TimeWindow { .. } => return Err(Error::NotToppable(self.id)),
        }
        Ok(self.view_balance())
    }

    pub fn view_balance(&self) -> BalanceView {
        self.pass.view_balance()
    }

    pub fn observe_day(&mut self, day: Day) {
        self.pass.observe_day(day);
    }

    pub fn daily(&self, day: Day) -> DailyTally {
        self.costs.get(day)
    }

    pub fn costs(&self) -> &DayTallies {
        &self.costs
    }

    pub(crate) fn prune_costs(&mut self, cutoff: Day) -> usize {
        self.costs.prune_before(cutoff)
    }
}
