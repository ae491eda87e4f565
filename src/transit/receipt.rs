use std::fmt::Display;

use crate::{
    card::{BalanceView, CardId},
    network::StationId,
    shared::{Fare, Timestamp},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    In,
    Out,
}

/// What a rider is told after an accepted tap.
#[derive(Debug, Clone, PartialEq)]
pub struct TapReceipt {
    pub card: CardId,
    pub station: StationId,
    pub direction: Direction,
    pub at: Timestamp,
    /// Money added to the journey by this tap, after the cap.
    pub charged: Fare,
    /// Whether the card was debited at all. Rail entries and surface exits are not.
    pub debited: bool,
    pub balance: BalanceView,
    /// True when a tap-in started a new journey instead of continuing one.
    pub new_journey: bool,
}

impl Display for TapReceipt {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.direction {
            Direction::In => write!(f, "successfully tapped in")?,
            Direction::Out => write!(f, "successfully tapped out")?,
        }
        if self.debited {
            write!(f, "\ndeducted: {}", self.charged)?;
        }
        write!(f, "\n{}", self.balance)
    }
}
