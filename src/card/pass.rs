use std::fmt::Display;

use serde::{Deserialize, Serialize};

use crate::shared::{Day, Fare};

/// The fare product loaded on a card.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Pass {
    /// Money that fares are taken from.
    StoredValue { balance: Fare },
    /// Rides; each priced leg uses one whatever it cost.
    RideCount { rides: i32 },
    /// Unlimited rides for `days` days counted from `start`.
    TimeWindow { start: Day, today: Day, days: i64 },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum CardKind {
    StoredValue,
    RideCount,
    TimeWindow,
}

impl Display for CardKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Self::StoredValue => "Stored Value",
            Self::RideCount => "Ride Count",
            Self::TimeWindow => "Time Window",
        })
    }
}

/// A balance in the unit of the pass it comes from.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum BalanceView {
    Currency(Fare),
    Rides(i32),
    DaysRemaining(i64),
}

impl BalanceView {
    /// The balance as money. Rides are worth `ride_value` each, a time window
    /// has no money value.
    pub fn as_currency(&self, ride_value: Fare) -> Option<Fare> {
        match self {
            Self::Currency(fare) => Some(*fare),
            Self::Rides(rides) => Some(Fare::from_units(ride_value.as_units() * *rides as f64)),
            Self::DaysRemaining(_) => None,
        }
    }
}

impl Display for BalanceView {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Currency(fare) => write!(f, "remaining: {fare}"),
            Self::Rides(rides) => write!(f, "remaining rides: {rides}"),
            Self::DaysRemaining(days) => write!(f, "days remaining: {days}"),
        }
    }
}

impl Pass {
    pub fn kind(&self) -> CardKind {
        match self {
            Self::StoredValue { .. } => CardKind::StoredValue,
            Self::RideCount { .. } => CardKind::RideCount,
            Self::TimeWindow { .. } => CardKind::TimeWindow,
        }
    }

    /// True when the pass cannot cover another ride.
    pub fn is_owing(&self) -> bool {
        match self {
            Self::StoredValue { balance } => !balance.is_positive(),
            Self::RideCount { rides } => *rides <= 0,
            Self::TimeWindow { start, today, days } => today.days_since(*start) > *days,
        }
    }

    pub(crate) fn debit(&mut self, fare: Fare) {
        match self {
            Self::StoredValue { balance } => *balance -= fare,
            Self::RideCount { rides } => *rides -= 1,
            Self::TimeWindow { .. } => {}
        }
    }

    pub fn view_balance(&self) -> BalanceView {
        match self {
            Self::StoredValue { balance } => BalanceView::Currency(*balance),
            Self::RideCount { rides } => BalanceView::Rides(*rides),
            Self::TimeWindow { start, today, days } => {
                let elapsed = today.days_since(*start);
                if elapsed > *days {
                    BalanceView::DaysRemaining(0)
                } else {
                    BalanceView::DaysRemaining(*days - elapsed.max(0))
                }
            }
        }
    }

    /// Moves a time window's idea of today forward. Other passes ignore it.
    pub(crate) fn observe_day(&mut self, day: Day) {
        if let Self::TimeWindow { today, .. } = self
            && day > *today
        {
            *today = day;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn window(start: Day, today: Day) -> Pass {
        Pass::TimeWindow {
            start,
            today,
            days: 7,
        }
    }

    #[test]
    fn time_window_lasts_seven_days() {
        let start = Day::from_ymd(2024, 3, 1).unwrap();
        let seventh = Day::from_ymd(2024, 3, 8).unwrap();
        let eighth = Day::from_ymd(2024, 3, 9).unwrap();
        assert!(!window(start, start).is_owing());
        assert!(!window(start, seventh).is_owing());
        assert!(window(start, eighth).is_owing());
    }

    #[test]
    fn time_window_counts_down() {
        let start = Day::from_ymd(2024, 3, 1).unwrap();
        assert_eq!(
            window(start, start).view_balance(),
            BalanceView::DaysRemaining(7)
        );
        assert_eq!(
            window(start, Day::from_ymd(2024, 3, 6).unwrap()).view_balance(),
            BalanceView::DaysRemaining(2)
        );
        assert_eq!(
            window(start, Day::from_ymd(2024, 4, 1).unwrap()).view_balance(),
            BalanceView::DaysRemaining(0)
        );
    }

    #[test]
    fn observe_day_never_goes_back() {
        let start = Day::from_ymd(2024, 3, 1).unwrap();
        let mut pass = window(start, Day::from_ymd(2024, 3, 5).unwrap());
        pass.observe_day(start);
        assert_eq!(pass.view_balance(), BalanceView::DaysRemaining(3));
    }

    #[test]
    fn ride_balance_as_money() {
        let view = BalanceView::Rides(4);
        assert_eq!(
            view.as_currency(Fare::from_units(2.0)),
            Some(Fare::from_units(8.0))
        );
        assert_eq!(
            BalanceView::DaysRemaining(3).as_currency(Fare::from_units(2.0)),
            None
        );
    }
}
