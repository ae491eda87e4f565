use std::{
    cmp,
    fmt::Display,
    iter::Sum,
    ops::{Add, AddAssign, Mul, Sub, SubAssign},
};

use serde::{Deserialize, Serialize};

/// An amount of currency. Fares, balances and top-ups all use it.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Fare(f64);

pub const ZERO: Fare = Fare::from_units(0.0);

impl PartialEq for Fare {
    fn eq(&self, other: &Self) -> bool {
        self.0 == other.0
    }
}

impl PartialOrd for Fare {
    fn partial_cmp(&self, other: &Self) -> Option<cmp::Ordering> {
        self.0.partial_cmp(&other.0)
    }
}

impl Add for Fare {
    type Output = Self;
    fn add(self, rhs: Self) -> Self::Output {
        Self(self.0 + rhs.0)
    }
}

impl AddAssign for Fare {
    fn add_assign(&mut self, rhs: Self) {
        self.0 += rhs.0
    }
}

impl Sub for Fare {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self::Output {
        Self(self.0 - rhs.0)
    }
}

impl SubAssign for Fare {
    fn sub_assign(&mut self, rhs: Self) {
        self.0 -= rhs.0
    }
}

impl Mul<u32> for Fare {
    type Output = Self;
    fn mul(self, rhs: u32) -> Self::Output {
        Self(self.0 * rhs as f64)
    }
}

impl Sum for Fare {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(ZERO, |acc, fare| acc + fare)
    }
}

impl From<f64> for Fare {
    fn from(value: f64) -> Self {
        Self(value)
    }
}

impl Display for Fare {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.0 < 0.0 {
            write!(f, "-${:.2}", -self.0)
        } else {
            write!(f, "${:.2}", self.0)
        }
    }
}

impl Fare {
    pub const fn from_units(units: f64) -> Self {
        Self(units)
    }

    pub const fn as_units(&self) -> f64 {
        self.0
    }

    pub fn is_positive(&self) -> bool {
        self.0 > 0.0
    }

    pub fn min(self, other: Self) -> Self {
        Self(self.0.min(other.0))
    }

    pub fn max(self, other: Self) -> Self {
        Self(self.0.max(other.0))
    }
}

#[test]
fn display_uses_two_decimals() {
    assert_eq!(Fare::from_units(17.0).to_string(), "$17.00");
    assert_eq!(Fare::from_units(1.5).to_string(), "$1.50");
}

#[test]
fn display_puts_sign_before_symbol() {
    assert_eq!(Fare::from_units(-1.0).to_string(), "-$1.00");
    assert_eq!(Fare::from_units(-0.25).to_string(), "-$0.25");
}

#[test]
fn hop_multiplication() {
    assert_eq!(Fare::from_units(0.5) * 3, Fare::from_units(1.5));
}

#[test]
fn sum_of_fares() {
    let total: Fare = [1.0, 2.5, 0.5].into_iter().map(Fare::from_units).sum();
    assert_eq!(total, Fare::from_units(4.0));
}
