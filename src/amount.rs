use std::fmt;

use serde::{Deserialize, Serialize};

/// Monetary amount in the smallest currency unit (cents), stored as an integer.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct Amount(i64);

impl Amount {
    /// Cents per whole currency unit (MYR 1 = 100 cents).
    pub const SCALE: i64 = 100;

    pub const ZERO: Amount = Amount(0);

    pub const fn from_cents(value: i64) -> Self {
        Amount(value)
    }

    pub const fn cents(self) -> i64 {
        self.0
    }

    /// Whole currency units, fractional part discarded.
    pub const fn whole_units(self) -> i64 {
        self.0 / Self::SCALE
    }

    pub const fn is_positive(self) -> bool {
        self.0 > 0
    }

    pub fn checked_add(self, rhs: Amount) -> Option<Amount> {
        self.0.checked_add(rhs.0).map(Amount)
    }

    pub fn checked_sub(self, rhs: Amount) -> Option<Amount> {
        self.0.checked_sub(rhs.0).map(Amount)
    }

    pub fn checked_mul(self, factor: i64) -> Option<Amount> {
        self.0.checked_mul(factor).map(Amount)
    }
}

impl fmt::Display for Amount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        let abs = self.0.unsigned_abs();
        let scale = Self::SCALE as u64;
        let whole = abs / scale;
        let frac = abs % scale;
        write!(f, "{sign}{whole}.{frac:02}")
    }
}
