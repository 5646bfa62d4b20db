//! Tiered discount calculation.
//!
//! A base percentage is picked from the amount tier, conditional bonuses are
//! added based on the amount in whole currency units, and the sum is capped.

use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use rust_decimal_macros::dec;
use thiserror::Error;

use crate::Amount;

/// Upper bound (inclusive, in cents) and base percentage of each tier.
/// Amounts above the last bound get [`TOP_TIER_PERCENT`].
const TIERS: [(i64, u32); 5] = [
    (50_000, 0),
    (100_000, 3),
    (500_000, 5),
    (1_000_000, 7),
    (5_000_000, 10),
];
const TOP_TIER_PERCENT: u32 = 15;

const PRIME_BONUS: Decimal = dec!(8);
const PRIME_BONUS_FLOOR: i64 = 500;
const TRAILING_FIVE_BONUS: Decimal = dec!(10);
const TRAILING_FIVE_FLOOR: i64 = 900;

pub const MAX_PERCENTAGE: Decimal = dec!(20);

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DiscountError {
    #[error("discount on {0} does not fit in an amount")]
    Overflow(Amount),
}

/// Result of a discount calculation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Discount {
    pub percentage: Decimal,
    pub amount: Amount,
    pub final_amount: Amount,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct DiscountCalculator;

impl DiscountCalculator {
    pub fn new() -> Self {
        Self
    }

    pub fn calculate(&self, total: Amount) -> Result<Discount, DiscountError> {
        let percentage = self.percentage(total);

        let amount = Decimal::from(total.cents())
            .checked_mul(percentage)
            .map(|scaled| (scaled / dec!(100)).trunc())
            .and_then(|discount| discount.to_i64())
            .map(Amount::from_cents)
            .ok_or(DiscountError::Overflow(total))?;

        let final_amount = total
            .checked_sub(amount)
            .ok_or(DiscountError::Overflow(total))?;

        Ok(Discount {
            percentage,
            amount,
            final_amount,
        })
    }

    /// Base tier plus conditional bonuses, capped at [`MAX_PERCENTAGE`].
    pub fn percentage(&self, total: Amount) -> Decimal {
        let combined = base_percentage(total) + conditional_percentage(total);
        combined.min(MAX_PERCENTAGE)
    }
}

pub fn base_percentage(total: Amount) -> Decimal {
    let cents = total.cents();
    let percent = TIERS
        .iter()
        .find(|(upper, _)| cents <= *upper)
        .map_or(TOP_TIER_PERCENT, |(_, percent)| *percent);
    Decimal::from(percent)
}

/// Bonuses evaluated on the whole-unit amount (cents truncated).
pub fn conditional_percentage(total: Amount) -> Decimal {
    let units = total.whole_units();
    let mut bonus = Decimal::ZERO;

    if units > PRIME_BONUS_FLOOR && is_prime(units) {
        bonus += PRIME_BONUS;
    }
    if units > TRAILING_FIVE_FLOOR && units % 10 == 5 {
        bonus += TRAILING_FIVE_BONUS;
    }

    bonus
}

/// Trial division over odd candidates up to the square root.
pub fn is_prime(n: i64) -> bool {
    if n <= 1 {
        return false;
    }
    if n == 2 {
        return true;
    }
    if n % 2 == 0 {
        return false;
    }

    let mut divisor = 3i64;
    while divisor <= n / divisor {
        if n % divisor == 0 {
            return false;
        }
        divisor += 2;
    }
    true
}
