use rust_decimal::{Decimal, RoundingStrategy};
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::ops::{Add, Mul};

/// A decimal amount rounded up to four places at construction, so every
/// value that has passed through this type is already quantized; call
/// sites never hand-roll rounding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Money(Decimal);

impl Money {
    pub const ZERO: Money = Money(Decimal::ZERO);

    /// Rounds `amount` up (ceiling) to four decimal places. This is the
    /// single rounding policy every cost computation in this crate funnels
    /// through.
    pub fn ceil4(amount: Decimal) -> Self {
        Money(amount.round_dp_with_strategy(4, RoundingStrategy::AwayFromZero).max(Decimal::ZERO))
    }

    pub fn as_decimal(self) -> Decimal {
        self.0
    }
}

impl Add for Money {
    type Output = Money;

    fn add(self, rhs: Money) -> Money {
        Money::ceil4(self.0 + rhs.0)
    }
}

impl Mul<Decimal> for Money {
    type Output = Money;

    fn mul(self, rhs: Decimal) -> Money {
        Money::ceil4(self.0 * rhs)
    }
}

/// `tokens / 1_000_000 * price`, rounded up to four places.
pub fn token_cost(tokens: u64, price_per_million: Decimal) -> Money {
    let tokens = Decimal::from(tokens);
    Money::ceil4(tokens / dec!(1_000_000) * price_per_million)
}
