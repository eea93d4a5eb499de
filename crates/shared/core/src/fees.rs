//! Trading fee policy.
//!
//! The fee rate is a configuration parameter, not a constant: the rate and
//! its symmetry across sides are deployment decisions. Fees are rounded to
//! 8 decimal places so `balance_after` values reconstruct exactly from the
//! credits history.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

/// Decimal places used for fee rounding
const FEE_SCALE: u32 = 8;

/// Deterministic fee schedule applied symmetrically to buys and sells
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct FeePolicy {
    /// Fraction of gross notional charged per fill (e.g. 0.001 = 10 bps)
    pub rate: Decimal,
}

impl Default for FeePolicy {
    fn default() -> Self {
        Self { rate: dec!(0.001) }
    }
}

impl FeePolicy {
    pub fn new(rate: Decimal) -> Self {
        Self { rate }
    }

    /// Fee for a fill of `quantity` at `price`
    pub fn fee(&self, quantity: Decimal, price: Decimal) -> Decimal {
        (quantity * price * self.rate).round_dp(FEE_SCALE)
    }

    /// Funds a buyer must hold: gross notional plus fee
    pub fn buy_cost(&self, quantity: Decimal, price: Decimal) -> Decimal {
        quantity * price + self.fee(quantity, price)
    }

    /// Funds a seller receives: gross notional minus fee
    pub fn sell_proceeds(&self, quantity: Decimal, price: Decimal) -> Decimal {
        quantity * price - self.fee(quantity, price)
    }
}
