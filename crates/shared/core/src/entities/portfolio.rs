use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::values::{Symbol, Timestamp, UserId};

/// Holdings of one user in one symbol, valued at weighted-average cost basis.
///
/// Invariant: `avg_buy_price == cost_basis / quantity` whenever
/// `quantity > 0`. The entry is removed from the store when fully
/// liquidated, so a persisted entry always has positive quantity.
///
/// Entries are mutated only through the portfolio store's atomic conditional
/// operations, never read-modify-written by callers.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PortfolioEntry {
    pub user_id: UserId,
    pub symbol: Symbol,
    pub quantity: Decimal,
    pub avg_buy_price: Decimal,
    /// Sum of `quantity * price` over all buys, undiminished by sells
    /// except proportionally (selling keeps the average cost of remaining
    /// units unchanged).
    pub cost_basis: Decimal,
    pub updated_at: Timestamp,
}

impl PortfolioEntry {
    /// Create an entry from the first buy
    pub fn open(user_id: &str, symbol: &str, quantity: Decimal, price: Decimal, now: Timestamp) -> Self {
        Self {
            user_id: user_id.to_string(),
            symbol: symbol.to_string(),
            quantity,
            avg_buy_price: price,
            cost_basis: quantity * price,
            updated_at: now,
        }
    }

    /// Add a buy: increment quantity and cost basis, re-derive the average
    pub fn add(&mut self, quantity: Decimal, price: Decimal, now: Timestamp) {
        self.quantity += quantity;
        self.cost_basis += quantity * price;
        self.avg_buy_price = self.cost_basis / self.quantity;
        self.updated_at = now;
    }

    /// Reduce by a sell. The caller has already verified
    /// `self.quantity >= quantity`; the average cost of the remaining units
    /// is unchanged and the cost basis shrinks proportionally.
    pub fn reduce(&mut self, quantity: Decimal, now: Timestamp) {
        debug_assert!(self.quantity >= quantity);
        self.quantity -= quantity;
        self.cost_basis = self.avg_buy_price * self.quantity;
        self.updated_at = now;
    }

    /// Fully liquidated entries are deleted rather than kept at zero
    pub fn is_liquidated(&self) -> bool {
        self.quantity.is_zero()
    }
}
