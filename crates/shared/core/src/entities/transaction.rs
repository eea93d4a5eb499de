use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{OrderId, Side};
use crate::values::{Symbol, Timestamp, UserId};

/// Unique identifier for a transaction
pub type TransactionId = Uuid;

/// Append-only record of a filled order, written exactly once and never
/// mutated. `total` is the gross notional (`quantity * price`); the fee is
/// reported separately.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Transaction {
    pub id: TransactionId,
    pub order_id: OrderId,
    pub user_id: UserId,
    pub symbol: Symbol,
    pub side: Side,
    pub quantity: Decimal,
    pub price: Decimal,
    pub fee: Decimal,
    pub total: Decimal,
    pub created_at: Timestamp,
}

impl Transaction {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        order_id: OrderId,
        user_id: &str,
        symbol: &str,
        side: Side,
        quantity: Decimal,
        price: Decimal,
        fee: Decimal,
        now: Timestamp,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            order_id,
            user_id: user_id.to_string(),
            symbol: symbol.to_string(),
            side,
            quantity,
            price,
            fee,
            total: quantity * price,
            created_at: now,
        }
    }
}
