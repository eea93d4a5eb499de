use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{OrderType, Side};
use crate::values::{IdempotencyKey, Symbol, Timestamp, UserId};

/// Unique identifier for a trade request
pub type TradeRequestId = Uuid;

/// A queued buy/sell request, immutable once submitted.
///
/// The submitting collaborator guarantees that `user_id` exists and
/// `quantity > 0` before enqueuing; the worker still rejects malformed
/// payloads defensively. Delivery is at-least-once, so the same request may
/// be seen more than once: `idempotency_key` makes re-processing harmless.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TradeRequest {
    pub id: TradeRequestId,
    pub idempotency_key: IdempotencyKey,
    pub user_id: UserId,
    pub symbol: Symbol,
    pub side: Side,
    pub order_type: OrderType,
    pub quantity: Decimal,
    /// Required for Limit orders
    pub limit_price: Option<Decimal>,
    pub submitted_at: DateTime<Utc>,
}

impl TradeRequest {
    /// Create a market order request
    pub fn market(
        idempotency_key: impl Into<IdempotencyKey>,
        user_id: impl Into<UserId>,
        symbol: &str,
        side: Side,
        quantity: Decimal,
        submitted_at: Timestamp,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            idempotency_key: idempotency_key.into(),
            user_id: user_id.into(),
            symbol: symbol.to_uppercase(),
            side,
            order_type: OrderType::Market,
            quantity,
            limit_price: None,
            submitted_at,
        }
    }

    /// Create a limit order request
    pub fn limit(
        idempotency_key: impl Into<IdempotencyKey>,
        user_id: impl Into<UserId>,
        symbol: &str,
        side: Side,
        quantity: Decimal,
        limit_price: Decimal,
        submitted_at: Timestamp,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            idempotency_key: idempotency_key.into(),
            user_id: user_id.into(),
            symbol: symbol.to_uppercase(),
            side,
            order_type: OrderType::Limit,
            quantity,
            limit_price: Some(limit_price),
            submitted_at,
        }
    }

    /// Validate the request payload. Returns the rejection reason when invalid.
    pub fn validate(&self) -> Result<(), String> {
        if self.quantity <= Decimal::ZERO {
            return Err("quantity must be positive".to_string());
        }
        if self.order_type == OrderType::Limit {
            match self.limit_price {
                Some(p) if p > Decimal::ZERO => {}
                Some(_) => return Err("limit price must be positive".to_string()),
                None => return Err("limit orders require a limit price".to_string()),
            }
        }
        if self.symbol.is_empty() {
            return Err("symbol must not be empty".to_string());
        }
        Ok(())
    }
}
