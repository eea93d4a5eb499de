use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{OrderStatus, OrderType, Side, TradeRequest, TradeRequestId};
use crate::values::{Symbol, Timestamp, UserId};

/// Unique identifier for an order
pub type OrderId = Uuid;

/// The authoritative execution checkpoint for a single trade request (1:1).
///
/// Created by the worker on first sight of a TradeRequest and never deleted.
/// Only the worker currently holding the `Pricing` claim mutates it, and all
/// status changes go through compare-and-set transitions in the order store.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Order {
    pub id: OrderId,
    pub trade_request_id: TradeRequestId,
    pub user_id: UserId,
    pub symbol: Symbol,
    pub side: Side,
    pub order_type: OrderType,
    pub quantity: Decimal,
    pub limit_price: Option<Decimal>,
    pub status: OrderStatus,
    pub fill_price: Option<Decimal>,
    pub fill_quantity: Option<Decimal>,
    pub rejection_reason: Option<String>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl Order {
    /// Create the checkpoint order for a freshly admitted trade request
    pub fn from_request(request: &TradeRequest, now: Timestamp) -> Self {
        Self {
            id: Uuid::new_v4(),
            trade_request_id: request.id,
            user_id: request.user_id.clone(),
            symbol: request.symbol.clone(),
            side: request.side,
            order_type: request.order_type,
            quantity: request.quantity,
            limit_price: request.limit_price,
            status: OrderStatus::Queued,
            fill_price: None,
            fill_quantity: None,
            rejection_reason: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Apply a status transition. The caller (the order store) has already
    /// verified legality via `OrderStatus::can_transition_to`.
    pub fn transition(&mut self, to: OrderStatus, now: Timestamp) {
        self.status = to;
        self.updated_at = now;
    }

    /// Record fill details together with the `Pricing -> Filled` transition
    pub fn record_fill(&mut self, price: Decimal, quantity: Decimal, now: Timestamp) {
        self.status = OrderStatus::Filled;
        self.fill_price = Some(price);
        self.fill_quantity = Some(quantity);
        self.updated_at = now;
    }

    /// Record a terminal rejection with its reason
    pub fn record_rejection(&mut self, reason: &str, now: Timestamp) {
        self.status = OrderStatus::Rejected;
        self.rejection_reason = Some(reason.to_string());
        self.updated_at = now;
    }
}

/// Result reported back to the enqueuing caller via polling or callback
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderResult {
    pub order_id: OrderId,
    pub status: OrderStatus,
    pub fill_price: Option<Decimal>,
    pub fee: Option<Decimal>,
    pub rejection_reason: Option<String>,
}

impl OrderResult {
    /// Build a result from a persisted order and the fee charged (if filled)
    pub fn from_order(order: &Order, fee: Option<Decimal>) -> Self {
        Self {
            order_id: order.id,
            status: order.status,
            fill_price: order.fill_price,
            fee,
            rejection_reason: order.rejection_reason.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use rust_decimal_macros::dec;

    #[test]
    fn test_order_mirrors_request() {
        let now = Utc::now();
        let req = TradeRequest::market("k1", "user1", "BTCUSDT", Side::Buy, dec!(0.01), now);
        let order = Order::from_request(&req, now);

        assert_eq!(order.trade_request_id, req.id);
        assert_eq!(order.status, OrderStatus::Queued);
        assert_eq!(order.quantity, dec!(0.01));
        assert!(order.fill_price.is_none());
    }

    #[test]
    fn test_record_fill_sets_terminal_state() {
        let now = Utc::now();
        let req = TradeRequest::market("k1", "user1", "BTCUSDT", Side::Buy, dec!(0.01), now);
        let mut order = Order::from_request(&req, now);

        order.transition(OrderStatus::Pricing, now);
        order.record_fill(dec!(50000), dec!(0.01), now);

        assert!(order.status.is_terminal());
        assert_eq!(order.fill_price, Some(dec!(50000)));
        assert_eq!(order.fill_quantity, Some(dec!(0.01)));
    }
}
