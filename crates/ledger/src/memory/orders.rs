use async_trait::async_trait;
use dashmap::DashMap;
use log::debug;
use plutus_core::{Order, OrderId, OrderStatus};
use plutus_ports::{Clock, OrderStore, StoreError, StoreResult};
use rust_decimal::Decimal;
use std::sync::Arc;

/// In-memory order store
///
/// Orders are the resumption checkpoint of the pipeline, so every status
/// change is a compare-and-set under the entry's write guard: a worker that
/// loses a transition race observes `TransitionConflict` with the actual
/// status and no-ops. Orders are never deleted.
pub struct MemoryOrderStore {
    orders: Arc<DashMap<OrderId, Order>>,
    clock: Arc<dyn Clock>,
}

impl MemoryOrderStore {
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self {
            orders: Arc::new(DashMap::new()),
            clock,
        }
    }

    fn cas<F>(&self, id: OrderId, from: &[OrderStatus], to: OrderStatus, apply: F) -> StoreResult<Order>
    where
        F: FnOnce(&mut Order),
    {
        let mut entry = self
            .orders
            .get_mut(&id)
            .ok_or(StoreError::OrderNotFound(id))?;

        let actual = entry.status;
        if !from.contains(&actual) || !actual.can_transition_to(to) {
            return Err(StoreError::TransitionConflict {
                order_id: id,
                actual,
                requested: to,
            });
        }

        apply(entry.value_mut());
        debug!("order {} transitioned {:?} -> {:?}", id, actual, to);
        Ok(entry.value().clone())
    }
}

impl Clone for MemoryOrderStore {
    fn clone(&self) -> Self {
        Self {
            orders: Arc::clone(&self.orders),
            clock: Arc::clone(&self.clock),
        }
    }
}

#[async_trait]
impl OrderStore for MemoryOrderStore {
    async fn insert(&self, order: Order) -> StoreResult<()> {
        self.orders.insert(order.id, order);
        Ok(())
    }

    async fn get(&self, id: OrderId) -> StoreResult<Option<Order>> {
        Ok(self.orders.get(&id).map(|o| o.value().clone()))
    }

    async fn transition(
        &self,
        id: OrderId,
        from: &[OrderStatus],
        to: OrderStatus,
    ) -> StoreResult<Order> {
        let now = self.clock.now();
        self.cas(id, from, to, |order| order.transition(to, now))
    }

    async fn record_fill(
        &self,
        id: OrderId,
        price: Decimal,
        quantity: Decimal,
    ) -> StoreResult<Order> {
        let now = self.clock.now();
        self.cas(id, &[OrderStatus::Pricing], OrderStatus::Filled, |order| {
            order.record_fill(price, quantity, now)
        })
    }

    async fn reject(&self, id: OrderId, reason: &str) -> StoreResult<Order> {
        let now = self.clock.now();
        self.cas(id, &[OrderStatus::Pricing], OrderStatus::Rejected, |order| {
            order.record_rejection(reason, now)
        })
    }

    async fn open_orders(&self, symbol: &str) -> StoreResult<Vec<Order>> {
        Ok(self
            .orders
            .iter()
            .filter(|e| e.status == OrderStatus::Open && e.symbol == symbol)
            .map(|e| e.value().clone())
            .collect())
    }

    async fn filled_orders(&self) -> StoreResult<Vec<Order>> {
        Ok(self
            .orders
            .iter()
            .filter(|e| e.status == OrderStatus::Filled)
            .map(|e| e.value().clone())
            .collect())
    }
}
