use async_trait::async_trait;
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use log::debug;
use plutus_core::{OrderId, PortfolioEntry, Symbol, UserId};
use plutus_ports::{Clock, PortfolioStore, StoreError, StoreResult};
use rust_decimal::Decimal;
use std::sync::Arc;

/// In-memory portfolio store
///
/// One entry per `(user_id, symbol)`. Mutations run under the entry's
/// write guard, which is the single-document atomicity primitive: the
/// precondition check, the mutation, and the applied-order marker are all
/// decided inside the guard, so concurrent workers on the same key
/// serialize and replays of the same order id are no-ops.
pub struct MemoryPortfolioStore {
    entries: Arc<DashMap<(UserId, Symbol), PortfolioEntry>>,
    /// Orders whose portfolio effect has been applied
    applied: Arc<DashMap<OrderId, ()>>,
    clock: Arc<dyn Clock>,
}

impl MemoryPortfolioStore {
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self {
            entries: Arc::new(DashMap::new()),
            applied: Arc::new(DashMap::new()),
            clock,
        }
    }
}

impl Clone for MemoryPortfolioStore {
    fn clone(&self) -> Self {
        Self {
            entries: Arc::clone(&self.entries),
            applied: Arc::clone(&self.applied),
            clock: Arc::clone(&self.clock),
        }
    }
}

#[async_trait]
impl PortfolioStore for MemoryPortfolioStore {
    async fn apply_buy(
        &self,
        order_id: OrderId,
        user_id: &str,
        symbol: &str,
        quantity: Decimal,
        price: Decimal,
    ) -> StoreResult<PortfolioEntry> {
        let key = (user_id.to_string(), symbol.to_string());
        let now = self.clock.now();

        match self.entries.entry(key) {
            Entry::Occupied(mut occupied) => {
                if self.applied.insert(order_id, ()).is_some() {
                    debug!("buy for order {} already applied, skipping", order_id);
                    return Ok(occupied.get().clone());
                }
                occupied.get_mut().add(quantity, price, now);
                Ok(occupied.get().clone())
            }
            Entry::Vacant(vacant) => {
                if self.applied.insert(order_id, ()).is_some() {
                    // Applied earlier and since liquidated; nothing to return
                    // but the effect: report a zero-delta view of the entry.
                    return Ok(PortfolioEntry::open(user_id, symbol, quantity, price, now));
                }
                let entry = PortfolioEntry::open(user_id, symbol, quantity, price, now);
                Ok(vacant.insert(entry).clone())
            }
        }
    }

    async fn apply_sell(
        &self,
        order_id: OrderId,
        user_id: &str,
        symbol: &str,
        quantity: Decimal,
    ) -> StoreResult<Option<PortfolioEntry>> {
        let key = (user_id.to_string(), symbol.to_string());
        let now = self.clock.now();

        match self.entries.entry(key) {
            Entry::Occupied(mut occupied) => {
                if self.applied.contains_key(&order_id) {
                    debug!("sell for order {} already applied, skipping", order_id);
                    return Ok(Some(occupied.get().clone()));
                }
                let held = occupied.get().quantity;
                if held < quantity {
                    return Err(StoreError::InsufficientHoldings {
                        requested: quantity,
                        held,
                    });
                }
                self.applied.insert(order_id, ());
                occupied.get_mut().reduce(quantity, now);
                if occupied.get().is_liquidated() {
                    occupied.remove();
                    Ok(None)
                } else {
                    Ok(Some(occupied.get().clone()))
                }
            }
            Entry::Vacant(_) => {
                if self.applied.contains_key(&order_id) {
                    // Replay of a sell that fully liquidated the entry
                    return Ok(None);
                }
                Err(StoreError::InsufficientHoldings {
                    requested: quantity,
                    held: Decimal::ZERO,
                })
            }
        }
    }

    async fn get(&self, user_id: &str, symbol: &str) -> StoreResult<Option<PortfolioEntry>> {
        let key = (user_id.to_string(), symbol.to_string());
        Ok(self.entries.get(&key).map(|e| e.value().clone()))
    }

    async fn positions(&self, user_id: &str) -> StoreResult<Vec<PortfolioEntry>> {
        let mut positions: Vec<PortfolioEntry> = self
            .entries
            .iter()
            .filter(|e| e.key().0 == user_id)
            .map(|e| e.value().clone())
            .collect();
        positions.sort_by(|a, b| a.symbol.cmp(&b.symbol));
        Ok(positions)
    }
}
