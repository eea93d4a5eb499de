use async_trait::async_trait;
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use log::debug;
use plutus_core::{CreditEntryType, CreditsHistory, OrderId, Transaction};
use plutus_ports::{AuditTrail, StoreResult};
use std::sync::{Arc, Mutex};

/// In-memory audit trail
///
/// Transactions are keyed by the filled order's id, so a replayed fill can
/// never produce a second record. Credits history is a plain append-only
/// log; trade rows are additionally deduplicated on `ref_order_id`.
pub struct MemoryAuditLog {
    transactions: Arc<DashMap<OrderId, Transaction>>,
    history: Arc<Mutex<Vec<CreditsHistory>>>,
    /// `(order, entry type)` pairs already present in the history log
    trade_rows: Arc<DashMap<(OrderId, CreditEntryType), ()>>,
}

impl MemoryAuditLog {
    pub fn new() -> Self {
        Self {
            transactions: Arc::new(DashMap::new()),
            history: Arc::new(Mutex::new(Vec::new())),
            trade_rows: Arc::new(DashMap::new()),
        }
    }
}

impl Default for MemoryAuditLog {
    fn default() -> Self {
        Self::new()
    }
}

impl Clone for MemoryAuditLog {
    fn clone(&self) -> Self {
        Self {
            transactions: Arc::clone(&self.transactions),
            history: Arc::clone(&self.history),
            trade_rows: Arc::clone(&self.trade_rows),
        }
    }
}

#[async_trait]
impl AuditTrail for MemoryAuditLog {
    async fn record_transaction(&self, transaction: Transaction) -> StoreResult<bool> {
        match self.transactions.entry(transaction.order_id) {
            Entry::Occupied(_) => {
                debug!(
                    "transaction for order {} already recorded",
                    transaction.order_id
                );
                Ok(false)
            }
            Entry::Vacant(vacant) => {
                vacant.insert(transaction);
                Ok(true)
            }
        }
    }

    async fn record_credits(&self, entry: CreditsHistory) -> StoreResult<bool> {
        if let Some(order_id) = entry.ref_order_id {
            match self.trade_rows.entry((order_id, entry.entry_type)) {
                Entry::Occupied(_) => {
                    debug!("credits row for order {} already recorded", order_id);
                    return Ok(false);
                }
                Entry::Vacant(vacant) => {
                    vacant.insert(());
                }
            }
        }
        self.history.lock().unwrap().push(entry);
        Ok(true)
    }

    async fn transaction_for(&self, order_id: OrderId) -> StoreResult<Option<Transaction>> {
        Ok(self.transactions.get(&order_id).map(|t| t.value().clone()))
    }

    async fn has_credits_entry(
        &self,
        order_id: OrderId,
        entry_type: CreditEntryType,
    ) -> StoreResult<bool> {
        Ok(self.trade_rows.contains_key(&(order_id, entry_type)))
    }

    async fn transactions(&self, user_id: &str) -> StoreResult<Vec<Transaction>> {
        let mut transactions: Vec<Transaction> = self
            .transactions
            .iter()
            .filter(|t| t.user_id == user_id)
            .map(|t| t.value().clone())
            .collect();
        transactions.sort_by_key(|t| t.created_at);
        Ok(transactions)
    }

    async fn credits_history(&self, user_id: &str) -> StoreResult<Vec<CreditsHistory>> {
        Ok(self
            .history
            .lock()
            .unwrap()
            .iter()
            .filter(|row| row.user_id == user_id)
            .cloned()
            .collect())
    }
}
