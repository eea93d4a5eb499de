use async_trait::async_trait;
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use log::debug;
use plutus_core::{CreditsAccount, OrderId, UserId};
use plutus_ports::{Clock, CreditsStore, StoreError, StoreResult};
use rust_decimal::Decimal;
use std::sync::Arc;

/// In-memory credits store
///
/// One account per user. Debits are conditional on `balance >= amount`
/// inside the entry's write guard, so the balance never goes negative no
/// matter how the callers race. Trade debits and credits carry the order
/// id and are applied at most once per order.
pub struct MemoryCreditsStore {
    accounts: Arc<DashMap<UserId, CreditsAccount>>,
    /// Orders whose credits effect has been applied
    applied: Arc<DashMap<OrderId, ()>>,
    clock: Arc<dyn Clock>,
}

impl MemoryCreditsStore {
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self {
            accounts: Arc::new(DashMap::new()),
            applied: Arc::new(DashMap::new()),
            clock,
        }
    }

    fn credit(&self, user_id: &str, amount: Decimal) -> CreditsAccount {
        let now = self.clock.now();
        let mut account = self
            .accounts
            .entry(user_id.to_string())
            .or_insert_with(|| CreditsAccount::new(user_id, Decimal::ZERO, now));
        account.balance += amount;
        account.updated_at = now;
        account.clone()
    }

    fn debit(&self, user_id: &str, amount: Decimal) -> StoreResult<CreditsAccount> {
        let now = self.clock.now();
        match self.accounts.entry(user_id.to_string()) {
            Entry::Occupied(mut occupied) => {
                let available = occupied.get().balance;
                if available < amount {
                    return Err(StoreError::InsufficientFunds {
                        required: amount,
                        available,
                    });
                }
                let account = occupied.get_mut();
                account.balance -= amount;
                account.updated_at = now;
                Ok(account.clone())
            }
            Entry::Vacant(_) => Err(StoreError::InsufficientFunds {
                required: amount,
                available: Decimal::ZERO,
            }),
        }
    }
}

impl Clone for MemoryCreditsStore {
    fn clone(&self) -> Self {
        Self {
            accounts: Arc::clone(&self.accounts),
            applied: Arc::clone(&self.applied),
            clock: Arc::clone(&self.clock),
        }
    }
}

#[async_trait]
impl CreditsStore for MemoryCreditsStore {
    async fn deposit(&self, user_id: &str, amount: Decimal) -> StoreResult<CreditsAccount> {
        Ok(self.credit(user_id, amount))
    }

    async fn withdraw(&self, user_id: &str, amount: Decimal) -> StoreResult<CreditsAccount> {
        self.debit(user_id, amount)
    }

    async fn debit_for_order(
        &self,
        order_id: OrderId,
        user_id: &str,
        amount: Decimal,
    ) -> StoreResult<CreditsAccount> {
        if self.applied.contains_key(&order_id) {
            debug!("debit for order {} already applied, skipping", order_id);
            return self.balance_or_zero(user_id);
        }
        let account = self.debit(user_id, amount)?;
        self.applied.insert(order_id, ());
        Ok(account)
    }

    async fn credit_for_order(
        &self,
        order_id: OrderId,
        user_id: &str,
        amount: Decimal,
    ) -> StoreResult<CreditsAccount> {
        if self.applied.insert(order_id, ()).is_some() {
            debug!("credit for order {} already applied, skipping", order_id);
            return self.balance_or_zero(user_id);
        }
        Ok(self.credit(user_id, amount))
    }

    async fn balance(&self, user_id: &str) -> StoreResult<Option<CreditsAccount>> {
        Ok(self.accounts.get(user_id).map(|a| a.value().clone()))
    }
}

impl MemoryCreditsStore {
    fn balance_or_zero(&self, user_id: &str) -> StoreResult<CreditsAccount> {
        Ok(self
            .accounts
            .get(user_id)
            .map(|a| a.value().clone())
            .unwrap_or_else(|| CreditsAccount::new(user_id, Decimal::ZERO, self.clock.now())))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use plutus_clock::SystemClock;
    use rust_decimal_macros::dec;
    use uuid::Uuid;

    fn store() -> MemoryCreditsStore {
        MemoryCreditsStore::new(Arc::new(SystemClock::new()))
    }

    #[tokio::test]
    async fn test_deposit_creates_account() {
        let store = store();
        let account = store.deposit("user1", dec!(1000)).await.unwrap();
        assert_eq!(account.balance, dec!(1000));
    }

    #[tokio::test]
    async fn test_withdraw_cannot_overdraw() {
        let store = store();
        store.deposit("user1", dec!(100)).await.unwrap();

        let err = store.withdraw("user1", dec!(100.01)).await.unwrap_err();
        assert_eq!(
            err,
            StoreError::InsufficientFunds {
                required: dec!(100.01),
                available: dec!(100),
            }
        );
        assert_eq!(store.balance("user1").await.unwrap().unwrap().balance, dec!(100));
    }

    #[tokio::test]
    async fn test_debit_unknown_user_reports_zero_available() {
        let store = store();
        let err = store
            .debit_for_order(Uuid::new_v4(), "ghost", dec!(1))
            .await
            .unwrap_err();
        assert_eq!(
            err,
            StoreError::InsufficientFunds {
                required: dec!(1),
                available: Decimal::ZERO,
            }
        );
    }

    #[tokio::test]
    async fn test_failed_debit_leaves_no_marker() {
        let store = store();
        store.deposit("user1", dec!(10)).await.unwrap();
        let order_id = Uuid::new_v4();

        assert!(store.debit_for_order(order_id, "user1", dec!(50)).await.is_err());

        // After topping up, the same order id can still debit
        store.deposit("user1", dec!(100)).await.unwrap();
        let account = store
            .debit_for_order(order_id, "user1", dec!(50))
            .await
            .unwrap();
        assert_eq!(account.balance, dec!(60));
    }

    #[tokio::test]
    async fn test_trade_debit_replay_is_noop() {
        let store = store();
        store.deposit("user1", dec!(1000)).await.unwrap();
        let order_id = Uuid::new_v4();

        store
            .debit_for_order(order_id, "user1", dec!(400))
            .await
            .unwrap();
        let account = store
            .debit_for_order(order_id, "user1", dec!(400))
            .await
            .unwrap();

        assert_eq!(account.balance, dec!(600));
    }

    #[tokio::test]
    async fn test_trade_credit_replay_is_noop() {
        let store = store();
        let order_id = Uuid::new_v4();

        store
            .credit_for_order(order_id, "user1", dec!(250))
            .await
            .unwrap();
        let account = store
            .credit_for_order(order_id, "user1", dec!(250))
            .await
            .unwrap();

        assert_eq!(account.balance, dec!(250));
    }

    #[tokio::test]
    async fn test_concurrent_debits_never_overdraw() {
        let store = store();
        store.deposit("user1", dec!(100)).await.unwrap();

        let mut handles = Vec::new();
        for _ in 0..10 {
            let store = store.clone();
            handles.push(tokio::spawn(async move {
                store.debit_for_order(Uuid::new_v4(), "user1", dec!(30)).await
            }));
        }
        let mut succeeded = 0;
        for handle in handles {
            if handle.await.unwrap().is_ok() {
                succeeded += 1;
            }
        }

        assert_eq!(succeeded, 3);
        assert_eq!(store.balance("user1").await.unwrap().unwrap().balance, dec!(10));
    }
}
