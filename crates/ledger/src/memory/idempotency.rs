use async_trait::async_trait;
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use log::debug;
use plutus_core::{IdempotencyKey, OrderId};
use plutus_ports::{Admission, IdempotencyStore, StoreResult};
use std::sync::Arc;

/// In-memory idempotency registry
///
/// Insert-if-absent on the client-supplied key. The entry API decides
/// admission and registration in one step, so two workers racing on the
/// same key cannot both be admitted.
pub struct MemoryIdempotencyStore {
    keys: Arc<DashMap<IdempotencyKey, OrderId>>,
}

impl MemoryIdempotencyStore {
    pub fn new() -> Self {
        Self {
            keys: Arc::new(DashMap::new()),
        }
    }
}

impl Default for MemoryIdempotencyStore {
    fn default() -> Self {
        Self::new()
    }
}

impl Clone for MemoryIdempotencyStore {
    fn clone(&self) -> Self {
        Self {
            keys: Arc::clone(&self.keys),
        }
    }
}

#[async_trait]
impl IdempotencyStore for MemoryIdempotencyStore {
    async fn admit(&self, key: &str, candidate: OrderId) -> StoreResult<Admission> {
        match self.keys.entry(key.to_string()) {
            Entry::Occupied(occupied) => {
                let existing = *occupied.get();
                debug!("key {} already admitted as order {}", key, existing);
                Ok(Admission::Existing(existing))
            }
            Entry::Vacant(vacant) => {
                vacant.insert(candidate);
                Ok(Admission::Admitted)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    #[tokio::test]
    async fn test_first_admission_wins() {
        let store = MemoryIdempotencyStore::new();
        let first = Uuid::new_v4();
        let second = Uuid::new_v4();

        assert_eq!(store.admit("k1", first).await.unwrap(), Admission::Admitted);
        assert_eq!(
            store.admit("k1", second).await.unwrap(),
            Admission::Existing(first)
        );
    }

    #[tokio::test]
    async fn test_distinct_keys_are_independent() {
        let store = MemoryIdempotencyStore::new();
        assert_eq!(
            store.admit("k1", Uuid::new_v4()).await.unwrap(),
            Admission::Admitted
        );
        assert_eq!(
            store.admit("k2", Uuid::new_v4()).await.unwrap(),
            Admission::Admitted
        );
    }

    #[tokio::test]
    async fn test_concurrent_admissions_admit_exactly_one() {
        let store = MemoryIdempotencyStore::new();
        let mut handles = Vec::new();
        for _ in 0..16 {
            let store = store.clone();
            handles.push(tokio::spawn(async move {
                store.admit("shared", Uuid::new_v4()).await.unwrap()
            }));
        }

        let mut admitted = 0;
        for handle in handles {
            if handle.await.unwrap() == Admission::Admitted {
                admitted += 1;
            }
        }
        assert_eq!(admitted, 1);
    }
}
