//! Plutus Ledger Infrastructure
//!
//! In-memory implementations of the ledger ports, suitable for single-node
//! deployments and testing:
//!
//! - `MemoryOrderStore`: checkpointed orders with compare-and-set status
//!   transitions
//! - `MemoryPortfolioStore` / `MemoryCreditsStore`: atomic conditional
//!   mutation per entry, idempotent per order id
//! - `MemoryIdempotencyStore`: insert-if-absent admission
//! - `MemoryAuditLog`: append-only transactions and credits history
//! - `FeedPriceResolver`: latest-quote cache with a staleness bound
//!
//! Atomicity comes from DashMap's per-entry guards; guards are never held
//! across await points.

pub mod memory;
pub mod price;

pub use memory::{
    MemoryAuditLog, MemoryCreditsStore, MemoryIdempotencyStore, MemoryOrderStore,
    MemoryPortfolioStore,
};
pub use price::FeedPriceResolver;
