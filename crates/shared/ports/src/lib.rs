//! Plutus Ports
//!
//! Port definitions (traits) for the Plutus trade execution pipeline.
//! These define the boundaries between the worker-side domain logic and the
//! infrastructure it depends on: the ledger store, the idempotency guard,
//! the audit trail, the price feed, and the clock.

mod clock;
mod price;
mod store;

pub use clock::Clock;
pub use price::{PriceError, PriceQuote, PriceResolver, PriceResult};
pub use store::{
    Admission, AuditTrail, CreditsStore, IdempotencyStore, OrderStore, PortfolioStore, StoreError,
    StoreResult,
};
