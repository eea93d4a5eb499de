//! Plutus Core Domain
//!
//! Pure domain types for the Plutus trade execution pipeline.
//! This crate contains no async, no I/O, and is 100% unit testable.

pub mod entities;
pub mod fees;
pub mod values;

// Re-export commonly used types at crate root
pub use entities::{
    CreditEntryType,
    CreditsAccount,
    CreditsHistory,
    // Core trading entities
    Order,
    OrderId,
    OrderResult,
    OrderStatus,
    OrderType,
    PortfolioEntry,
    Side,
    TradeRequest,
    TradeRequestId,
    Transaction,
    TransactionId,
};
pub use fees::FeePolicy;
pub use values::{IdempotencyKey, Price, Quantity, Symbol, Timestamp, UserId};
