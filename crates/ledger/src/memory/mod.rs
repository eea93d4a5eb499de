//! DashMap-backed store implementations

mod audit;
mod credits;
mod idempotency;
mod orders;
mod portfolio;

pub use audit::MemoryAuditLog;
pub use credits::MemoryCreditsStore;
pub use idempotency::MemoryIdempotencyStore;
pub use orders::MemoryOrderStore;
pub use portfolio::MemoryPortfolioStore;
