//! Plutus Trade Worker
//!
//! The asynchronous execution side of the ledger:
//!
//! - `TradePipeline`: admission, pricing, fill decision, conditional
//!   ledger mutation, audit
//! - `WorkerPool`: fixed pool of tokio workers over a bounded queue
//! - `FundingService`: deposits and withdrawals with history rows
//! - `ReconciliationSweep`: completes writes left behind by a crash
//! - retry with bounded exponential backoff for transient failures

pub mod error;
pub mod funding;
pub mod pipeline;
pub mod pool;
pub mod reconcile;
pub mod retry;

pub use error::{WorkerError, WorkerResult};
pub use funding::FundingService;
pub use pipeline::TradePipeline;
pub use pool::{WorkItem, WorkerPool};
pub use reconcile::{ReconciliationSweep, SweepReport};
pub use retry::{RetryError, RetryPolicy, with_retry};
