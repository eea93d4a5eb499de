//! Plutus Runner - Trade Execution Pipeline Orchestrator
//!
//! Wires the whole system together:
//!
//! - **Config**: worker count, queue bound, fee schedule, retry policy,
//!   price staleness bound
//! - **Bootstrap**: stores, price feed cache, pipeline, worker pool,
//!   funding service, reconciliation sweep
//!
//! ## Architecture
//!
//! ```text
//!   submit(TradeRequest)          publish_price(symbol, price)
//!            │                                │
//!            ▼                                ▼
//!   ┌─────────────────┐              ┌─────────────────┐
//!   │   Work Queue    │◀─────────────│  Price Trigger  │
//!   │ (bounded mpsc)  │  re-evals    │    fan-out      │
//!   └────────┬────────┘              └─────────────────┘
//!            │ workers (fixed pool)
//!            ▼
//!   ┌─────────────────┐     ┌──────────────────────────┐
//!   │  TradePipeline  │────▶│  Idempotency │ Orders    │
//!   │ claim → price → │     │  Portfolio   │ Credits   │
//!   │ mutate → audit  │     │  Audit Trail │ Feed      │
//!   └─────────────────┘     └──────────────────────────┘
//!            ▲
//!   ┌────────┴────────┐
//!   │ Reconciliation  │  completes writes left by crashes
//!   │     Sweep       │
//!   └─────────────────┘
//! ```

pub mod bootstrap;
pub mod config;

pub use bootstrap::PipelineBootstrap;
pub use config::RunnerConfig;
