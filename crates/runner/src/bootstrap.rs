//! Bootstrap - wiring the execution pipeline together
//!
//! Builds the in-memory stores, the price feed cache, the shared pipeline,
//! the worker pool, the funding service, and the reconciliation sweep, all
//! on one clock.

use std::sync::Arc;

use plutus_clock::SystemClock;
use plutus_core::{OrderId, OrderResult, TradeRequest};
use plutus_ledger::{
    FeedPriceResolver, MemoryAuditLog, MemoryCreditsStore, MemoryIdempotencyStore,
    MemoryOrderStore, MemoryPortfolioStore,
};
use plutus_ports::Clock;
use plutus_worker::{
    FundingService, ReconciliationSweep, SweepReport, TradePipeline, WorkerPool, WorkerResult,
};
use tokio::sync::oneshot;

use crate::config::RunnerConfig;

/// The assembled pipeline and its collaborators.
///
/// Store handles stay public so operators (and tests) can query the
/// read-only projections directly.
pub struct PipelineBootstrap {
    pub pool: WorkerPool,
    pub pipeline: Arc<TradePipeline>,
    pub funding: FundingService,
    pub sweep: ReconciliationSweep,
    pub feed: Arc<FeedPriceResolver>,
    pub orders: Arc<MemoryOrderStore>,
    pub portfolio: Arc<MemoryPortfolioStore>,
    pub credits: Arc<MemoryCreditsStore>,
    pub audit: Arc<MemoryAuditLog>,
}

impl PipelineBootstrap {
    /// Assemble with default configuration
    pub fn new() -> Self {
        Self::with_config(RunnerConfig::default())
    }

    /// Assemble with custom configuration. Must run inside a tokio runtime
    /// (the pool spawns its workers immediately).
    pub fn with_config(config: RunnerConfig) -> Self {
        Self::with_clock(config, Arc::new(SystemClock::new()))
    }

    /// Assemble on a caller-supplied clock, for deterministic tests
    pub fn with_clock(config: RunnerConfig, clock: Arc<dyn Clock>) -> Self {
        let orders = Arc::new(MemoryOrderStore::new(Arc::clone(&clock)));
        let portfolio = Arc::new(MemoryPortfolioStore::new(Arc::clone(&clock)));
        let credits = Arc::new(MemoryCreditsStore::new(Arc::clone(&clock)));
        let audit = Arc::new(MemoryAuditLog::new());
        let idempotency = Arc::new(MemoryIdempotencyStore::new());
        let feed = Arc::new(FeedPriceResolver::new(
            config.price_max_age,
            Arc::clone(&clock),
        ));

        let pipeline = Arc::new(TradePipeline::new(
            idempotency,
            orders.clone(),
            portfolio.clone(),
            credits.clone(),
            audit.clone(),
            feed.clone(),
            Arc::clone(&clock),
            config.fees,
            config.retry,
        ));

        let pool = WorkerPool::start(pipeline.clone(), config.workers, config.queue_capacity);
        let funding = FundingService::new(credits.clone(), audit.clone(), Arc::clone(&clock));
        let sweep = ReconciliationSweep::new(orders.clone(), audit.clone(), pipeline.clone());

        log::info!(
            "pipeline bootstrapped on {}: {} workers, queue {}",
            clock.name(),
            config.workers,
            config.queue_capacity
        );

        Self {
            pool,
            pipeline,
            funding,
            sweep,
            feed,
            orders,
            portfolio,
            credits,
            audit,
        }
    }

    /// Enqueue a request and receive its terminal result
    pub async fn submit(
        &self,
        request: TradeRequest,
    ) -> WorkerResult<oneshot::Receiver<OrderResult>> {
        self.pool.submit(request).await
    }

    /// Fan a price update out to the feed cache and all open orders
    pub async fn publish_price(
        &self,
        symbol: &str,
        price: rust_decimal::Decimal,
    ) -> WorkerResult<usize> {
        self.feed.update(symbol, price);
        self.pool.trigger_price(symbol).await
    }

    /// Conditional cancel of an open order
    pub async fn cancel(&self, order_id: OrderId) -> WorkerResult<OrderResult> {
        self.pipeline.cancel(order_id).await
    }

    /// Run one reconciliation pass
    pub async fn reconcile(&self) -> WorkerResult<SweepReport> {
        self.sweep.run_once().await
    }

    /// Drain the queue and stop the workers
    pub async fn shutdown(self) {
        self.pool.shutdown().await;
    }
}

impl Default for PipelineBootstrap {
    fn default() -> Self {
        Self::new()
    }
}
