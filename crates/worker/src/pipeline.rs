//! The trade execution pipeline.
//!
//! Drives one trade request through admission, pricing, the fill decision,
//! the conditional ledger mutations, and the audit writes. The order's
//! persisted status is the resumption checkpoint: re-delivery of the same
//! request resumes from it instead of repeating completed effects.

use log::{debug, error, info};
use plutus_core::{
    CreditEntryType, CreditsAccount, CreditsHistory, FeePolicy, Order, OrderId, OrderResult,
    OrderStatus, OrderType, Side, TradeRequest, Transaction,
};
use plutus_ports::{
    Admission, AuditTrail, Clock, CreditsStore, IdempotencyStore, OrderStore, PortfolioStore,
    PriceResolver, StoreError,
};
use rust_decimal::Decimal;
use std::sync::Arc;

use crate::error::{WorkerError, WorkerResult};
use crate::retry::{RetryError, RetryPolicy, with_retry};

/// One pipeline instance, shared by all workers in the pool.
pub struct TradePipeline {
    idempotency: Arc<dyn IdempotencyStore>,
    orders: Arc<dyn OrderStore>,
    portfolio: Arc<dyn PortfolioStore>,
    credits: Arc<dyn CreditsStore>,
    audit: Arc<dyn AuditTrail>,
    prices: Arc<dyn PriceResolver>,
    clock: Arc<dyn Clock>,
    fees: FeePolicy,
    retry: RetryPolicy,
}

impl TradePipeline {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        idempotency: Arc<dyn IdempotencyStore>,
        orders: Arc<dyn OrderStore>,
        portfolio: Arc<dyn PortfolioStore>,
        credits: Arc<dyn CreditsStore>,
        audit: Arc<dyn AuditTrail>,
        prices: Arc<dyn PriceResolver>,
        clock: Arc<dyn Clock>,
        fees: FeePolicy,
        retry: RetryPolicy,
    ) -> Self {
        Self {
            idempotency,
            orders,
            portfolio,
            credits,
            audit,
            prices,
            clock,
            fees,
            retry,
        }
    }

    /// Process a queued trade request to a result.
    ///
    /// A duplicate idempotency key short-circuits: terminal orders report
    /// their stored outcome, in-flight ones their current status, and
    /// `Queued`/`Open` ones resume evaluation. Never creates a second order
    /// for a key it has seen.
    pub async fn process(&self, request: &TradeRequest) -> WorkerResult<OrderResult> {
        let order = Order::from_request(request, self.clock.now());

        match self
            .idempotency
            .admit(&request.idempotency_key, order.id)
            .await?
        {
            Admission::Existing(existing) => {
                debug!(
                    "duplicate key {}, resuming order {}",
                    request.idempotency_key, existing
                );
                return self.resume(existing).await;
            }
            Admission::Admitted => {}
        }

        self.orders.insert(order.clone()).await?;

        if let Err(reason) = request.validate() {
            self.orders
                .transition(order.id, &[OrderStatus::Queued], OrderStatus::Pricing)
                .await?;
            return self.reject_claimed(order.id, &reason).await;
        }

        self.evaluate(order.id).await
    }

    /// Re-run the fill evaluation for an order, typically on a price trigger.
    pub async fn reevaluate(&self, id: OrderId) -> WorkerResult<OrderResult> {
        self.evaluate(id).await
    }

    /// Conditional `Open -> Cancelled`. A racing fill wins silently: the
    /// caller gets the order's actual terminal state back.
    pub async fn cancel(&self, id: OrderId) -> WorkerResult<OrderResult> {
        match self
            .orders
            .transition(id, &[OrderStatus::Open], OrderStatus::Cancelled)
            .await
        {
            Ok(order) => {
                info!("order {} cancelled", id);
                Ok(self.result_for(&order))
            }
            Err(StoreError::TransitionConflict { actual, .. }) => {
                debug!("cancel of order {} lost to {:?}", id, actual);
                let order = self.snapshot(id).await?;
                Ok(self.result_for(&order))
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Ids of all `Open` orders on a symbol, for price-trigger fan-out
    pub async fn open_order_ids(&self, symbol: &str) -> WorkerResult<Vec<OrderId>> {
        Ok(self
            .orders
            .open_orders(symbol)
            .await?
            .into_iter()
            .map(|o| o.id)
            .collect())
    }

    async fn resume(&self, id: OrderId) -> WorkerResult<OrderResult> {
        let order = self.await_order(id).await?;
        match order.status {
            OrderStatus::Queued | OrderStatus::Open => self.evaluate(id).await,
            // Terminal, or claimed by another worker right now
            _ => Ok(self.result_for(&order)),
        }
    }

    /// Fetch an order registered under an idempotency key.
    ///
    /// The key is registered before the order row is persisted, so a
    /// duplicate delivered inside that window can observe the key without
    /// the order. That is an in-flight request, not a missing order: poll
    /// briefly within the call deadline before giving up.
    async fn await_order(&self, id: OrderId) -> WorkerResult<Order> {
        let deadline = tokio::time::Instant::now() + self.retry.call_timeout;
        loop {
            if let Some(order) = self.orders.get(id).await? {
                return Ok(order);
            }
            if tokio::time::Instant::now() >= deadline {
                return Err(WorkerError::OrderNotFound(id));
            }
            tokio::time::sleep(self.retry.base_delay).await;
        }
    }

    /// The core evaluation: claim, price, decide, mutate, audit.
    async fn evaluate(&self, id: OrderId) -> WorkerResult<OrderResult> {
        // The claim CAS is the serializing step: concurrent evaluations of
        // the same order leave exactly one holder of `Pricing`.
        let claimed = match self
            .orders
            .transition(id, &[OrderStatus::Queued, OrderStatus::Open], OrderStatus::Pricing)
            .await
        {
            Ok(order) => order,
            Err(StoreError::TransitionConflict { actual, .. }) => {
                debug!("claim of order {} lost to {:?}", id, actual);
                let order = self.snapshot(id).await?;
                return Ok(self.result_for(&order));
            }
            Err(e) => return Err(e.into()),
        };

        let quote = match with_retry(&self.retry, "resolve price", || {
            self.prices.get_price(&claimed.symbol)
        })
        .await
        {
            Ok(quote) => quote,
            Err(RetryError::Fatal(e)) => {
                return self.reject_claimed(id, &e.to_string()).await;
            }
            Err(e @ RetryError::Exhausted { .. }) => {
                let reason = WorkerError::from(e).to_string();
                return self.reject_claimed(id, &reason).await;
            }
        };
        let price = quote.price;

        // Limit orders fill only once the market crosses the limit
        if claimed.order_type == OrderType::Limit {
            let Some(limit) = claimed.limit_price else {
                return self.reject_claimed(id, "limit orders require a limit price").await;
            };
            let crossed = match claimed.side {
                Side::Buy => price <= limit,
                Side::Sell => price >= limit,
            };
            if !crossed {
                let open = self
                    .orders
                    .transition(id, &[OrderStatus::Pricing], OrderStatus::Open)
                    .await?;
                debug!("order {} open, {} has not crossed {}", id, price, limit);
                return Ok(self.result_for(&open));
            }
        }

        // Precondition-bearing mutation, applied under the claim: the debit
        // for a buy, the holdings decrement for a sell. Idempotent per order
        // id, so a later resume or the sweep cannot double-apply it. For a
        // buy the returned account carries the post-debit balance, which is
        // what the history row must record.
        let precondition = match claimed.side {
            Side::Buy => {
                let cost = self.fees.buy_cost(claimed.quantity, price);
                with_retry(&self.retry, "debit credits", || {
                    self.credits.debit_for_order(id, &claimed.user_id, cost)
                })
                .await
                .map(Some)
            }
            Side::Sell => with_retry(&self.retry, "decrement holdings", || {
                self.portfolio
                    .apply_sell(id, &claimed.user_id, &claimed.symbol, claimed.quantity)
            })
            .await
            .map(|_| None),
        };

        let debited = match precondition {
            Ok(debited) => debited,
            Err(err) => {
                return match err {
                    RetryError::Fatal(
                        e @ (StoreError::InsufficientFunds { .. }
                        | StoreError::InsufficientHoldings { .. }),
                    ) => {
                        if claimed.order_type == OrderType::Market {
                            self.reject_claimed(id, &e.to_string()).await
                        } else {
                            // A limit order short on funds or holdings waits
                            // for a better price instead of dying.
                            let open = self
                                .orders
                                .transition(id, &[OrderStatus::Pricing], OrderStatus::Open)
                                .await?;
                            debug!("order {} back to open: {}", id, e);
                            Ok(self.result_for(&open))
                        }
                    }
                    RetryError::Fatal(e) => Err(e.into()),
                    e @ RetryError::Exhausted { .. } => {
                        let reason = WorkerError::from(e).to_string();
                        self.reject_claimed(id, &reason).await
                    }
                };
            }
        };

        // The precondition held and its effect is in: persist the fill now,
        // before the commutative counterpart writes, so a crash from here on
        // leaves a Filled order the reconciliation sweep can finish.
        let filled = self
            .orders
            .record_fill(id, price, claimed.quantity)
            .await?;

        let fee = match self.complete_fill(&filled, debited).await {
            Ok(fee) => fee,
            Err(e) => {
                error!("order {}: post-fill writes incomplete: {}", id, e);
                self.fees.fee(claimed.quantity, price)
            }
        };

        info!(
            "order {} filled: {} {} {} @ {}",
            id, claimed.side, claimed.quantity, claimed.symbol, price
        );
        Ok(OrderResult::from_order(&filled, Some(fee)))
    }

    /// Counterpart mutation and audit writes for a filled order.
    ///
    /// Every write is idempotent keyed by the order id, so this is safe to
    /// call any number of times: the pipeline calls it right after the
    /// fill, and the reconciliation sweep calls it for fills left
    /// incomplete by a crash. `debited` is the account returned by the
    /// buy's own debit; the sweep passes `None` and falls back to the
    /// idempotent replay, whose balance may include later unrelated deltas.
    pub async fn complete_fill(
        &self,
        order: &Order,
        debited: Option<CreditsAccount>,
    ) -> WorkerResult<Decimal> {
        let price = order.fill_price.ok_or(WorkerError::MissingFill(order.id))?;
        let quantity = order.fill_quantity.unwrap_or(order.quantity);
        let fee = self.fees.fee(quantity, price);
        let now = self.clock.now();

        match order.side {
            Side::Buy => {
                let cost = self.fees.buy_cost(quantity, price);
                let account = match debited {
                    Some(account) => account,
                    None => {
                        self.credits
                            .debit_for_order(order.id, &order.user_id, cost)
                            .await?
                    }
                };
                self.portfolio
                    .apply_buy(order.id, &order.user_id, &order.symbol, quantity, price)
                    .await?;
                self.audit
                    .record_transaction(Transaction::new(
                        order.id,
                        &order.user_id,
                        &order.symbol,
                        order.side,
                        quantity,
                        price,
                        fee,
                        now,
                    ))
                    .await?;
                self.audit
                    .record_credits(CreditsHistory::trade(
                        &order.user_id,
                        CreditEntryType::TradeDebit,
                        -cost,
                        account.balance,
                        order.id,
                        now,
                    ))
                    .await?;
            }
            Side::Sell => {
                self.portfolio
                    .apply_sell(order.id, &order.user_id, &order.symbol, quantity)
                    .await?;
                let proceeds = self.fees.sell_proceeds(quantity, price);
                let account = self
                    .credits
                    .credit_for_order(order.id, &order.user_id, proceeds)
                    .await?;
                self.audit
                    .record_transaction(Transaction::new(
                        order.id,
                        &order.user_id,
                        &order.symbol,
                        order.side,
                        quantity,
                        price,
                        fee,
                        now,
                    ))
                    .await?;
                self.audit
                    .record_credits(CreditsHistory::trade(
                        &order.user_id,
                        CreditEntryType::TradeCredit,
                        proceeds,
                        account.balance,
                        order.id,
                        now,
                    ))
                    .await?;
            }
        }
        Ok(fee)
    }

    async fn reject_claimed(&self, id: OrderId, reason: &str) -> WorkerResult<OrderResult> {
        let rejected = self.orders.reject(id, reason).await?;
        info!("order {} rejected: {}", id, reason);
        Ok(self.result_for(&rejected))
    }

    async fn snapshot(&self, id: OrderId) -> WorkerResult<Order> {
        self.orders
            .get(id)
            .await?
            .ok_or(WorkerError::OrderNotFound(id))
    }

    fn result_for(&self, order: &Order) -> OrderResult {
        let fee = match (order.fill_price, order.fill_quantity) {
            (Some(price), Some(quantity)) => Some(self.fees.fee(quantity, price)),
            _ => None,
        };
        OrderResult::from_order(order, fee)
    }
}
