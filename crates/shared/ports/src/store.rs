use async_trait::async_trait;
use plutus_core::{
    CreditEntryType, CreditsAccount, CreditsHistory, Order, OrderId, OrderStatus, PortfolioEntry,
    Transaction,
};
use rust_decimal::Decimal;
use thiserror::Error;

/// Errors from the ledger store and its companions.
///
/// Precondition failures (`InsufficientFunds`, `InsufficientHoldings`,
/// `TransitionConflict`) are terminal decisions, not faults: the conditional
/// mutation observed state that forbids the write and nothing was changed.
/// `Unavailable` is the transient category subject to the retry policy.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum StoreError {
    #[error("insufficient funds: required {required}, available {available}")]
    InsufficientFunds {
        required: Decimal,
        available: Decimal,
    },

    #[error("insufficient holdings: requested {requested}, held {held}")]
    InsufficientHoldings { requested: Decimal, held: Decimal },

    #[error("order not found: {0}")]
    OrderNotFound(OrderId),

    #[error("order {order_id} is {actual:?}, transition to {requested:?} refused")]
    TransitionConflict {
        order_id: OrderId,
        actual: OrderStatus,
        requested: OrderStatus,
    },

    #[error("store unavailable: {0}")]
    Unavailable(String),
}

impl StoreError {
    pub fn is_transient(&self) -> bool {
        matches!(self, StoreError::Unavailable(_))
    }
}

pub type StoreResult<T> = std::result::Result<T, StoreError>;

/// Outcome of idempotency admission for a trade request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Admission {
    /// First sight of this key; the candidate order id was registered
    Admitted,
    /// The key was seen before; resume from the referenced order's status
    Existing(OrderId),
}

/// Deduplicates re-delivered or retried trade requests.
///
/// Backed by an insert-if-absent operation on the caller-supplied
/// idempotency key; checked and registered atomically before any ledger
/// mutation begins, so redelivery can never create a second order.
#[async_trait]
pub trait IdempotencyStore: Send + Sync {
    async fn admit(&self, key: &str, candidate: OrderId) -> StoreResult<Admission>;
}

/// Durable storage for orders: the checkpoint of the state machine.
///
/// All status changes go through `transition` (compare-and-set) or the two
/// terminal writers `record_fill`/`reject`; there is no unconditional
/// status setter.
#[async_trait]
pub trait OrderStore: Send + Sync {
    /// Persist a freshly admitted order (status `Queued`)
    async fn insert(&self, order: Order) -> StoreResult<()>;

    async fn get(&self, id: OrderId) -> StoreResult<Option<Order>>;

    /// Compare-and-set the status: succeeds only when the current status is
    /// one of `from` and the move is legal per `OrderStatus`. Returns the
    /// updated order; a lost race surfaces as `TransitionConflict` carrying
    /// the actual status.
    async fn transition(
        &self,
        id: OrderId,
        from: &[OrderStatus],
        to: OrderStatus,
    ) -> StoreResult<Order>;

    /// `Pricing -> Filled` with fill details, same CAS semantics
    async fn record_fill(
        &self,
        id: OrderId,
        price: Decimal,
        quantity: Decimal,
    ) -> StoreResult<Order>;

    /// `Pricing -> Rejected` with a reason, same CAS semantics
    async fn reject(&self, id: OrderId, reason: &str) -> StoreResult<Order>;

    /// Open orders on a symbol, for price-trigger re-evaluation
    async fn open_orders(&self, symbol: &str) -> StoreResult<Vec<Order>>;

    /// All filled orders, for the reconciliation sweep
    async fn filled_orders(&self) -> StoreResult<Vec<Order>>;
}

/// Portfolio side of the ledger store.
///
/// Every trade mutation is a single-entry atomic operation keyed by the
/// filled order's id and applied idempotently: re-applying the same order's
/// effect is a no-op that returns current state. Read-modify-write from
/// outside the store is forbidden.
#[async_trait]
pub trait PortfolioStore: Send + Sync {
    /// Insert-or-increment for a buy: bump quantity and cost basis, and
    /// re-derive `avg_buy_price` in the same atomic operation.
    async fn apply_buy(
        &self,
        order_id: OrderId,
        user_id: &str,
        symbol: &str,
        quantity: Decimal,
        price: Decimal,
    ) -> StoreResult<PortfolioEntry>;

    /// Conditional decrement for a sell, conditioned on
    /// `held quantity >= quantity`. The entry is deleted when quantity
    /// reaches exactly zero; `Ok(None)` reports that deletion.
    async fn apply_sell(
        &self,
        order_id: OrderId,
        user_id: &str,
        symbol: &str,
        quantity: Decimal,
    ) -> StoreResult<Option<PortfolioEntry>>;

    async fn get(&self, user_id: &str, symbol: &str) -> StoreResult<Option<PortfolioEntry>>;

    /// Read-only projection of a user's current holdings
    async fn positions(&self, user_id: &str) -> StoreResult<Vec<PortfolioEntry>>;
}

/// Credits side of the ledger store, same atomicity rules as the portfolio
#[async_trait]
pub trait CreditsStore: Send + Sync {
    /// Unconditional increment; creates the account on first deposit
    async fn deposit(&self, user_id: &str, amount: Decimal) -> StoreResult<CreditsAccount>;

    /// Conditional decrement for a withdrawal (`balance >= amount`)
    async fn withdraw(&self, user_id: &str, amount: Decimal) -> StoreResult<CreditsAccount>;

    /// Conditional decrement for a buy (`balance >= amount`), idempotent
    /// per order id: replays return the current account unchanged.
    async fn debit_for_order(
        &self,
        order_id: OrderId,
        user_id: &str,
        amount: Decimal,
    ) -> StoreResult<CreditsAccount>;

    /// Increment with sell proceeds, idempotent per order id
    async fn credit_for_order(
        &self,
        order_id: OrderId,
        user_id: &str,
        amount: Decimal,
    ) -> StoreResult<CreditsAccount>;

    async fn balance(&self, user_id: &str) -> StoreResult<Option<CreditsAccount>>;
}

/// Append-only audit trail for filled orders and balance changes.
///
/// Trade records are keyed by order id, making re-attempts no-ops; nothing
/// is ever mutated or deleted.
#[async_trait]
pub trait AuditTrail: Send + Sync {
    /// Append the transaction for a filled order.
    /// Returns false when the order was already recorded.
    async fn record_transaction(&self, transaction: Transaction) -> StoreResult<bool>;

    /// Append a credits history row. Rows carrying a `ref_order_id` are
    /// deduplicated on it; funding rows always append.
    async fn record_credits(&self, entry: CreditsHistory) -> StoreResult<bool>;

    async fn transaction_for(&self, order_id: OrderId) -> StoreResult<Option<Transaction>>;

    /// Whether a trade history row of the given type exists for the order
    async fn has_credits_entry(
        &self,
        order_id: OrderId,
        entry_type: CreditEntryType,
    ) -> StoreResult<bool>;

    /// Read-only projection: a user's transactions, oldest first
    async fn transactions(&self, user_id: &str) -> StoreResult<Vec<Transaction>>;

    /// Read-only projection: a user's credits history, in append order
    async fn credits_history(&self, user_id: &str) -> StoreResult<Vec<CreditsHistory>>;
}
