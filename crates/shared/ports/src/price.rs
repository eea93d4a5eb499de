use async_trait::async_trait;
use plutus_core::{Price, Symbol, Timestamp};
use thiserror::Error;

/// Latest known trade price for a symbol, possibly stale by a bounded interval
#[derive(Debug, Clone)]
pub struct PriceQuote {
    pub symbol: Symbol,
    pub price: Price,
    pub as_of: Timestamp,
}

/// Errors from price resolution
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PriceError {
    #[error("no price known for symbol: {0}")]
    UnknownSymbol(String),

    #[error("price for {symbol} is stale by {age_ms}ms")]
    Stale { symbol: String, age_ms: i64 },

    #[error("price feed unavailable: {0}")]
    Unavailable(String),
}

impl PriceError {
    /// Staleness and unavailability are retried; an unknown symbol is not
    pub fn is_transient(&self) -> bool {
        matches!(self, PriceError::Stale { .. } | PriceError::Unavailable(_))
    }
}

pub type PriceResult<T> = std::result::Result<T, PriceError>;

/// Port for querying the live price feed
///
/// The feed itself (ingestion, transport) is an external collaborator; this
/// port only exposes the "current price for symbol" query the pipeline
/// needs. Implementations may block or time out; callers wrap each call in
/// a per-call deadline.
#[async_trait]
pub trait PriceResolver: Send + Sync {
    async fn get_price(&self, symbol: &str) -> PriceResult<PriceQuote>;
}
