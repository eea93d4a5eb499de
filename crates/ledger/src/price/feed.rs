use async_trait::async_trait;
use chrono::Duration;
use dashmap::DashMap;
use log::debug;
use plutus_core::{Price, Symbol};
use plutus_ports::{Clock, PriceError, PriceQuote, PriceResolver, PriceResult};
use std::sync::Arc;

/// Latest-quote cache fed by an external market data stream.
///
/// `update` overwrites the cached quote for a symbol; `get_price` serves it
/// back as long as it is younger than `max_age`. A quote past the bound is
/// reported as `Stale` rather than served, since pricing a fill off an old
/// quote is worse than retrying.
pub struct FeedPriceResolver {
    quotes: Arc<DashMap<Symbol, PriceQuote>>,
    max_age: Duration,
    clock: Arc<dyn Clock>,
}

impl FeedPriceResolver {
    pub fn new(max_age: Duration, clock: Arc<dyn Clock>) -> Self {
        Self {
            quotes: Arc::new(DashMap::new()),
            max_age,
            clock,
        }
    }

    /// Record a fresh quote from the feed
    pub fn update(&self, symbol: &str, price: Price) {
        let quote = PriceQuote {
            symbol: symbol.to_string(),
            price,
            as_of: self.clock.now(),
        };
        debug!("quote {} @ {}", symbol, price);
        self.quotes.insert(symbol.to_string(), quote);
    }
}

impl Clone for FeedPriceResolver {
    fn clone(&self) -> Self {
        Self {
            quotes: Arc::clone(&self.quotes),
            max_age: self.max_age,
            clock: Arc::clone(&self.clock),
        }
    }
}

#[async_trait]
impl PriceResolver for FeedPriceResolver {
    async fn get_price(&self, symbol: &str) -> PriceResult<PriceQuote> {
        let quote = self
            .quotes
            .get(symbol)
            .map(|q| q.value().clone())
            .ok_or_else(|| PriceError::UnknownSymbol(symbol.to_string()))?;

        let age = self.clock.now() - quote.as_of;
        if age > self.max_age {
            return Err(PriceError::Stale {
                symbol: symbol.to_string(),
                age_ms: age.num_milliseconds(),
            });
        }
        Ok(quote)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use plutus_clock::ManualClock;
    use rust_decimal_macros::dec;

    fn resolver(clock: Arc<ManualClock>) -> FeedPriceResolver {
        FeedPriceResolver::new(Duration::seconds(5), clock)
    }

    #[tokio::test]
    async fn test_unknown_symbol() {
        let clock = Arc::new(ManualClock::new());
        let resolver = resolver(clock);
        assert_eq!(
            resolver.get_price("BTCUSDT").await.unwrap_err(),
            PriceError::UnknownSymbol("BTCUSDT".to_string())
        );
    }

    #[tokio::test]
    async fn test_fresh_quote_served() {
        let clock = Arc::new(ManualClock::new());
        let resolver = resolver(Arc::clone(&clock));
        resolver.update("BTCUSDT", dec!(50000));

        let quote = resolver.get_price("BTCUSDT").await.unwrap();
        assert_eq!(quote.price, dec!(50000));
    }

    #[tokio::test]
    async fn test_quote_past_bound_is_stale() {
        let clock = Arc::new(ManualClock::new());
        let resolver = resolver(Arc::clone(&clock));
        resolver.update("BTCUSDT", dec!(50000));

        clock.advance(Duration::seconds(6));
        let err = resolver.get_price("BTCUSDT").await.unwrap_err();
        assert!(matches!(err, PriceError::Stale { age_ms, .. } if age_ms >= 6000));
        assert!(err.is_transient());
    }

    #[tokio::test]
    async fn test_update_refreshes_staleness() {
        let clock = Arc::new(ManualClock::new());
        let resolver = resolver(Arc::clone(&clock));
        resolver.update("BTCUSDT", dec!(50000));

        clock.advance(Duration::seconds(6));
        resolver.update("BTCUSDT", dec!(50100));

        let quote = resolver.get_price("BTCUSDT").await.unwrap();
        assert_eq!(quote.price, dec!(50100));
    }
}
