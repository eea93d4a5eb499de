use chrono::{DateTime, Utc};
use rust_decimal::Decimal;

/// Price value - uses Decimal for precision
pub type Price = Decimal;

/// Quantity value - uses Decimal for precision
pub type Quantity = Decimal;

/// Timestamp in UTC
pub type Timestamp = DateTime<Utc>;

/// Symbol identifier for a tradeable pair (e.g. "BTCUSDT")
pub type Symbol = String;

/// User identifier, owned by the authentication collaborator
pub type UserId = String;

/// Caller-supplied token ensuring a request has effect at most once
pub type IdempotencyKey = String;
