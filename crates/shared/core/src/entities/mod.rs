//! Domain entities for the trade execution pipeline

mod credits;
mod order;
mod order_status;
mod order_type;
mod portfolio;
mod side;
mod trade_request;
mod transaction;

pub use credits::{CreditEntryType, CreditsAccount, CreditsHistory};
pub use order::{Order, OrderId, OrderResult};
pub use order_status::OrderStatus;
pub use order_type::OrderType;
pub use portfolio::PortfolioEntry;
pub use side::Side;
pub use trade_request::{TradeRequest, TradeRequestId};
pub use transaction::{Transaction, TransactionId};
