use serde::{Deserialize, Serialize};

/// Order execution type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OrderType {
    /// Execute immediately at the resolved market price
    Market,
    /// Execute only when the resolved price crosses the limit price
    Limit,
}
