use serde::{Deserialize, Serialize};

/// Order lifecycle status
///
/// The status is the authoritative checkpoint of the execution pipeline:
/// resumption after a crash or redelivery re-evaluates from the persisted
/// status rather than repeating completed effects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OrderStatus {
    /// Created on first sight of a trade request, not yet claimed by a worker
    Queued,
    /// Claimed by a worker; price resolution and fill decision in progress
    Pricing,
    /// Limit order waiting for a price-crossing trigger
    Open,
    /// Executed; ledger mutations applied
    Filled,
    /// Terminally refused (insufficient funds/holdings, invalid input)
    Rejected,
    /// Cancelled by an external request while open
    Cancelled,
}

impl OrderStatus {
    /// Returns true if no further transition occurs from this status
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            OrderStatus::Filled | OrderStatus::Rejected | OrderStatus::Cancelled
        )
    }

    /// Returns true if the transition `self -> to` is legal
    pub fn can_transition_to(&self, to: OrderStatus) -> bool {
        use OrderStatus::*;
        matches!(
            (self, to),
            (Queued, Pricing)
                | (Pricing, Filled)
                | (Pricing, Open)
                | (Pricing, Rejected)
                | (Open, Pricing)
                | (Open, Cancelled)
        )
    }
}
