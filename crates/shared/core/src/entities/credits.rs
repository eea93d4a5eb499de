use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::OrderId;
use crate::values::{Timestamp, UserId};

/// Cash balance of a single user.
///
/// Invariant: `balance >= 0` at every observable point. The balance is
/// mutated only through the credits store's atomic conditional operations.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreditsAccount {
    pub user_id: UserId,
    pub balance: Decimal,
    pub updated_at: Timestamp,
}

impl CreditsAccount {
    pub fn new(user_id: &str, balance: Decimal, now: Timestamp) -> Self {
        Self {
            user_id: user_id.to_string(),
            balance,
            updated_at: now,
        }
    }
}

/// Reason a credits balance changed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CreditEntryType {
    Deposit,
    Withdraw,
    /// Funds debited by a filled buy order
    TradeDebit,
    /// Proceeds credited by a filled sell order
    TradeCredit,
}

/// Append-only record of a single credits balance change.
///
/// `amount` is signed (negative for debits), and `balance_after` is the
/// balance observed immediately after the corresponding mutation, so the
/// full balance history can be reconstructed offline by replay.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreditsHistory {
    pub id: Uuid,
    pub user_id: UserId,
    pub entry_type: CreditEntryType,
    pub amount: Decimal,
    pub balance_after: Decimal,
    /// Present for trade entries, used for reconciliation
    pub ref_order_id: Option<OrderId>,
    pub created_at: Timestamp,
}

impl CreditsHistory {
    /// History row for a deposit or withdrawal
    pub fn funding(
        user_id: &str,
        entry_type: CreditEntryType,
        amount: Decimal,
        balance_after: Decimal,
        now: Timestamp,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            user_id: user_id.to_string(),
            entry_type,
            amount,
            balance_after,
            ref_order_id: None,
            created_at: now,
        }
    }

    /// History row for a trade debit or credit, keyed by the filled order
    pub fn trade(
        user_id: &str,
        entry_type: CreditEntryType,
        amount: Decimal,
        balance_after: Decimal,
        order_id: OrderId,
        now: Timestamp,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            user_id: user_id.to_string(),
            entry_type,
            amount,
            balance_after,
            ref_order_id: Some(order_id),
            created_at: now,
        }
    }
}
