//! Deposits and withdrawals.
//!
//! Funding shares the credits store with the trade pipeline, so a deposit
//! racing a buy is still safe: both go through the store's atomic
//! conditional operations. Every funding change appends a history row with
//! the balance observed right after the mutation.

use log::info;
use plutus_core::{CreditEntryType, CreditsAccount, CreditsHistory};
use plutus_ports::{AuditTrail, Clock, CreditsStore};
use rust_decimal::Decimal;
use std::sync::Arc;

use crate::error::{WorkerError, WorkerResult};

pub struct FundingService {
    credits: Arc<dyn CreditsStore>,
    audit: Arc<dyn AuditTrail>,
    clock: Arc<dyn Clock>,
}

impl FundingService {
    pub fn new(
        credits: Arc<dyn CreditsStore>,
        audit: Arc<dyn AuditTrail>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self { credits, audit, clock }
    }

    pub async fn deposit(&self, user_id: &str, amount: Decimal) -> WorkerResult<CreditsAccount> {
        if amount <= Decimal::ZERO {
            return Err(WorkerError::Validation(
                "deposit amount must be positive".to_string(),
            ));
        }
        let account = self.credits.deposit(user_id, amount).await?;
        self.audit
            .record_credits(CreditsHistory::funding(
                user_id,
                CreditEntryType::Deposit,
                amount,
                account.balance,
                self.clock.now(),
            ))
            .await?;
        info!("deposit {} for {}: balance {}", amount, user_id, account.balance);
        Ok(account)
    }

    /// Conditional on `balance >= amount`; surfaces `InsufficientFunds`
    /// with no mutation otherwise.
    pub async fn withdraw(&self, user_id: &str, amount: Decimal) -> WorkerResult<CreditsAccount> {
        if amount <= Decimal::ZERO {
            return Err(WorkerError::Validation(
                "withdrawal amount must be positive".to_string(),
            ));
        }
        let account = self.credits.withdraw(user_id, amount).await?;
        self.audit
            .record_credits(CreditsHistory::funding(
                user_id,
                CreditEntryType::Withdraw,
                -amount,
                account.balance,
                self.clock.now(),
            ))
            .await?;
        info!("withdrawal {} for {}: balance {}", amount, user_id, account.balance);
        Ok(account)
    }
}
