//! Reconciliation sweep for fills left incomplete by a crash.
//!
//! No cross-document transaction spans the order, the two ledger sides,
//! and the audit trail; a worker can die between any two writes. The sweep
//! scans `Filled` orders whose audit records are missing and re-runs the
//! post-fill writes, which are idempotent keyed by order id.

use log::{info, warn};
use plutus_core::CreditEntryType;
use plutus_core::Side;
use plutus_ports::{AuditTrail, OrderStore};
use std::sync::Arc;

use crate::error::WorkerResult;
use crate::pipeline::TradePipeline;

/// Outcome of one sweep pass
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SweepReport {
    /// Filled orders examined
    pub scanned: usize,
    /// Orders whose missing writes were completed
    pub repaired: usize,
}

pub struct ReconciliationSweep {
    orders: Arc<dyn OrderStore>,
    audit: Arc<dyn AuditTrail>,
    pipeline: Arc<TradePipeline>,
}

impl ReconciliationSweep {
    pub fn new(
        orders: Arc<dyn OrderStore>,
        audit: Arc<dyn AuditTrail>,
        pipeline: Arc<TradePipeline>,
    ) -> Self {
        Self { orders, audit, pipeline }
    }

    /// Scan all filled orders and complete any missing counterpart or audit
    /// writes. Safe to run at any time, concurrently with live traffic.
    pub async fn run_once(&self) -> WorkerResult<SweepReport> {
        let filled = self.orders.filled_orders().await?;
        let scanned = filled.len();
        let mut repaired = 0;

        for order in filled {
            let entry_type = match order.side {
                Side::Buy => CreditEntryType::TradeDebit,
                Side::Sell => CreditEntryType::TradeCredit,
            };
            let complete = self.audit.transaction_for(order.id).await?.is_some()
                && self.audit.has_credits_entry(order.id, entry_type).await?;
            if complete {
                continue;
            }

            match self.pipeline.complete_fill(&order, None).await {
                Ok(_) => {
                    info!("sweep completed writes for order {}", order.id);
                    repaired += 1;
                }
                Err(e) => {
                    // Left for the next pass
                    warn!("sweep could not repair order {}: {}", order.id, e);
                }
            }
        }

        if repaired > 0 {
            info!("sweep: {} of {} filled orders repaired", repaired, scanned);
        }
        Ok(SweepReport { scanned, repaired })
    }
}
