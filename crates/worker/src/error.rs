use plutus_core::OrderId;
use plutus_ports::{PriceError, StoreError};
use thiserror::Error;

use crate::retry::RetryError;

/// Errors surfaced by the worker pipeline and its services.
///
/// Terminal trade outcomes (rejections, duplicates, cancelled orders) are
/// NOT errors: they come back as an `OrderResult`. These variants are
/// faults of the machinery itself.
#[derive(Error, Debug)]
pub enum WorkerError {
    #[error("validation failed: {0}")]
    Validation(String),

    #[error("order not found: {0}")]
    OrderNotFound(OrderId),

    #[error("order {0} is filled but carries no fill details")]
    MissingFill(OrderId),

    #[error("retries exhausted after {attempts} attempts: {reason}")]
    RetriesExhausted { attempts: u32, reason: String },

    #[error("work queue is closed")]
    QueueClosed,

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Price(#[from] PriceError),
}

pub type WorkerResult<T> = std::result::Result<T, WorkerError>;

impl From<RetryError<StoreError>> for WorkerError {
    fn from(err: RetryError<StoreError>) -> Self {
        match err {
            RetryError::Fatal(e) => WorkerError::Store(e),
            RetryError::Exhausted { attempts, last } => WorkerError::RetriesExhausted {
                attempts,
                reason: last
                    .map(|e| e.to_string())
                    .unwrap_or_else(|| "deadline exceeded".to_string()),
            },
        }
    }
}

impl From<RetryError<PriceError>> for WorkerError {
    fn from(err: RetryError<PriceError>) -> Self {
        match err {
            RetryError::Fatal(e) => WorkerError::Price(e),
            RetryError::Exhausted { attempts, last } => WorkerError::RetriesExhausted {
                attempts,
                reason: last
                    .map(|e| e.to_string())
                    .unwrap_or_else(|| "deadline exceeded".to_string()),
            },
        }
    }
}
