//! Fixed-size worker pool over an in-process queue.
//!
//! Delivery is at-least-once from the pool's point of view: a caller that
//! gets no response may submit the same request again with the same
//! idempotency key, and the pipeline guarantees a single effect.

use log::{error, info, warn};
use plutus_core::{OrderId, OrderResult, TradeRequest};
use std::sync::Arc;
use tokio::sync::{Mutex, mpsc, oneshot};
use tokio::task::JoinHandle;

use crate::error::{WorkerError, WorkerResult};
use crate::pipeline::TradePipeline;

/// Unit of work pulled off the queue
pub enum WorkItem {
    /// A fresh (or re-delivered) trade request; the responder, when present,
    /// receives the terminal result.
    Request(TradeRequest, Option<oneshot::Sender<OrderResult>>),
    /// Re-evaluate an open order after a price trigger
    Reevaluate(OrderId),
}

/// Fixed pool of workers sharing one receiver.
pub struct WorkerPool {
    pipeline: Arc<TradePipeline>,
    tx: mpsc::Sender<WorkItem>,
    handles: Vec<JoinHandle<()>>,
}

impl WorkerPool {
    /// Spawn `workers` tasks consuming a bounded queue of `queue_capacity`.
    pub fn start(pipeline: Arc<TradePipeline>, workers: usize, queue_capacity: usize) -> Self {
        let (tx, rx) = mpsc::channel(queue_capacity);
        let rx = Arc::new(Mutex::new(rx));

        let handles = (0..workers)
            .map(|worker_id| {
                let pipeline = Arc::clone(&pipeline);
                let rx = Arc::clone(&rx);
                tokio::spawn(worker_loop(worker_id, pipeline, rx))
            })
            .collect();

        info!("worker pool started with {} workers", workers);
        Self { pipeline, tx, handles }
    }

    /// Enqueue a request and get a receiver for its terminal result.
    pub async fn submit(&self, request: TradeRequest) -> WorkerResult<oneshot::Receiver<OrderResult>> {
        let (result_tx, result_rx) = oneshot::channel();
        self.tx
            .send(WorkItem::Request(request, Some(result_tx)))
            .await
            .map_err(|_| WorkerError::QueueClosed)?;
        Ok(result_rx)
    }

    /// Enqueue a request without waiting for the result; the outcome stays
    /// observable by polling the order store.
    pub async fn submit_detached(&self, request: TradeRequest) -> WorkerResult<()> {
        self.tx
            .send(WorkItem::Request(request, None))
            .await
            .map_err(|_| WorkerError::QueueClosed)
    }

    /// Fan a price trigger out into one re-evaluation per open order on the
    /// symbol. Returns how many were enqueued.
    pub async fn trigger_price(&self, symbol: &str) -> WorkerResult<usize> {
        let ids = self.pipeline.open_order_ids(symbol).await?;
        let count = ids.len();
        for id in ids {
            self.tx
                .send(WorkItem::Reevaluate(id))
                .await
                .map_err(|_| WorkerError::QueueClosed)?;
        }
        info!("price trigger on {}: {} re-evaluations enqueued", symbol, count);
        Ok(count)
    }

    /// Close the queue and wait for in-flight work to finish.
    pub async fn shutdown(self) {
        drop(self.tx);
        for handle in self.handles {
            if let Err(e) = handle.await {
                error!("worker task panicked: {}", e);
            }
        }
        info!("worker pool drained");
    }
}

async fn worker_loop(
    worker_id: usize,
    pipeline: Arc<TradePipeline>,
    rx: Arc<Mutex<mpsc::Receiver<WorkItem>>>,
) {
    loop {
        // Hold the lock only for the dequeue, never while processing
        let item = rx.lock().await.recv().await;
        let Some(item) = item else {
            break;
        };

        match item {
            WorkItem::Request(request, responder) => {
                match pipeline.process(&request).await {
                    Ok(result) => {
                        if let Some(responder) = responder {
                            // Caller may have given up waiting
                            let _ = responder.send(result);
                        }
                    }
                    Err(e) => {
                        error!(
                            "worker {}: request {} failed: {}",
                            worker_id, request.idempotency_key, e
                        );
                    }
                }
            }
            WorkItem::Reevaluate(order_id) => {
                if let Err(e) = pipeline.reevaluate(order_id).await {
                    warn!("worker {}: re-evaluation of {} failed: {}", worker_id, order_id, e);
                }
            }
        }
    }
}
