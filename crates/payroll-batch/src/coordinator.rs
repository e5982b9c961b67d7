//! Fan-out/join execution of a write batch

use std::sync::Arc;
use std::time::{Duration, Instant};

use futures::future::join_all;
use payroll_core::PayrollStore;
use tokio::sync::Semaphore;
use tracing::{debug, error, info, instrument, warn};
use uuid::Uuid;

use crate::config::BatchConfig;
use crate::op::{FieldUpdate, WriteAck, WriteOp};
use crate::result::{BatchError, BatchResult, OpResult};

/// Runs batches of independent writes against one store
///
/// Every write of a batch runs as its own tokio task. At most
/// `max_in_flight` writes execute at once; the rest wait for a permit.
/// `submit_batch` returns only after every task finished, with one result
/// slot per write. A failed or panicking write never stops its siblings and
/// nothing is rolled back.
///
/// # Example
///
/// ```ignore
/// use payroll_batch::{BatchConfig, BatchCoordinator, WriteOp};
///
/// let coordinator = BatchCoordinator::new(store, BatchConfig::default().with_max_in_flight(8));
/// let result = coordinator.submit_batch(records.into_iter().map(WriteOp::insert).collect()).await;
/// assert_eq!(result.len(), 6);
/// ```
#[derive(Clone)]
pub struct BatchCoordinator {
    store: Arc<dyn PayrollStore>,
    config: BatchConfig,
}

impl BatchCoordinator {
    /// Create a coordinator for `store`
    pub fn new(store: Arc<dyn PayrollStore>, config: BatchConfig) -> Self {
        Self { store, config }
    }

    /// Execute every operation and wait for all of them
    #[instrument(skip(self, operations), fields(batch_size = operations.len()))]
    pub async fn submit_batch(&self, operations: Vec<WriteOp>) -> BatchResult {
        let batch_id = Uuid::now_v7();
        let started = Instant::now();

        if operations.is_empty() {
            return BatchResult::new(batch_id, Vec::new(), started.elapsed());
        }

        let permits = Arc::new(Semaphore::new(self.config.permits()));
        let handles: Vec<_> = operations
            .iter()
            .cloned()
            .enumerate()
            .map(|(index, op)| {
                let store = Arc::clone(&self.store);
                let permits = Arc::clone(&permits);
                let timeout = self.config.op_timeout;

                tokio::spawn(async move {
                    let _permit = permits
                        .acquire_owned()
                        .await
                        .map_err(|_| BatchError::Aborted("in-flight limiter closed".into()))?;

                    debug!(%batch_id, index, op = %op, "executing write");
                    execute(store.as_ref(), &op, timeout).await
                })
            })
            .collect();

        let joined = join_all(handles).await;

        let entries: Vec<OpResult> = operations
            .into_iter()
            .zip(joined)
            .enumerate()
            .map(|(index, (op, joined))| {
                let outcome = joined.unwrap_or_else(|e| {
                    error!(%batch_id, index, "write task failed: {}", e);
                    Err(BatchError::Aborted(e.to_string()))
                });

                if let Err(err) = &outcome {
                    warn!(
                        %batch_id,
                        index,
                        op = %op,
                        kind = err.kind(),
                        error = %err,
                        "write failed"
                    );
                }

                OpResult { index, op, outcome }
            })
            .collect();

        let result = BatchResult::new(batch_id, entries, started.elapsed());
        info!(
            %batch_id,
            size = result.len(),
            failed = result.failure_count(),
            elapsed_ms = result.elapsed().as_millis() as u64,
            "batch finished"
        );

        result
    }
}

/// Run one write, bounded by the optional time limit
async fn execute(
    store: &dyn PayrollStore,
    op: &WriteOp,
    timeout: Option<Duration>,
) -> Result<WriteAck, BatchError> {
    let write = apply(store, op);

    match timeout {
        Some(limit) => tokio::time::timeout(limit, write)
            .await
            .unwrap_or(Err(BatchError::TimedOut(limit))),
        None => write.await,
    }
}

async fn apply(store: &dyn PayrollStore, op: &WriteOp) -> Result<WriteAck, BatchError> {
    match op {
        WriteOp::Insert(record) => Ok(WriteAck::Inserted(store.insert(record).await?)),
        WriteOp::UpdateField {
            key,
            update: FieldUpdate::Salary(salary),
        } => {
            store.update_salary(key, *salary).await?;
            Ok(WriteAck::Updated(key.clone()))
        }
    }
}
