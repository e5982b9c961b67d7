//! Aggregated batch outcome

use std::time::Duration;

use payroll_core::{EmployeeId, StoreError};
use uuid::Uuid;

use crate::op::{WriteAck, WriteOp};

/// Why a single write of a batch failed
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum BatchError {
    /// The store rejected or failed the write
    #[error(transparent)]
    Store(#[from] StoreError),

    /// The write exceeded the configured per-write limit
    #[error("write timed out after {0:?}")]
    TimedOut(Duration),

    /// The task running the write panicked or was cancelled
    #[error("write aborted: {0}")]
    Aborted(String),
}

impl BatchError {
    /// Whether resubmitting the same write may succeed
    pub fn is_retryable(&self) -> bool {
        match self {
            BatchError::Store(err) => err.is_retryable(),
            BatchError::TimedOut(_) => true,
            BatchError::Aborted(_) => false,
        }
    }

    /// Short label for logs
    pub fn kind(&self) -> &'static str {
        match self {
            BatchError::Store(err) => err.kind(),
            BatchError::TimedOut(_) => "timed_out",
            BatchError::Aborted(_) => "aborted",
        }
    }
}

/// Outcome of one submitted write
#[derive(Debug, Clone)]
pub struct OpResult {
    /// Position of the write in the submitted batch
    pub index: usize,
    pub op: WriteOp,
    pub outcome: Result<WriteAck, BatchError>,
}

impl OpResult {
    pub fn is_success(&self) -> bool {
        self.outcome.is_ok()
    }

    /// Identifier assigned by the store, for successful inserts
    pub fn assigned_id(&self) -> Option<EmployeeId> {
        match &self.outcome {
            Ok(WriteAck::Inserted(id)) => Some(*id),
            _ => None,
        }
    }

    pub fn error(&self) -> Option<&BatchError> {
        self.outcome.as_ref().err()
    }
}

/// Result of a submitted batch: one entry per write, in submission order
#[derive(Debug, Clone)]
pub struct BatchResult {
    batch_id: Uuid,
    entries: Vec<OpResult>,
    elapsed: Duration,
}

impl BatchResult {
    pub(crate) fn new(batch_id: Uuid, entries: Vec<OpResult>, elapsed: Duration) -> Self {
        Self {
            batch_id,
            entries,
            elapsed,
        }
    }

    /// Identifier used to correlate the batch in logs
    pub fn batch_id(&self) -> Uuid {
        self.batch_id
    }

    /// Wall-clock time from submission to the join
    pub fn elapsed(&self) -> Duration {
        self.elapsed
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn entries(&self) -> &[OpResult] {
        &self.entries
    }

    pub fn iter(&self) -> std::slice::Iter<'_, OpResult> {
        self.entries.iter()
    }

    pub fn success_count(&self) -> usize {
        self.entries.iter().filter(|e| e.is_success()).count()
    }

    pub fn failure_count(&self) -> usize {
        self.len() - self.success_count()
    }

    pub fn all_succeeded(&self) -> bool {
        self.entries.iter().all(OpResult::is_success)
    }

    pub fn failures(&self) -> impl Iterator<Item = &OpResult> {
        self.entries.iter().filter(|e| !e.is_success())
    }

    /// Identifiers assigned to successful inserts, in submission order
    pub fn inserted_ids(&self) -> Vec<EmployeeId> {
        self.entries.iter().filter_map(OpResult::assigned_id).collect()
    }
}

impl IntoIterator for BatchResult {
    type Item = OpResult;
    type IntoIter = std::vec::IntoIter<OpResult>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.into_iter()
    }
}

impl<'a> IntoIterator for &'a BatchResult {
    type Item = &'a OpResult;
    type IntoIter = std::slice::Iter<'a, OpResult>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}
