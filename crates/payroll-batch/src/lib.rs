//! # Batch Write Coordinator
//!
//! Submits a fixed batch of independent payroll writes concurrently and
//! returns once every write has finished.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                    BatchCoordinator                          │
//! │                                                              │
//! │   Vec<WriteOp> ──► spawn one task per op                     │
//! │                         │                                    │
//! │                         ▼                                    │
//! │  ┌─────────────────────────────────────────────────────┐    │
//! │  │        In-flight limiter (Semaphore-limited)         │    │
//! │  │  [op 0] [op 1] [op 2] ... [op N]  ──► PayrollStore   │    │
//! │  └─────────────────────────────────────────────────────┘    │
//! │                         │                                    │
//! │                         ▼                                    │
//! │          join all ──► BatchResult (one slot per op)          │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Example
//!
//! ```ignore
//! use payroll_batch::{BatchConfig, BatchCoordinator, WriteOp};
//!
//! let coordinator = BatchCoordinator::new(store, BatchConfig::default());
//! let result = coordinator
//!     .submit_batch(vec![
//!         WriteOp::insert(record),
//!         WriteOp::update_salary(EmployeeKey::name("Anil"), 3_000_000.0),
//!     ])
//!     .await;
//!
//! for failure in result.failures() {
//!     eprintln!("{} failed: {}", failure.op, failure.outcome.as_ref().unwrap_err());
//! }
//! ```

mod config;
mod coordinator;
mod op;
mod result;

pub use config::BatchConfig;
pub use coordinator::BatchCoordinator;
pub use op::{FieldUpdate, WriteAck, WriteOp};
pub use result::{BatchError, BatchResult, OpResult};
