// Employee payroll service
//
// Keeps an in-memory roster of employees next to a backing PayrollStore:
// - reads the roster from the store (database or REST mirror)
// - adds employees one by one or as a concurrent batch
// - updates salaries, singly or as a concurrent batch
// - checks that a roster entry is in sync with the store

pub mod config;
pub mod error;
pub mod service;

pub use config::{ConfigError, PayrollConfig, StoreBackend};
pub use error::{Result, ServiceError};
pub use service::EmployeePayrollService;

// Re-exports for convenience
pub use payroll_batch::{BatchConfig, BatchError, BatchResult, WriteAck, WriteOp};
pub use payroll_core::{EmployeeId, EmployeeKey, EmployeeRecord, Gender, PayrollStore, StoreError};
