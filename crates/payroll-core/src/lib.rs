// Payroll core abstractions
//
// This crate provides the DB-agnostic pieces shared by every backend:
// - Domain types: EmployeeRecord, Gender, EmployeeKey
// - PayrollStore trait with its StoreError taxonomy
// - InMemoryPayrollStore for tests and examples
//
// Key design decisions:
// - The numeric identifier is the canonical key; name lookup is a narrower
//   convenience that refuses to guess when several rows share a name
// - Stores validate records before writing so every backend rejects the same input

pub mod employee;
pub mod error;
pub mod memory;
pub mod traits;

pub use employee::{EmployeeId, EmployeeKey, EmployeeRecord, Gender, UNSAVED_ID};
pub use error::{Result, StoreError};
pub use memory::InMemoryPayrollStore;
pub use traits::PayrollStore;
