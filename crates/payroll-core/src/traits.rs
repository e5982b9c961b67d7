// Store trait for pluggable payroll backends
//
// Implementations:
// - InMemoryPayrollStore for tests and examples
// - PostgresPayrollStore for the relational store
// - RestPayrollStore for the JSON-server mirror

use async_trait::async_trait;

use crate::employee::{EmployeeId, EmployeeKey, EmployeeRecord};
use crate::error::{Result, StoreError};

// ============================================================================
// PayrollStore - The backing store of employee records
// ============================================================================

/// Trait for reading and writing employee records
///
/// Every operation is individually atomic and may be called from concurrent
/// tasks; the batch coordinator relies on this and holds no locks of its own.
#[async_trait]
pub trait PayrollStore: Send + Sync {
    /// Persist a new record and return the identifier assigned by the store
    ///
    /// The record's own `id` is ignored.
    async fn insert(&self, record: &EmployeeRecord) -> Result<EmployeeId>;

    /// Set the salary of the record addressed by `key`
    async fn update_salary(&self, key: &EmployeeKey, salary: f64) -> Result<()>;

    /// Load every record, ordered by identifier
    async fn fetch_all(&self) -> Result<Vec<EmployeeRecord>>;

    /// Number of stored records
    async fn count_entries(&self) -> Result<u64>;

    /// Load the record addressed by `key`
    async fn fetch(&self, key: &EmployeeKey) -> Result<EmployeeRecord> {
        let records = self.fetch_all().await?;
        select_unique(key, records.iter().filter(|r| r.matches(key)))
    }
}

/// Pick the single record matching `key`, failing on zero or several matches
pub fn select_unique<'a, I>(key: &EmployeeKey, matching: I) -> Result<EmployeeRecord>
where
    I: IntoIterator<Item = &'a EmployeeRecord>,
{
    let mut matching = matching.into_iter();
    let first = matching
        .next()
        .ok_or_else(|| StoreError::NotFound(key.clone()))?;

    let extra = matching.count();
    if extra > 0 {
        if let EmployeeKey::Name(name) = key {
            return Err(StoreError::AmbiguousName {
                name: name.clone(),
                matches: extra + 1,
            });
        }
        return Err(StoreError::backend(format!(
            "identifier {} is not unique",
            key
        )));
    }

    Ok(first.clone())
}
