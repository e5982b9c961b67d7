// In-memory implementation of PayrollStore
//
// Keeps all records in memory, making it suitable for:
// - Unit tests of the batch coordinator and the service
// - Examples that don't need a database

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::RwLock;
use tracing::debug;

use crate::employee::{validate_salary, EmployeeId, EmployeeKey, EmployeeRecord, UNSAVED_ID};
use crate::error::{Result, StoreError};
use crate::traits::{select_unique, PayrollStore};

/// In-memory payroll store
///
/// Records are keyed by identifier. Every write takes the write lock for its
/// whole duration, so a name lookup and the write it resolves to are atomic.
#[derive(Debug, Clone, Default)]
pub struct InMemoryPayrollStore {
    records: Arc<RwLock<BTreeMap<EmployeeId, EmployeeRecord>>>,
    last_id: Arc<AtomicI64>,
}

impl InMemoryPayrollStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store pre-populated with `records`
    pub fn with_records(records: impl IntoIterator<Item = EmployeeRecord>) -> Self {
        let store = Self::new();
        store.seed(records);
        store
    }

    /// Pre-populate with records (useful for testing)
    ///
    /// Records that already carry an identifier keep it; unsaved records get
    /// the next free identifier.
    pub fn seed(&self, records: impl IntoIterator<Item = EmployeeRecord>) {
        let mut stored = self.records.write();
        for mut record in records {
            if record.id == UNSAVED_ID {
                record.id = self.next_id();
            } else {
                self.last_id.fetch_max(record.id, Ordering::SeqCst);
            }
            stored.insert(record.id, record);
        }
    }

    /// Number of stored records
    pub fn len(&self) -> usize {
        self.records.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.read().is_empty()
    }

    /// Clear all records (the identifier sequence keeps counting)
    pub fn clear(&self) {
        self.records.write().clear();
    }

    fn next_id(&self) -> EmployeeId {
        self.last_id.fetch_add(1, Ordering::SeqCst) + 1
    }
}

#[async_trait]
impl PayrollStore for InMemoryPayrollStore {
    async fn insert(&self, record: &EmployeeRecord) -> Result<EmployeeId> {
        record.validate()?;

        let mut stored = self.records.write();
        let id = self.next_id();
        stored.insert(id, record.clone().with_id(id));

        debug!(id, name = %record.name, "inserted employee");
        Ok(id)
    }

    async fn update_salary(&self, key: &EmployeeKey, salary: f64) -> Result<()> {
        validate_salary(salary)?;

        let mut stored = self.records.write();
        let id = match key {
            EmployeeKey::Id(id) => *id,
            EmployeeKey::Name(_) => {
                select_unique(key, stored.values().filter(|r| r.matches(key)))?.id
            }
        };

        let record = stored
            .get_mut(&id)
            .ok_or_else(|| StoreError::NotFound(key.clone()))?;
        record.salary = salary;

        debug!(id, salary, "updated salary");
        Ok(())
    }

    async fn fetch_all(&self) -> Result<Vec<EmployeeRecord>> {
        Ok(self.records.read().values().cloned().collect())
    }

    async fn count_entries(&self) -> Result<u64> {
        Ok(self.records.read().len() as u64)
    }

    async fn fetch(&self, key: &EmployeeKey) -> Result<EmployeeRecord> {
        let stored = self.records.read();
        match key {
            EmployeeKey::Id(id) => stored
                .get(id)
                .cloned()
                .ok_or_else(|| StoreError::NotFound(key.clone())),
            EmployeeKey::Name(_) => {
                select_unique(key, stored.values().filter(|r| r.matches(key)))
            }
        }
    }
}
