// EmployeePayrollService: in-memory roster kept next to a PayrollStore

use std::sync::Arc;

use payroll_batch::{BatchConfig, BatchCoordinator, BatchResult, FieldUpdate, WriteAck, WriteOp};
use payroll_core::traits::select_unique;
use payroll_core::{EmployeeId, EmployeeKey, EmployeeRecord, PayrollStore};
use tracing::{debug, info, instrument, warn};

use crate::config::{PayrollConfig, StoreBackend};
use crate::error::{Result, ServiceError};

/// Payroll service over one backing store
///
/// The roster mirrors what the service has read from or written to the store.
/// Single writes go straight to the store; bulk writes go through a
/// [`BatchCoordinator`] and only successful slots are folded into the roster.
pub struct EmployeePayrollService {
    store: Arc<dyn PayrollStore>,
    coordinator: BatchCoordinator,
    roster: Vec<EmployeeRecord>,
}

impl EmployeePayrollService {
    /// Create a service with an empty roster
    pub fn new(store: Arc<dyn PayrollStore>, batch: BatchConfig) -> Self {
        Self::with_roster(store, Vec::new(), batch)
    }

    /// Create a service with a pre-populated roster
    pub fn with_roster(
        store: Arc<dyn PayrollStore>,
        roster: Vec<EmployeeRecord>,
        batch: BatchConfig,
    ) -> Self {
        let coordinator = BatchCoordinator::new(Arc::clone(&store), batch);
        Self {
            store,
            coordinator,
            roster,
        }
    }

    /// Open the configured store and create a service for it
    pub async fn open(config: &PayrollConfig, backend: StoreBackend) -> Result<Self> {
        let store = config.open_store(backend).await?;
        Ok(Self::new(store, config.batch.clone()))
    }

    pub fn store(&self) -> &Arc<dyn PayrollStore> {
        &self.store
    }

    pub fn roster(&self) -> &[EmployeeRecord] {
        &self.roster
    }

    pub fn roster_len(&self) -> usize {
        self.roster.len()
    }

    /// Replace the roster with the current contents of the store
    #[instrument(skip(self))]
    pub async fn read_payroll_data(&mut self) -> Result<&[EmployeeRecord]> {
        self.roster = self.store.fetch_all().await?;
        debug!(count = self.roster.len(), "Roster loaded");
        Ok(&self.roster)
    }

    /// Number of rows in the store
    pub async fn count_entries(&self) -> Result<u64> {
        Ok(self.store.count_entries().await?)
    }

    /// Insert one employee and append it to the roster with its assigned id
    #[instrument(skip(self, record), fields(name = %record.name))]
    pub async fn add_employee(&mut self, record: EmployeeRecord) -> Result<EmployeeId> {
        let id = self.store.insert(&record).await?;
        self.roster.push(record.with_id(id));
        info!(id, "Employee added");
        Ok(id)
    }

    /// Insert employees one after another, stopping at the first failure
    ///
    /// Employees inserted before the failure stay in the store and the roster.
    pub async fn add_employees(
        &mut self,
        records: Vec<EmployeeRecord>,
    ) -> Result<Vec<EmployeeId>> {
        let mut ids = Vec::with_capacity(records.len());
        for record in records {
            ids.push(self.add_employee(record).await?);
        }
        Ok(ids)
    }

    /// Insert employees as one concurrent batch
    ///
    /// Every successful slot is appended to the roster with its assigned id,
    /// in submission order. Failed slots leave the roster untouched.
    #[instrument(skip(self, records), fields(count = records.len()))]
    pub async fn add_employees_concurrently(
        &mut self,
        records: Vec<EmployeeRecord>,
    ) -> BatchResult {
        let operations = records.into_iter().map(WriteOp::insert).collect();
        let result = self.coordinator.submit_batch(operations).await;

        for entry in result.iter() {
            if let (WriteOp::Insert(record), Ok(WriteAck::Inserted(id))) =
                (&entry.op, &entry.outcome)
            {
                self.roster.push(record.clone().with_id(*id));
            }
        }

        result
    }

    /// Update one salary in the store, then in the roster
    #[instrument(skip(self, key), fields(key = %key))]
    pub async fn update_salary(&mut self, key: EmployeeKey, salary: f64) -> Result<()> {
        self.store.update_salary(&key, salary).await?;
        self.apply_salary(&key, salary);
        Ok(())
    }

    /// Update several salaries as one concurrent batch
    ///
    /// The roster is updated only for the slots that succeeded.
    #[instrument(skip(self, updates))]
    pub async fn update_salaries<I>(&mut self, updates: I) -> BatchResult
    where
        I: IntoIterator<Item = (EmployeeKey, f64)>,
    {
        let operations: Vec<WriteOp> = updates
            .into_iter()
            .map(|(key, salary)| WriteOp::update_salary(key, salary))
            .collect();
        let result = self.coordinator.submit_batch(operations).await;

        for entry in result.iter() {
            if let (
                WriteOp::UpdateField {
                    key,
                    update: FieldUpdate::Salary(salary),
                },
                Ok(WriteAck::Updated(_)),
            ) = (&entry.op, &entry.outcome)
            {
                self.apply_salary(key, *salary);
            }
        }

        result
    }

    /// Whether the roster entry for `key` matches what the store holds
    ///
    /// Persisted roster entries are re-read by id and compared on every
    /// field. Entries without an id are re-read by name and compared on
    /// everything but the id.
    #[instrument(skip(self, key), fields(key = %key))]
    pub async fn is_in_sync(&self, key: &EmployeeKey) -> Result<bool> {
        let local = self.roster_entry(key)?;

        let in_sync = if local.is_persisted() {
            let stored = self.store.fetch(&EmployeeKey::Id(local.id)).await?;
            stored == local
        } else {
            let stored = self.store.fetch(&EmployeeKey::Name(local.name.clone())).await?;
            stored.same_details(&local)
        };

        debug!(in_sync, "Roster entry checked against store");
        Ok(in_sync)
    }

    fn roster_entry(&self, key: &EmployeeKey) -> Result<EmployeeRecord> {
        select_unique(key, self.roster.iter().filter(|r| r.matches(key)))
            .map_err(ServiceError::from_roster_lookup)
    }

    fn apply_salary(&mut self, key: &EmployeeKey, salary: f64) {
        let mut matching = self.roster.iter_mut().filter(|r| r.matches(key));
        match (matching.next(), matching.next()) {
            (Some(record), None) => record.salary = salary,
            (None, _) => warn!(%key, "Salary updated in store but employee is not in roster"),
            (Some(_), Some(_)) => {
                warn!(%key, "Salary updated in store but roster holds several matches")
            }
        }
    }
}
