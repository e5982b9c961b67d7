//! Write operations accepted by the coordinator

use payroll_core::{EmployeeId, EmployeeKey, EmployeeRecord};

/// A field change applied by `WriteOp::UpdateField`
#[derive(Debug, Clone, PartialEq)]
pub enum FieldUpdate {
    Salary(f64),
}

/// One independent write
#[derive(Debug, Clone, PartialEq)]
pub enum WriteOp {
    /// Persist a new record; the store assigns its identifier
    Insert(EmployeeRecord),

    /// Change one field of an existing record
    UpdateField { key: EmployeeKey, update: FieldUpdate },
}

impl WriteOp {
    pub fn insert(record: EmployeeRecord) -> Self {
        WriteOp::Insert(record)
    }

    pub fn update_salary(key: impl Into<EmployeeKey>, salary: f64) -> Self {
        WriteOp::UpdateField {
            key: key.into(),
            update: FieldUpdate::Salary(salary),
        }
    }
}

impl std::fmt::Display for WriteOp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            WriteOp::Insert(record) => write!(f, "insert '{}'", record.name),
            WriteOp::UpdateField {
                key,
                update: FieldUpdate::Salary(salary),
            } => write!(f, "set salary of {} to {}", key, salary),
        }
    }
}

/// Acknowledgement of a successful write
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WriteAck {
    /// The store assigned this identifier to the new record
    Inserted(EmployeeId),

    /// The record addressed by this key was updated
    Updated(EmployeeKey),
}
