// Error types for the payroll service

use payroll_core::{EmployeeKey, StoreError};
use thiserror::Error;

use crate::config::ConfigError;

/// Result type alias for service operations
pub type Result<T> = std::result::Result<T, ServiceError>;

/// Errors surfaced by EmployeePayrollService
#[derive(Debug, Error)]
pub enum ServiceError {
    /// The backing store failed
    #[error(transparent)]
    Store(#[from] StoreError),

    /// The roster holds no employee for the key
    #[error("employee not in roster: {0}")]
    NotInRoster(EmployeeKey),

    /// The roster holds several employees with this name
    #[error("roster holds {matches} employees named '{name}'")]
    AmbiguousRoster { name: String, matches: usize },

    /// Configuration could not be loaded
    #[error(transparent)]
    Config(#[from] ConfigError),
}

impl ServiceError {
    /// Translate a lookup failure on the roster
    pub(crate) fn from_roster_lookup(err: StoreError) -> Self {
        match err {
            StoreError::NotFound(key) => ServiceError::NotInRoster(key),
            StoreError::AmbiguousName { name, matches } => {
                ServiceError::AmbiguousRoster { name, matches }
            }
            other => ServiceError::Store(other),
        }
    }
}
