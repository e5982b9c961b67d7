// Error types for payroll stores

use thiserror::Error;

use crate::employee::EmployeeKey;

/// Result type alias for store operations
pub type Result<T> = std::result::Result<T, StoreError>;

/// Errors returned by every PayrollStore backend
#[derive(Debug, Clone, Error, PartialEq)]
pub enum StoreError {
    /// Connection loss, timeout or an overloaded backend; the caller may retry
    #[error("transient store error: {0}")]
    Transient(String),

    /// The record or update was rejected as malformed
    #[error("validation error: {0}")]
    Validation(String),

    /// No record matches the key
    #[error("employee not found: {0}")]
    NotFound(EmployeeKey),

    /// A name key matched several records
    #[error("name '{name}' matches {matches} employees")]
    AmbiguousName { name: String, matches: usize },

    /// A backend response could not be decoded
    #[error("serialization error: {0}")]
    Serialization(String),

    /// Any other backend failure
    #[error("backend error: {0}")]
    Backend(String),
}

impl StoreError {
    pub fn transient(msg: impl Into<String>) -> Self {
        StoreError::Transient(msg.into())
    }

    pub fn backend(msg: impl Into<String>) -> Self {
        StoreError::Backend(msg.into())
    }

    /// Whether retrying the same call may succeed
    pub fn is_retryable(&self) -> bool {
        matches!(self, StoreError::Transient(_))
    }

    /// Short label for logs and result summaries
    pub fn kind(&self) -> &'static str {
        match self {
            StoreError::Transient(_) => "transient",
            StoreError::Validation(_) => "validation",
            StoreError::NotFound(_) => "not_found",
            StoreError::AmbiguousName { .. } => "ambiguous_name",
            StoreError::Serialization(_) => "serialization",
            StoreError::Backend(_) => "backend",
        }
    }
}

impl From<serde_json::Error> for StoreError {
    fn from(err: serde_json::Error) -> Self {
        StoreError::Serialization(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_transient_is_retryable() {
        assert!(StoreError::transient("timeout").is_retryable());
        assert!(!StoreError::Validation("bad".into()).is_retryable());
        assert!(!StoreError::NotFound(EmployeeKey::Id(1)).is_retryable());
    }

    #[test]
    fn test_display() {
        let err = StoreError::NotFound(EmployeeKey::name("Anil"));
        assert_eq!(err.to_string(), "employee not found: name 'Anil'");

        let err = StoreError::AmbiguousName {
            name: "Mukesh".into(),
            matches: 2,
        };
        assert_eq!(err.to_string(), "name 'Mukesh' matches 2 employees");
        assert_eq!(err.kind(), "ambiguous_name");
    }
}
