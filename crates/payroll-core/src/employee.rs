// Employee domain types
//
// EmployeeRecord is the unit every store reads and writes. The identifier is
// assigned by the store; UNSAVED_ID marks a record that was never persisted.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

use crate::error::StoreError;

/// Store-assigned employee identifier
pub type EmployeeId = i64;

/// Identifier of a record that has not been persisted yet
pub const UNSAVED_ID: EmployeeId = 0;

/// Gender marker stored with each employee
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Gender {
    #[serde(rename = "M")]
    Male,
    #[serde(rename = "F")]
    Female,
    #[serde(rename = "O")]
    Other,
}

impl Gender {
    /// Single-letter code used by the database column and the JSON wire format
    pub fn code(&self) -> &'static str {
        match self {
            Gender::Male => "M",
            Gender::Female => "F",
            Gender::Other => "O",
        }
    }
}

impl std::fmt::Display for Gender {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for Gender {
    type Err = StoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "M" | "m" => Ok(Gender::Male),
            "F" | "f" => Ok(Gender::Female),
            "O" | "o" => Ok(Gender::Other),
            other => Err(StoreError::Validation(format!(
                "unknown gender marker '{}'",
                other
            ))),
        }
    }
}

/// A single payroll entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EmployeeRecord {
    /// Store-assigned identifier, `UNSAVED_ID` until persisted
    #[serde(default, skip_serializing_if = "is_unsaved")]
    pub id: EmployeeId,
    pub name: String,
    pub gender: Gender,
    pub salary: f64,
    pub start_date: NaiveDate,
}

fn is_unsaved(id: &EmployeeId) -> bool {
    *id == UNSAVED_ID
}

impl EmployeeRecord {
    /// Create a record that has not been persisted yet
    pub fn new(
        name: impl Into<String>,
        gender: Gender,
        salary: f64,
        start_date: NaiveDate,
    ) -> Self {
        Self {
            id: UNSAVED_ID,
            name: name.into(),
            gender,
            salary,
            start_date,
        }
    }

    /// Set the identifier
    pub fn with_id(mut self, id: EmployeeId) -> Self {
        self.id = id;
        self
    }

    pub fn is_persisted(&self) -> bool {
        self.id != UNSAVED_ID
    }

    /// Check that the record can be written to a store
    pub fn validate(&self) -> Result<(), StoreError> {
        if self.name.trim().is_empty() {
            return Err(StoreError::Validation(
                "employee name must not be empty".to_string(),
            ));
        }
        validate_salary(self.salary)
    }

    /// Whether this record is addressed by `key`
    pub fn matches(&self, key: &EmployeeKey) -> bool {
        match key {
            EmployeeKey::Id(id) => self.id == *id,
            EmployeeKey::Name(name) => self.name == *name,
        }
    }

    /// Compare every field except the identifier
    pub fn same_details(&self, other: &EmployeeRecord) -> bool {
        self.name == other.name
            && self.gender == other.gender
            && self.salary == other.salary
            && self.start_date == other.start_date
    }

    /// The most precise key for this record
    pub fn key(&self) -> EmployeeKey {
        if self.is_persisted() {
            EmployeeKey::Id(self.id)
        } else {
            EmployeeKey::Name(self.name.clone())
        }
    }
}

/// Salaries must be finite and non-negative
pub fn validate_salary(salary: f64) -> Result<(), StoreError> {
    if !salary.is_finite() || salary < 0.0 {
        return Err(StoreError::Validation(format!(
            "salary must be a non-negative amount, got {}",
            salary
        )));
    }
    Ok(())
}

/// Lookup key for updates and in-sync checks
///
/// `Id` is canonical. `Name` is a convenience path: names are not unique, so
/// every store fails with [`StoreError::AmbiguousName`] when a name matches
/// more than one row instead of picking one.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum EmployeeKey {
    Id(EmployeeId),
    Name(String),
}

impl EmployeeKey {
    pub fn name(name: impl Into<String>) -> Self {
        EmployeeKey::Name(name.into())
    }
}

impl std::fmt::Display for EmployeeKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EmployeeKey::Id(id) => write!(f, "id {}", id),
            EmployeeKey::Name(name) => write!(f, "name '{}'", name),
        }
    }
}

impl From<EmployeeId> for EmployeeKey {
    fn from(id: EmployeeId) -> Self {
        EmployeeKey::Id(id)
    }
}

impl From<&str> for EmployeeKey {
    fn from(name: &str) -> Self {
        EmployeeKey::Name(name.to_string())
    }
}

impl From<String> for EmployeeKey {
    fn from(name: String) -> Self {
        EmployeeKey::Name(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, 5).unwrap()
    }

    #[test]
    fn test_unsaved_record_omits_id() {
        let record = EmployeeRecord::new("Mark Zuckerberg", Gender::Male, 30000.0, date());
        let value = serde_json::to_value(&record).unwrap();

        assert_eq!(
            value,
            json!({
                "name": "Mark Zuckerberg",
                "gender": "M",
                "salary": 30000.0,
                "startDate": "2024-01-05"
            })
        );
    }

    #[test]
    fn test_server_record_parses() {
        let record: EmployeeRecord = serde_json::from_value(json!({
            "id": 3,
            "name": "Anil",
            "gender": "M",
            "salary": 3100000.0,
            "startDate": "2024-01-05"
        }))
        .unwrap();

        assert_eq!(record.id, 3);
        assert!(record.is_persisted());
        assert_eq!(record.key(), EmployeeKey::Id(3));
    }

    #[test]
    fn test_validation() {
        let ok = EmployeeRecord::new("Anil", Gender::Male, 700000.0, date());
        assert!(ok.validate().is_ok());

        let blank = EmployeeRecord::new("  ", Gender::Male, 1.0, date());
        assert!(matches!(blank.validate(), Err(StoreError::Validation(_))));

        let negative = EmployeeRecord::new("Anil", Gender::Male, -1.0, date());
        assert!(matches!(negative.validate(), Err(StoreError::Validation(_))));

        let nan = EmployeeRecord::new("Anil", Gender::Male, f64::NAN, date());
        assert!(nan.validate().is_err());
    }

    #[test]
    fn test_gender_parse() {
        assert_eq!("M".parse::<Gender>().unwrap(), Gender::Male);
        assert_eq!("f".parse::<Gender>().unwrap(), Gender::Female);
        assert!("X".parse::<Gender>().is_err());
    }

    #[test]
    fn test_same_details_ignores_id() {
        let a = EmployeeRecord::new("Anil", Gender::Male, 1.0, date());
        let b = a.clone().with_id(9);
        assert!(a.same_details(&b));
        assert_ne!(a, b);
    }
}
