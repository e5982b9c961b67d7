// REST mirror of the payroll store
//
// Talks to a json-server style collection:
//   GET   {base}/{resource}        -> JSON array of records
//   POST  {base}/{resource}        -> 201 + created record with its id
//   GET   {base}/{resource}/{id}   -> one record
//   PATCH {base}/{resource}/{id}   -> partial update, e.g. {"salary": ...}

use async_trait::async_trait;
use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use serde_json::json;
use tracing::{debug, instrument, warn};

use payroll_core::employee::validate_salary;
use payroll_core::traits::select_unique;
use payroll_core::{EmployeeId, EmployeeKey, EmployeeRecord, PayrollStore, Result, StoreError};

use crate::config::RestConfig;

/// PayrollStore backed by a JSON REST server
#[derive(Debug, Clone)]
pub struct RestPayrollStore {
    collection_url: String,
    http: reqwest::Client,
}

impl RestPayrollStore {
    /// Build a client for the configured server
    pub fn new(config: &RestConfig) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| StoreError::backend(format!("failed to build HTTP client: {}", e)))?;

        Ok(Self {
            collection_url: config.collection_url(),
            http,
        })
    }

    /// URL of the record collection
    pub fn collection_url(&self) -> &str {
        &self.collection_url
    }

    fn item_url(&self, id: EmployeeId) -> String {
        format!("{}/{}", self.collection_url, id)
    }

    /// Resolve a key to an identifier, looking names up in the collection
    async fn resolve_id(&self, key: &EmployeeKey) -> Result<EmployeeId> {
        match key {
            EmployeeKey::Id(id) => Ok(*id),
            EmployeeKey::Name(_) => Ok(self.fetch(key).await?.id),
        }
    }

    async fn handle_response<T: DeserializeOwned>(
        response: reqwest::Response,
        key: Option<&EmployeeKey>,
    ) -> Result<T> {
        let status = response.status();

        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(status_error(status, message, key));
        }

        response.json().await.map_err(map_reqwest_error)
    }
}

#[async_trait]
impl PayrollStore for RestPayrollStore {
    #[instrument(skip(self, record), fields(name = %record.name))]
    async fn insert(&self, record: &EmployeeRecord) -> Result<EmployeeId> {
        record.validate()?;

        // The server assigns the identifier
        let mut body = record.clone();
        body.id = payroll_core::UNSAVED_ID;

        let response = self
            .http
            .post(&self.collection_url)
            .json(&body)
            .send()
            .await
            .map_err(map_reqwest_error)?;

        let status = response.status();
        if status != StatusCode::CREATED {
            let message = response.text().await.unwrap_or_default();
            if status.is_success() {
                warn!(%status, "server did not answer 201 Created");
                return Err(StoreError::backend(format!(
                    "expected 201 Created, got {}",
                    status
                )));
            }
            return Err(status_error(status, message, None));
        }

        let created: EmployeeRecord = response.json().await.map_err(map_reqwest_error)?;
        if !created.is_persisted() {
            return Err(StoreError::Serialization(
                "created record carries no identifier".to_string(),
            ));
        }

        debug!(id = created.id, "created employee on REST server");
        Ok(created.id)
    }

    #[instrument(skip(self), fields(key = %key))]
    async fn update_salary(&self, key: &EmployeeKey, salary: f64) -> Result<()> {
        validate_salary(salary)?;

        let id = self.resolve_id(key).await?;
        let response = self
            .http
            .patch(self.item_url(id))
            .json(&json!({ "salary": salary }))
            .send()
            .await
            .map_err(map_reqwest_error)?;

        let updated: EmployeeRecord = Self::handle_response(response, Some(key)).await?;
        debug!(id = updated.id, salary = updated.salary, "updated salary on REST server");
        Ok(())
    }

    #[instrument(skip(self))]
    async fn fetch_all(&self) -> Result<Vec<EmployeeRecord>> {
        let response = self
            .http
            .get(&self.collection_url)
            .send()
            .await
            .map_err(map_reqwest_error)?;

        let mut records: Vec<EmployeeRecord> = Self::handle_response(response, None).await?;
        records.sort_by_key(|r| r.id);
        Ok(records)
    }

    async fn count_entries(&self) -> Result<u64> {
        Ok(self.fetch_all().await?.len() as u64)
    }

    async fn fetch(&self, key: &EmployeeKey) -> Result<EmployeeRecord> {
        match key {
            EmployeeKey::Id(id) => {
                let response = self
                    .http
                    .get(self.item_url(*id))
                    .send()
                    .await
                    .map_err(map_reqwest_error)?;
                Self::handle_response(response, Some(key)).await
            }
            EmployeeKey::Name(_) => {
                let records = self.fetch_all().await?;
                select_unique(key, records.iter().filter(|r| r.matches(key)))
            }
        }
    }
}

/// Classify a non-success status into the store taxonomy
fn status_error(status: StatusCode, message: String, key: Option<&EmployeeKey>) -> StoreError {
    match status {
        StatusCode::NOT_FOUND => match key {
            Some(key) => StoreError::NotFound(key.clone()),
            None => StoreError::backend(format!("resource not found: {}", message)),
        },
        StatusCode::REQUEST_TIMEOUT | StatusCode::TOO_MANY_REQUESTS => {
            StoreError::Transient(format!("{}: {}", status, message))
        }
        s if s.is_server_error() => StoreError::Transient(format!("{}: {}", status, message)),
        s if s.is_client_error() => StoreError::Validation(format!("{}: {}", status, message)),
        _ => StoreError::backend(format!("unexpected status {}: {}", status, message)),
    }
}

fn map_reqwest_error(err: reqwest::Error) -> StoreError {
    if err.is_timeout() || err.is_connect() {
        StoreError::Transient(err.to_string())
    } else if err.is_decode() {
        StoreError::Serialization(err.to_string())
    } else {
        StoreError::Backend(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_classification() {
        let key = EmployeeKey::Id(4);
        assert_eq!(
            status_error(StatusCode::NOT_FOUND, String::new(), Some(&key)),
            StoreError::NotFound(key)
        );
        assert!(status_error(StatusCode::SERVICE_UNAVAILABLE, "down".into(), None).is_retryable());
        assert!(status_error(StatusCode::TOO_MANY_REQUESTS, String::new(), None).is_retryable());
        assert!(matches!(
            status_error(StatusCode::UNPROCESSABLE_ENTITY, "bad".into(), None),
            StoreError::Validation(_)
        ));
    }

    #[test]
    fn test_item_url() {
        let store = RestPayrollStore::new(&RestConfig::new("http://localhost:3000/")).unwrap();
        assert_eq!(store.collection_url(), "http://localhost:3000/employee_payroll");
        assert_eq!(store.item_url(12), "http://localhost:3000/employee_payroll/12");
    }
}
