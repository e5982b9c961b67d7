// Service configuration
//
// PayrollConfig is an explicit value handed to the service at construction.
// Nothing here is global: loading from the environment only happens when
// `from_env` is called.
//
// Environment variables:
// - DATABASE_URL                 relational store (optional)
// - DATABASE_MAX_CONNECTIONS     pool size
// - PAYROLL_REST_BASE_URL        json-server address (default http://localhost:3000)
// - PAYROLL_REST_RESOURCE        collection name (default employee_payroll)
// - PAYROLL_REST_TIMEOUT_MS      per-request timeout
// - PAYROLL_BATCH_MAX_IN_FLIGHT  concurrent writes per batch
// - PAYROLL_BATCH_OP_TIMEOUT_MS  per-write time limit

use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use payroll_batch::BatchConfig;
use payroll_core::PayrollStore;
use payroll_storage::{DatabaseConfig, PostgresPayrollStore, RestConfig, RestPayrollStore};
use thiserror::Error;
use tracing::info;

/// Configuration errors
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    /// A required variable is not set
    #[error("{0} environment variable required")]
    Missing(&'static str),

    /// A variable holds a value that cannot be used
    #[error("invalid value '{value}' for {var}: {reason}")]
    Invalid {
        var: &'static str,
        value: String,
        reason: String,
    },
}

/// Which backing store the service talks to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreBackend {
    /// Relational store (PostgreSQL)
    Database,
    /// JSON-server mirror
    Rest,
}

/// Complete service configuration
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct PayrollConfig {
    pub rest: RestConfig,
    pub database: Option<DatabaseConfig>,
    pub batch: BatchConfig,
}

impl PayrollConfig {
    /// Load configuration from the process environment, reading `.env` first
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    /// Load configuration through an arbitrary variable lookup
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut rest = RestConfig::default();
        if let Some(base_url) = lookup("PAYROLL_REST_BASE_URL") {
            rest.base_url = base_url;
        }
        if let Some(resource) = lookup("PAYROLL_REST_RESOURCE") {
            rest.resource = resource;
        }
        if let Some(ms) = parse_var::<u64, _>(&lookup, "PAYROLL_REST_TIMEOUT_MS")? {
            rest.timeout = Duration::from_millis(ms);
        }

        let database = match lookup("DATABASE_URL") {
            Some(url) => {
                let mut database = DatabaseConfig::new(url);
                if let Some(max) = parse_var::<u32, _>(&lookup, "DATABASE_MAX_CONNECTIONS")? {
                    database = database.with_max_connections(max);
                }
                Some(database)
            }
            None => None,
        };

        let mut batch = BatchConfig::default();
        if let Some(max) = parse_var::<usize, _>(&lookup, "PAYROLL_BATCH_MAX_IN_FLIGHT")? {
            if max == 0 {
                return Err(ConfigError::Invalid {
                    var: "PAYROLL_BATCH_MAX_IN_FLIGHT",
                    value: max.to_string(),
                    reason: "must be at least 1".to_string(),
                });
            }
            batch = batch.with_max_in_flight(max);
        }
        if let Some(ms) = parse_var::<u64, _>(&lookup, "PAYROLL_BATCH_OP_TIMEOUT_MS")? {
            batch = batch.with_op_timeout(Duration::from_millis(ms));
        }

        Ok(Self {
            rest,
            database,
            batch,
        })
    }

    /// Set the REST mirror configuration
    pub fn with_rest(mut self, rest: RestConfig) -> Self {
        self.rest = rest;
        self
    }

    /// Set the relational store configuration
    pub fn with_database(mut self, database: DatabaseConfig) -> Self {
        self.database = Some(database);
        self
    }

    /// Set the batch configuration
    pub fn with_batch(mut self, batch: BatchConfig) -> Self {
        self.batch = batch;
        self
    }

    /// Open the store for `backend`
    ///
    /// The database backend connects and applies migrations.
    pub async fn open_store(
        &self,
        backend: StoreBackend,
    ) -> crate::error::Result<Arc<dyn PayrollStore>> {
        match backend {
            StoreBackend::Database => {
                let database = self
                    .database
                    .as_ref()
                    .ok_or(ConfigError::Missing("DATABASE_URL"))?;
                let store = PostgresPayrollStore::connect(database).await?;
                store.migrate().await?;
                info!("Connected to payroll database");
                Ok(Arc::new(store))
            }
            StoreBackend::Rest => {
                let store = RestPayrollStore::new(&self.rest)?;
                info!(url = %store.collection_url(), "Using REST payroll mirror");
                Ok(Arc::new(store))
            }
        }
    }
}

fn parse_var<T, F>(lookup: &F, var: &'static str) -> Result<Option<T>, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
    F: Fn(&str) -> Option<String>,
{
    match lookup(var) {
        Some(value) => value
            .trim()
            .parse()
            .map(Some)
            .map_err(|e: T::Err| ConfigError::Invalid {
                var,
                value,
                reason: e.to_string(),
            }),
        None => Ok(None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| vars.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = PayrollConfig::from_lookup(lookup(&[])).unwrap();

        assert_eq!(config.rest, RestConfig::default());
        assert_eq!(config.database, None);
        assert_eq!(config.batch, BatchConfig::default());
    }

    #[test]
    fn test_all_variables() {
        let config = PayrollConfig::from_lookup(lookup(&[
            ("PAYROLL_REST_BASE_URL", "http://localhost:4000"),
            ("PAYROLL_REST_RESOURCE", "staff"),
            ("PAYROLL_REST_TIMEOUT_MS", "1500"),
            ("DATABASE_URL", "postgres://localhost/payroll"),
            ("DATABASE_MAX_CONNECTIONS", "4"),
            ("PAYROLL_BATCH_MAX_IN_FLIGHT", "8"),
            ("PAYROLL_BATCH_OP_TIMEOUT_MS", "250"),
        ]))
        .unwrap();

        assert_eq!(config.rest.collection_url(), "http://localhost:4000/staff");
        assert_eq!(config.rest.timeout, Duration::from_millis(1500));

        let database = config.database.unwrap();
        assert_eq!(database.url, "postgres://localhost/payroll");
        assert_eq!(database.max_connections, 4);

        assert_eq!(config.batch.max_in_flight, 8);
        assert_eq!(config.batch.op_timeout, Some(Duration::from_millis(250)));
    }

    #[test]
    fn test_invalid_number() {
        let err = PayrollConfig::from_lookup(lookup(&[("PAYROLL_BATCH_MAX_IN_FLIGHT", "many")]))
            .unwrap_err();
        assert!(matches!(
            err,
            ConfigError::Invalid {
                var: "PAYROLL_BATCH_MAX_IN_FLIGHT",
                ..
            }
        ));

        let err = PayrollConfig::from_lookup(lookup(&[("PAYROLL_BATCH_MAX_IN_FLIGHT", "0")]))
            .unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { .. }));
    }

    #[test]
    fn test_oversized_in_flight_is_clamped() {
        let config = PayrollConfig::from_lookup(lookup(&[(
            "PAYROLL_BATCH_MAX_IN_FLIGHT",
            "18446744073709551615",
        )]))
        .unwrap();

        assert_eq!(
            config.batch.max_in_flight,
            tokio::sync::Semaphore::MAX_PERMITS
        );
        assert_eq!(config.batch.permits(), config.batch.max_in_flight);
    }

    #[tokio::test]
    async fn test_database_backend_requires_url() {
        let config = PayrollConfig::default();
        let err = config.open_store(StoreBackend::Database).await.err().unwrap();
        assert!(matches!(
            err,
            crate::ServiceError::Config(ConfigError::Missing("DATABASE_URL"))
        ));
    }
}
