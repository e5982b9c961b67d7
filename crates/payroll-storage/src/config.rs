//! Connection settings for the storage backends

use std::time::Duration;

/// Default json-server address
pub const DEFAULT_REST_BASE_URL: &str = "http://localhost:3000";

/// Default collection name on the json-server
pub const DEFAULT_RESOURCE: &str = "employee_payroll";

/// REST mirror configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RestConfig {
    /// Server base URL, e.g. `http://localhost:3000`
    pub base_url: String,

    /// Collection path segment, e.g. `employee_payroll`
    pub resource: String,

    /// Per-request timeout
    pub timeout: Duration,
}

impl Default for RestConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_REST_BASE_URL.to_string(),
            resource: DEFAULT_RESOURCE.to_string(),
            timeout: Duration::from_secs(10),
        }
    }
}

impl RestConfig {
    /// Create a configuration for the given server
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            ..Default::default()
        }
    }

    /// Set the collection name
    pub fn with_resource(mut self, resource: impl Into<String>) -> Self {
        self.resource = resource.into();
        self
    }

    /// Set the request timeout
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// URL of the record collection
    pub fn collection_url(&self) -> String {
        format!(
            "{}/{}",
            self.base_url.trim_end_matches('/'),
            self.resource.trim_matches('/')
        )
    }
}

/// Relational store configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DatabaseConfig {
    /// Connection URL, e.g. `postgres://localhost/payroll`
    pub url: String,

    /// Pool size
    pub max_connections: u32,

    /// How long to wait for a pooled connection
    pub acquire_timeout: Duration,
}

impl DatabaseConfig {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            max_connections: 10,
            acquire_timeout: Duration::from_secs(30),
        }
    }

    /// Set the pool size (at least one connection)
    pub fn with_max_connections(mut self, max: u32) -> Self {
        self.max_connections = max.max(1);
        self
    }

    pub fn with_acquire_timeout(mut self, timeout: Duration) -> Self {
        self.acquire_timeout = timeout;
        self
    }
}
