// Payroll storage backends
//
// This crate provides the external implementations of PayrollStore:
// - PostgresPayrollStore: relational store with sqlx
// - RestPayrollStore: JSON-server mirror over HTTP
//
// Both backends are configured through explicit config values handed to
// their constructors.

pub mod config;
pub mod postgres;
pub mod rest;

#[cfg(feature = "testing")]
pub mod testing;

pub use config::{DatabaseConfig, RestConfig, DEFAULT_REST_BASE_URL, DEFAULT_RESOURCE};
pub use postgres::PostgresPayrollStore;
pub use rest::RestPayrollStore;
