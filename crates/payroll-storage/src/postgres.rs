//! PostgreSQL implementation of PayrollStore
//!
//! - Identifiers come from a BIGSERIAL column
//! - Name-keyed updates lock the matching rows inside a transaction, so the
//!   uniqueness check and the write cannot interleave with another writer

use async_trait::async_trait;
use chrono::NaiveDate;
use sqlx::postgres::PgPoolOptions;
use sqlx::{FromRow, PgPool};
use tracing::{debug, error, instrument};

use payroll_core::employee::validate_salary;
use payroll_core::traits::select_unique;
use payroll_core::{EmployeeId, EmployeeKey, EmployeeRecord, PayrollStore, Result, StoreError};

use crate::config::DatabaseConfig;

/// Row as stored in `employee_payroll`
#[derive(Debug, Clone, FromRow)]
struct EmployeeRow {
    id: i64,
    name: String,
    gender: String,
    salary: f64,
    start_date: NaiveDate,
}

impl TryFrom<EmployeeRow> for EmployeeRecord {
    type Error = StoreError;

    fn try_from(row: EmployeeRow) -> Result<Self> {
        Ok(EmployeeRecord {
            id: row.id,
            name: row.name,
            gender: row.gender.parse()?,
            salary: row.salary,
            start_date: row.start_date,
        })
    }
}

fn rows_to_records(rows: Vec<EmployeeRow>) -> Result<Vec<EmployeeRecord>> {
    rows.into_iter().map(EmployeeRecord::try_from).collect()
}

/// PostgreSQL implementation of PayrollStore
///
/// # Example
///
/// ```ignore
/// use payroll_storage::{DatabaseConfig, PostgresPayrollStore};
///
/// let store = PostgresPayrollStore::connect(&DatabaseConfig::new("postgres://localhost/payroll")).await?;
/// store.migrate().await?;
/// ```
#[derive(Clone)]
pub struct PostgresPayrollStore {
    pool: PgPool,
}

impl PostgresPayrollStore {
    /// Create a store on an existing connection pool
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Open a connection pool from configuration
    pub async fn connect(config: &DatabaseConfig) -> Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .acquire_timeout(config.acquire_timeout)
            .connect(&config.url)
            .await
            .map_err(map_sqlx_error)?;
        Ok(Self { pool })
    }

    /// Get a reference to the connection pool
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Apply the embedded schema migrations
    pub async fn migrate(&self) -> Result<()> {
        sqlx::migrate!("./migrations")
            .run(&self.pool)
            .await
            .map_err(|e| StoreError::backend(format!("migration failed: {}", e)))
    }

    async fn fetch_by_name(&self, name: &str) -> Result<Vec<EmployeeRecord>> {
        let rows = sqlx::query_as::<_, EmployeeRow>(
            r#"
            SELECT id, name, gender, salary, start_date
            FROM employee_payroll
            WHERE name = $1
            ORDER BY id
            "#,
        )
        .bind(name)
        .fetch_all(&self.pool)
        .await
        .map_err(map_sqlx_error)?;

        rows_to_records(rows)
    }
}

#[async_trait]
impl PayrollStore for PostgresPayrollStore {
    #[instrument(skip(self, record), fields(name = %record.name))]
    async fn insert(&self, record: &EmployeeRecord) -> Result<EmployeeId> {
        record.validate()?;

        let id: i64 = sqlx::query_scalar(
            r#"
            INSERT INTO employee_payroll (name, gender, salary, start_date)
            VALUES ($1, $2, $3, $4)
            RETURNING id
            "#,
        )
        .bind(&record.name)
        .bind(record.gender.code())
        .bind(record.salary)
        .bind(record.start_date)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            error!("Failed to insert employee: {}", e);
            map_sqlx_error(e)
        })?;

        debug!(id, "inserted employee");
        Ok(id)
    }

    #[instrument(skip(self), fields(key = %key))]
    async fn update_salary(&self, key: &EmployeeKey, salary: f64) -> Result<()> {
        validate_salary(salary)?;

        match key {
            EmployeeKey::Id(id) => {
                let result = sqlx::query("UPDATE employee_payroll SET salary = $2 WHERE id = $1")
                    .bind(id)
                    .bind(salary)
                    .execute(&self.pool)
                    .await
                    .map_err(map_sqlx_error)?;

                if result.rows_affected() == 0 {
                    return Err(StoreError::NotFound(key.clone()));
                }
            }
            EmployeeKey::Name(name) => {
                let mut tx = self.pool.begin().await.map_err(map_sqlx_error)?;

                let ids: Vec<i64> = sqlx::query_scalar(
                    "SELECT id FROM employee_payroll WHERE name = $1 ORDER BY id FOR UPDATE",
                )
                .bind(name)
                .fetch_all(&mut *tx)
                .await
                .map_err(map_sqlx_error)?;

                let id = match ids.as_slice() {
                    [] => return Err(StoreError::NotFound(key.clone())),
                    [id] => *id,
                    _ => {
                        return Err(StoreError::AmbiguousName {
                            name: name.clone(),
                            matches: ids.len(),
                        })
                    }
                };

                sqlx::query("UPDATE employee_payroll SET salary = $2 WHERE id = $1")
                    .bind(id)
                    .bind(salary)
                    .execute(&mut *tx)
                    .await
                    .map_err(map_sqlx_error)?;

                tx.commit().await.map_err(map_sqlx_error)?;
            }
        }

        debug!(salary, "updated salary");
        Ok(())
    }

    #[instrument(skip(self))]
    async fn fetch_all(&self) -> Result<Vec<EmployeeRecord>> {
        let rows = sqlx::query_as::<_, EmployeeRow>(
            r#"
            SELECT id, name, gender, salary, start_date
            FROM employee_payroll
            ORDER BY id
            "#,
        )
        .fetch_all(&self.pool)
        .await
        .map_err(map_sqlx_error)?;

        rows_to_records(rows)
    }

    async fn count_entries(&self) -> Result<u64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM employee_payroll")
            .fetch_one(&self.pool)
            .await
            .map_err(map_sqlx_error)?;

        Ok(count.max(0) as u64)
    }

    #[instrument(skip(self), fields(key = %key))]
    async fn fetch(&self, key: &EmployeeKey) -> Result<EmployeeRecord> {
        match key {
            EmployeeKey::Id(id) => {
                let row = sqlx::query_as::<_, EmployeeRow>(
                    r#"
                    SELECT id, name, gender, salary, start_date
                    FROM employee_payroll
                    WHERE id = $1
                    "#,
                )
                .bind(id)
                .fetch_optional(&self.pool)
                .await
                .map_err(map_sqlx_error)?
                .ok_or_else(|| StoreError::NotFound(key.clone()))?;

                EmployeeRecord::try_from(row)
            }
            EmployeeKey::Name(name) => {
                let records = self.fetch_by_name(name).await?;
                select_unique(key, records.iter())
            }
        }
    }
}

/// Classify a sqlx error into the store taxonomy
fn map_sqlx_error(err: sqlx::Error) -> StoreError {
    match &err {
        sqlx::Error::PoolTimedOut
        | sqlx::Error::PoolClosed
        | sqlx::Error::Io(_)
        | sqlx::Error::Tls(_)
        | sqlx::Error::WorkerCrashed => StoreError::Transient(err.to_string()),
        sqlx::Error::Database(db) => {
            let class = db.code().map(|c| c.chars().take(2).collect::<String>());
            match class.as_deref() {
                // integrity constraint violation, data exception
                Some("23") | Some("22") => StoreError::Validation(db.message().to_string()),
                // connection exception, serialization failure, resources, shutdown
                Some("08") | Some("40") | Some("53") | Some("57") => {
                    StoreError::Transient(db.message().to_string())
                }
                _ => StoreError::Backend(db.message().to_string()),
            }
        }
        sqlx::Error::ColumnDecode { .. } | sqlx::Error::Decode(_) => {
            StoreError::Serialization(err.to_string())
        }
        _ => StoreError::Backend(err.to_string()),
    }
}
