// Integration tests for RestPayrollStore against the stateful JSON-server mock
// Run with: cargo test -p payroll-storage --test rest_store_test

use chrono::NaiveDate;
use payroll_core::{EmployeeKey, EmployeeRecord, Gender, PayrollStore, StoreError};
use payroll_storage::testing::JsonServerMock;
use payroll_storage::{RestConfig, RestPayrollStore};
use std::time::Duration;

fn today() -> NaiveDate {
    chrono::Local::now().date_naive()
}

fn employee(name: &str, salary: f64) -> EmployeeRecord {
    EmployeeRecord::new(name, Gender::Male, salary, today())
}

async fn server_with_two_employees() -> JsonServerMock {
    JsonServerMock::start_with(vec![
        employee("Bill Gates", 200000.0),
        employee("Jeff Bezos", 100000.0),
    ])
    .await
}

#[test_log::test(tokio::test)]
async fn test_retrieved_entries_match_count() {
    let server = server_with_two_employees().await;
    let store = RestPayrollStore::new(&server.rest_config()).unwrap();

    let records = store.fetch_all().await.unwrap();
    assert_eq!(records.len(), 2);
    assert_eq!(store.count_entries().await.unwrap(), 2);
    assert_eq!(records[0].name, "Bill Gates");
}

#[test_log::test(tokio::test)]
async fn test_new_employee_is_created_and_counted() {
    let server = server_with_two_employees().await;
    let store = RestPayrollStore::new(&server.rest_config()).unwrap();

    let id = store
        .insert(&employee("Mark Zuckerberg", 30000.0))
        .await
        .unwrap();

    assert_eq!(id, 3);
    assert_eq!(store.count_entries().await.unwrap(), 3);
    assert_eq!(server.request_count("POST").await, 1);
}

#[test_log::test(tokio::test)]
async fn test_inserted_record_round_trips() {
    let server = JsonServerMock::start().await;
    let store = RestPayrollStore::new(&server.rest_config()).unwrap();

    let original = EmployeeRecord::new(
        "Sunder",
        Gender::Male,
        2120000.0,
        NaiveDate::from_ymd_opt(2021, 6, 30).unwrap(),
    );
    let id = store.insert(&original).await.unwrap();

    let fetched = store.fetch(&EmployeeKey::Id(id)).await.unwrap();
    assert!(fetched.same_details(&original));
    assert_eq!(fetched.id, id);

    let by_name = store.fetch(&EmployeeKey::name("Sunder")).await.unwrap();
    assert_eq!(by_name, fetched);
}

#[test_log::test(tokio::test)]
async fn test_insert_ignores_client_side_id() {
    let server = server_with_two_employees().await;
    let store = RestPayrollStore::new(&server.rest_config()).unwrap();

    // Id 1 already exists on the server; the client must let the server assign one
    let id = store
        .insert(&employee("Anil", 3100000.0).with_id(1))
        .await
        .unwrap();

    assert_eq!(id, 3);
}

#[test_log::test(tokio::test)]
async fn test_update_salary_by_id_and_name() {
    let server = server_with_two_employees().await;
    let store = RestPayrollStore::new(&server.rest_config()).unwrap();

    store
        .update_salary(&EmployeeKey::Id(1), 250000.0)
        .await
        .unwrap();
    store
        .update_salary(&EmployeeKey::name("Jeff Bezos"), 150000.0)
        .await
        .unwrap();

    let records = server.records();
    assert_eq!(records[0].salary, 250000.0);
    assert_eq!(records[1].salary, 150000.0);
    assert_eq!(server.request_count("PATCH").await, 2);
}

#[test_log::test(tokio::test)]
async fn test_update_missing_employee_is_not_found() {
    let server = server_with_two_employees().await;
    let store = RestPayrollStore::new(&server.rest_config()).unwrap();

    let err = store
        .update_salary(&EmployeeKey::Id(42), 1.0)
        .await
        .unwrap_err();
    assert_eq!(err, StoreError::NotFound(EmployeeKey::Id(42)));

    let err = store
        .update_salary(&EmployeeKey::name("Nobody"), 1.0)
        .await
        .unwrap_err();
    assert_eq!(err, StoreError::NotFound(EmployeeKey::name("Nobody")));
}

#[test_log::test(tokio::test)]
async fn test_ambiguous_name_is_refused() {
    let server = JsonServerMock::start_with(vec![
        employee("Mukesh", 600000.0),
        employee("Mukesh", 2000000.0),
    ])
    .await;
    let store = RestPayrollStore::new(&server.rest_config()).unwrap();

    let err = store
        .update_salary(&EmployeeKey::name("Mukesh"), 1.0)
        .await
        .unwrap_err();

    assert!(matches!(err, StoreError::AmbiguousName { matches: 2, .. }));
    assert_eq!(server.request_count("PATCH").await, 0);
}

#[test_log::test(tokio::test)]
async fn test_server_errors_are_transient() {
    let server = server_with_two_employees().await;
    server.fail_inserts_named("Anil", 503);
    let store = RestPayrollStore::new(&server.rest_config()).unwrap();

    let err = store.insert(&employee("Anil", 1.0)).await.unwrap_err();
    assert!(err.is_retryable(), "expected transient error, got {err}");
    assert_eq!(store.count_entries().await.unwrap(), 2);
}

#[test_log::test(tokio::test)]
async fn test_invalid_record_never_reaches_server() {
    let server = JsonServerMock::start().await;
    let store = RestPayrollStore::new(&server.rest_config()).unwrap();

    let err = store.insert(&employee(" ", 1.0)).await.unwrap_err();
    assert!(matches!(err, StoreError::Validation(_)));
    assert_eq!(server.request_count("POST").await, 0);
}

#[test_log::test(tokio::test)]
async fn test_unreachable_server_is_transient() {
    // Nothing listens on port 9 on the loopback interface
    let config = RestConfig::new("http://127.0.0.1:9").with_timeout(Duration::from_secs(2));
    let store = RestPayrollStore::new(&config).unwrap();

    let err = store.fetch_all().await.unwrap_err();
    assert!(err.is_retryable(), "expected transient error, got {err}");
}
