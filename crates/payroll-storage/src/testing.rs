//! Stateful JSON-server mock for tests
//!
//! Serves the same `/employee_payroll` routes as json-server on top of a
//! wiremock server, keeping the collection in memory so that reads observe
//! earlier writes.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::Mutex;
use serde_json::Value;
use wiremock::matchers::path_regex;
use wiremock::{Mock, MockServer, Request, Respond, ResponseTemplate};

use payroll_core::{EmployeeId, EmployeeRecord, UNSAVED_ID};

use crate::config::{RestConfig, DEFAULT_RESOURCE};

#[derive(Default)]
struct MockState {
    records: Vec<EmployeeRecord>,
    failing_names: HashMap<String, u16>,
}

impl MockState {
    fn next_id(&self) -> EmployeeId {
        self.records.iter().map(|r| r.id).max().unwrap_or(0) + 1
    }
}

/// In-memory json-server
pub struct JsonServerMock {
    server: MockServer,
    state: Arc<Mutex<MockState>>,
}

impl JsonServerMock {
    /// Start an empty server
    pub async fn start() -> Self {
        Self::start_with(Vec::new()).await
    }

    /// Start a server holding `records`; unsaved records get fresh ids
    pub async fn start_with(records: Vec<EmployeeRecord>) -> Self {
        let mut state = MockState::default();
        for mut record in records {
            if record.id == UNSAVED_ID {
                record.id = state.next_id();
            }
            state.records.push(record);
        }
        let state = Arc::new(Mutex::new(state));

        let server = MockServer::start().await;
        Mock::given(path_regex(format!(r"^/{}(/\d+)?$", DEFAULT_RESOURCE)))
            .respond_with(JsonServerResponder {
                state: Arc::clone(&state),
            })
            .mount(&server)
            .await;

        Self { server, state }
    }

    pub fn uri(&self) -> String {
        self.server.uri()
    }

    /// Client configuration pointing at this server
    pub fn rest_config(&self) -> RestConfig {
        RestConfig::new(self.uri())
    }

    /// Current contents of the collection
    pub fn records(&self) -> Vec<EmployeeRecord> {
        self.state.lock().records.clone()
    }

    /// Answer every POST for `name` with `status` instead of creating it
    pub fn fail_inserts_named(&self, name: impl Into<String>, status: u16) {
        self.state.lock().failing_names.insert(name.into(), status);
    }

    /// Number of requests received with the given HTTP method
    pub async fn request_count(&self, http_method: &str) -> usize {
        self.server
            .received_requests()
            .await
            .unwrap_or_default()
            .iter()
            .filter(|r| r.method.as_str().eq_ignore_ascii_case(http_method))
            .count()
    }
}

struct JsonServerResponder {
    state: Arc<Mutex<MockState>>,
}

impl JsonServerResponder {
    fn create(&self, body: &[u8]) -> ResponseTemplate {
        let mut record: EmployeeRecord = match serde_json::from_slice(body) {
            Ok(record) => record,
            Err(e) => return ResponseTemplate::new(400).set_body_string(e.to_string()),
        };

        let mut state = self.state.lock();
        if let Some(status) = state.failing_names.get(&record.name) {
            return ResponseTemplate::new(*status).set_body_string("insert rejected");
        }
        if record.id == UNSAVED_ID {
            record.id = state.next_id();
        } else if state.records.iter().any(|r| r.id == record.id) {
            return ResponseTemplate::new(500).set_body_string("Insert failed, duplicate id");
        }

        state.records.push(record.clone());
        ResponseTemplate::new(201).set_body_json(record)
    }

    fn patch(&self, id: EmployeeId, body: &[u8]) -> ResponseTemplate {
        let changes: Value = match serde_json::from_slice(body) {
            Ok(Value::Object(map)) => Value::Object(map),
            _ => return ResponseTemplate::new(400).set_body_string("expected a JSON object"),
        };

        let mut state = self.state.lock();
        let Some(record) = state.records.iter_mut().find(|r| r.id == id) else {
            return ResponseTemplate::new(404).set_body_json(serde_json::json!({}));
        };

        if let Some(salary) = changes.get("salary").and_then(Value::as_f64) {
            record.salary = salary;
        }
        if let Some(name) = changes.get("name").and_then(Value::as_str) {
            record.name = name.to_string();
        }
        ResponseTemplate::new(200).set_body_json(record.clone())
    }
}

impl Respond for JsonServerResponder {
    fn respond(&self, request: &Request) -> ResponseTemplate {
        let id = request
            .url
            .path_segments()
            .and_then(|mut segments| segments.nth(1))
            .and_then(|segment| segment.parse::<EmployeeId>().ok());

        match (request.method.as_str(), id) {
            ("GET", None) => {
                ResponseTemplate::new(200).set_body_json(self.state.lock().records.clone())
            }
            ("GET", Some(id)) => match self.state.lock().records.iter().find(|r| r.id == id) {
                Some(record) => ResponseTemplate::new(200).set_body_json(record.clone()),
                None => ResponseTemplate::new(404).set_body_json(serde_json::json!({})),
            },
            ("POST", None) => self.create(&request.body),
            ("PATCH", Some(id)) => self.patch(id, &request.body),
            _ => ResponseTemplate::new(405),
        }
    }
}
