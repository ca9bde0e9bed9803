//! api::mock
//!
//! In-memory GraphQL server for testing.
//!
//! # Design
//!
//! `MockTransport` answers the console's operations from in-memory state so
//! views can be exercised end to end without network access:
//!
//! - departments paginate like the real server and cascade on delete
//! - data operations require a token the mock issued (otherwise they fail
//!   with an `UNAUTHENTICATED` error and `data: null`)
//! - every request is recorded with the credential it carried
//! - failures can be injected per operation, requests can be held until
//!   released, and operations can be slowed down
//!
//! # Example
//!
//! ```
//! use orgdesk::api::mock::MockTransport;
//!
//! let server = MockTransport::new().with_user("ada", "secret");
//! server.seed_department("Engineering", &["Platform"]);
//! assert_eq!(server.departments().len(), 1);
//! ```

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use async_trait::async_trait;
use serde::Serialize;
use serde_json::Value;
use tokio::sync::Notify;

use super::errors::{ApiError, GraphQlError, UNAUTHENTICATED};
use super::operations::{
    names, CreateDepartmentData, CreateSubDepartmentData, DepartmentOptions,
    DepartmentOptionsData, DepartmentsData, LoginData, LoginPayload, LoginUser,
    RemoveDepartmentData, RemoveSubDepartmentData, SubDepartmentsData, UpdateDepartmentData,
    UpdateSubDepartmentData, SELECT_LIMIT,
};
use super::transport::{GraphQlRequest, GraphQlResponse, Transport};
use crate::auth::Credential;
use crate::core::types::{
    Department, DepartmentRef, EntityId, Listing, PageRequest, SubDepartment,
    SubDepartmentSummary,
};

/// Mock GraphQL server.
///
/// Thread-safe via internal `Arc<Mutex<...>>` wrapping; clones share state.
#[derive(Debug, Clone)]
pub struct MockTransport {
    inner: Arc<Mutex<MockInner>>,
}

#[derive(Debug)]
struct MockInner {
    departments: Vec<(EntityId, String)>,
    sub_departments: Vec<StoredSub>,
    next_id: i64,
    users: HashMap<String, String>,
    tokens: HashMap<String, String>,
    next_token: u64,
    require_auth: bool,
    fail_on: Option<MockFailure>,
    holds: Vec<Hold>,
    latency: HashMap<String, Duration>,
    requests: Vec<MockRequest>,
}

#[derive(Debug, Clone)]
struct StoredSub {
    id: EntityId,
    name: String,
    department_id: EntityId,
}

#[derive(Debug)]
struct Hold {
    operation: String,
    variables: Option<Value>,
    gate: Arc<Notify>,
    /// Answer from the state at arrival instead of at release.
    snapshot: bool,
}

/// Configuration for which operation should fail, and how.
#[derive(Debug, Clone)]
pub struct MockFailure {
    /// Operation name to fail.
    pub operation: String,
    /// Failure to produce.
    pub with: FailWith,
}

/// Kinds of injected failure.
#[derive(Debug, Clone)]
pub enum FailWith {
    /// A GraphQL error with `data: null`.
    GraphQl(GraphQlError),
    /// An HTTP-level failure.
    Http { status: u16, message: String },
    /// No response at all.
    Network(String),
}

impl MockFailure {
    pub fn graphql(operation: &str, error: GraphQlError) -> Self {
        Self {
            operation: operation.to_string(),
            with: FailWith::GraphQl(error),
        }
    }

    pub fn http(operation: &str, status: u16) -> Self {
        Self {
            operation: operation.to_string(),
            with: FailWith::Http {
                status,
                message: "mock http failure".to_string(),
            },
        }
    }

    pub fn network(operation: &str) -> Self {
        Self {
            operation: operation.to_string(),
            with: FailWith::Network("connection reset".to_string()),
        }
    }
}

/// Recorded request for test verification.
#[derive(Debug, Clone, PartialEq)]
pub struct MockRequest {
    pub operation: String,
    pub variables: Value,
    /// Raw credential the request carried.
    pub credential: Option<String>,
}

/// Lets a held request proceed.
#[derive(Debug, Clone)]
pub struct Release(Arc<Notify>);

impl Release {
    pub fn release(&self) {
        self.0.notify_one();
    }
}

impl MockTransport {
    /// Create an empty mock server that requires authentication.
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Mutex::new(MockInner {
                departments: Vec::new(),
                sub_departments: Vec::new(),
                next_id: 1,
                users: HashMap::new(),
                tokens: HashMap::new(),
                next_token: 1,
                require_auth: true,
                fail_on: None,
                holds: Vec::new(),
                latency: HashMap::new(),
                requests: Vec::new(),
            })),
        }
    }

    fn lock(&self) -> MutexGuard<'_, MockInner> {
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Register a user that `login` accepts.
    pub fn with_user(self, username: &str, password: &str) -> Self {
        self.lock()
            .users
            .insert(username.to_string(), password.to_string());
        self
    }

    /// Serve data operations without a token.
    pub fn without_auth(self) -> Self {
        self.lock().require_auth = false;
        self
    }

    /// Issue a valid token for `username` without a login round trip.
    pub fn issue_token(&self, username: &str) -> String {
        self.lock().issue_token(username)
    }

    /// Invalidate every issued token, as a server restart or expiry would.
    pub fn revoke_tokens(&self) {
        self.lock().tokens.clear();
    }

    /// Add a department and its sub-departments.
    pub fn seed_department(&self, name: &str, sub_departments: &[&str]) -> Department {
        let mut inner = self.lock();
        let subs: Vec<String> = sub_departments.iter().map(|s| s.to_string()).collect();
        let id = inner.insert_department(name.to_string(), &subs);
        inner.department(id).unwrap_or_else(|| Department {
            id,
            name: name.to_string(),
            sub_departments: Vec::new(),
        })
    }

    /// All departments, in server order.
    pub fn departments(&self) -> Vec<Department> {
        let inner = self.lock();
        inner
            .departments
            .iter()
            .filter_map(|(id, _)| inner.department(*id))
            .collect()
    }

    /// All sub-departments, in server order.
    pub fn sub_departments(&self) -> Vec<SubDepartment> {
        self.lock().all_sub_departments()
    }

    /// Make `failure.operation` fail until cleared.
    pub fn fail_on(&self, failure: MockFailure) {
        self.lock().fail_on = Some(failure);
    }

    pub fn clear_fail_on(&self) {
        self.lock().fail_on = None;
    }

    /// Hold the next matching request until the returned handle is released.
    ///
    /// `variables: None` matches any variables.
    pub fn hold(&self, operation: &str, variables: Option<Value>) -> Release {
        self.push_hold(operation, variables, false)
    }

    /// Like [`MockTransport::hold`], but the response is computed when the
    /// request arrives. Releasing it delivers that old answer, as a slow
    /// network would.
    pub fn hold_snapshot(&self, operation: &str, variables: Option<Value>) -> Release {
        self.push_hold(operation, variables, true)
    }

    fn push_hold(&self, operation: &str, variables: Option<Value>, snapshot: bool) -> Release {
        let gate = Arc::new(Notify::new());
        self.lock().holds.push(Hold {
            operation: operation.to_string(),
            variables,
            gate: Arc::clone(&gate),
            snapshot,
        });
        Release(gate)
    }

    /// Delay every `operation` by `delay`.
    pub fn set_latency(&self, operation: &str, delay: Duration) {
        self.lock().latency.insert(operation.to_string(), delay);
    }

    /// Get all recorded requests.
    pub fn requests(&self) -> Vec<MockRequest> {
        self.lock().requests.clone()
    }

    /// Number of recorded requests for `operation`.
    pub fn count(&self, operation: &str) -> usize {
        self.lock()
            .requests
            .iter()
            .filter(|r| r.operation == operation)
            .count()
    }

    /// Number of recorded mutations (any operation that changes data).
    pub fn mutation_count(&self) -> usize {
        self.lock()
            .requests
            .iter()
            .filter(|r| is_mutation(&r.operation))
            .count()
    }

    pub fn clear_requests(&self) {
        self.lock().requests.clear();
    }
}

impl Default for MockTransport {
    fn default() -> Self {
        Self::new()
    }
}

fn is_mutation(operation: &str) -> bool {
    matches!(
        operation,
        names::CREATE_DEPARTMENT
            | names::UPDATE_DEPARTMENT
            | names::REMOVE_DEPARTMENT
            | names::CREATE_SUB_DEPARTMENT
            | names::UPDATE_SUB_DEPARTMENT
            | names::REMOVE_SUB_DEPARTMENT
    )
}

impl MockInner {
    fn issue_token(&mut self, username: &str) -> String {
        let token = format!("mock-token-{}", self.next_token);
        self.next_token += 1;
        self.tokens.insert(token.clone(), username.to_string());
        token
    }

    fn allocate_id(&mut self) -> EntityId {
        let id = EntityId::new(self.next_id);
        self.next_id += 1;
        id
    }

    fn insert_department(&mut self, name: String, subs: &[String]) -> EntityId {
        let id = self.allocate_id();
        self.departments.push((id, name));
        for sub in subs {
            let sub_id = self.allocate_id();
            self.sub_departments.push(StoredSub {
                id: sub_id,
                name: sub.clone(),
                department_id: id,
            });
        }
        id
    }

    fn department(&self, id: EntityId) -> Option<Department> {
        let (_, name) = self.departments.iter().find(|(d, _)| *d == id)?;
        Some(Department {
            id,
            name: name.clone(),
            sub_departments: self
                .sub_departments
                .iter()
                .filter(|s| s.department_id == id)
                .map(|s| SubDepartmentSummary {
                    id: s.id,
                    name: s.name.clone(),
                })
                .collect(),
        })
    }

    fn department_ref(&self, id: EntityId) -> Option<DepartmentRef> {
        self.departments
            .iter()
            .find(|(d, _)| *d == id)
            .map(|(id, name)| DepartmentRef {
                id: *id,
                name: name.clone(),
            })
    }

    fn sub_department(&self, stored: &StoredSub) -> Option<SubDepartment> {
        Some(SubDepartment {
            id: stored.id,
            name: stored.name.clone(),
            department: self.department_ref(stored.department_id)?,
        })
    }

    fn all_sub_departments(&self) -> Vec<SubDepartment> {
        self.sub_departments
            .iter()
            .filter_map(|s| self.sub_department(s))
            .collect()
    }

    fn take_hold(&mut self, request: &GraphQlRequest) -> Option<Hold> {
        let index = self.holds.iter().position(|h| {
            h.operation == request.operation_name
                && h.variables.as_ref().map_or(true, |v| *v == request.variables)
        })?;
        Some(self.holds.remove(index))
    }

    fn respond(
        &mut self,
        request: &GraphQlRequest,
        credential: Option<&Credential>,
    ) -> Result<GraphQlResponse, ApiError> {
        if let Some(injected) = self.injected(&request.operation_name) {
            return injected;
        }
        Ok(match self.dispatch(request, credential) {
            Ok(data) => GraphQlResponse::data(data),
            Err(error) => GraphQlResponse {
                data: Some(Value::Null),
                errors: vec![error],
            },
        })
    }

    fn injected(&self, operation: &str) -> Option<Result<GraphQlResponse, ApiError>> {
        let failure = self.fail_on.as_ref().filter(|f| f.operation == operation)?;
        Some(match &failure.with {
            FailWith::GraphQl(error) => Ok(GraphQlResponse {
                data: Some(Value::Null),
                errors: vec![error.clone()],
            }),
            FailWith::Http { status, message } => Err(ApiError::Http {
                status: *status,
                message: message.clone(),
            }),
            FailWith::Network(message) => Err(ApiError::Network(message.clone())),
        })
    }

    fn authorized(&self, credential: Option<&Credential>) -> bool {
        !self.require_auth
            || credential.is_some_and(|c| self.tokens.contains_key(c.expose()))
    }

    fn dispatch(
        &mut self,
        request: &GraphQlRequest,
        credential: Option<&Credential>,
    ) -> Result<Value, GraphQlError> {
        let vars = &request.variables;
        let operation = request.operation_name.as_str();

        if operation == names::LOGIN {
            return self.login(vars);
        }
        if !self.authorized(credential) {
            return Err(GraphQlError::with_code("Unauthorized", UNAUTHENTICATED));
        }

        match operation {
            names::GET_DEPARTMENTS => {
                let page = PageRequest::new(uint(vars, &["page"])?, uint(vars, &["limit"])?)
                    .map_err(|e| bad_input(&e.to_string()))?;
                let all: Vec<Department> = self
                    .departments
                    .iter()
                    .filter_map(|(id, _)| self.department(*id))
                    .collect();
                encode(&DepartmentsData {
                    departments: Listing::paginate(all, page),
                })
            }
            names::GET_DEPARTMENTS_FOR_SELECT => {
                let items = self
                    .departments
                    .iter()
                    .take(SELECT_LIMIT as usize)
                    .map(|(id, name)| DepartmentRef {
                        id: *id,
                        name: name.clone(),
                    })
                    .collect();
                encode(&DepartmentOptionsData {
                    departments: DepartmentOptions { items },
                })
            }
            names::CREATE_DEPARTMENT => {
                let name = non_blank(vars, &["input", "name"])?;
                let subs: Vec<String> = vars
                    .pointer("/input/subDepartments")
                    .and_then(Value::as_array)
                    .map(|items| {
                        items
                            .iter()
                            .filter_map(|s| s.get("name").and_then(Value::as_str))
                            .map(str::to_string)
                            .collect()
                    })
                    .unwrap_or_default();
                let id = self.insert_department(name, &subs);
                let created = self.department(id).ok_or_else(|| not_found("Department", id))?;
                encode(&CreateDepartmentData {
                    create_department: created,
                })
            }
            names::UPDATE_DEPARTMENT => {
                let id = EntityId::new(int(vars, &["input", "id"])?);
                let name = non_blank(vars, &["input", "name"])?;
                let slot = self
                    .departments
                    .iter_mut()
                    .find(|(d, _)| *d == id)
                    .ok_or_else(|| not_found("Department", id))?;
                slot.1 = name;
                let updated = self.department(id).ok_or_else(|| not_found("Department", id))?;
                encode(&UpdateDepartmentData {
                    update_department: updated,
                })
            }
            names::REMOVE_DEPARTMENT => {
                let id = EntityId::new(int(vars, &["id"])?);
                let before = self.departments.len();
                self.departments.retain(|(d, _)| *d != id);
                if self.departments.len() == before {
                    return Err(not_found("Department", id));
                }
                self.sub_departments.retain(|s| s.department_id != id);
                encode(&RemoveDepartmentData {
                    remove_department: true,
                })
            }
            names::GET_SUB_DEPARTMENTS => encode(&SubDepartmentsData {
                sub_departments: self.all_sub_departments(),
            }),
            names::CREATE_SUB_DEPARTMENT => {
                let department_id = EntityId::new(int(vars, &["departmentId"])?);
                let name = non_blank(vars, &["input", "name"])?;
                if self.department_ref(department_id).is_none() {
                    return Err(not_found("Department", department_id));
                }
                let id = self.allocate_id();
                let stored = StoredSub {
                    id,
                    name,
                    department_id,
                };
                self.sub_departments.push(stored.clone());
                let created = self
                    .sub_department(&stored)
                    .ok_or_else(|| not_found("SubDepartment", id))?;
                encode(&CreateSubDepartmentData {
                    create_sub_department: created,
                })
            }
            names::UPDATE_SUB_DEPARTMENT => {
                let id = EntityId::new(int(vars, &["input", "id"])?);
                let name = non_blank(vars, &["input", "name"])?;
                let slot = self
                    .sub_departments
                    .iter_mut()
                    .find(|s| s.id == id)
                    .ok_or_else(|| not_found("SubDepartment", id))?;
                slot.name = name;
                let stored = slot.clone();
                let updated = self
                    .sub_department(&stored)
                    .ok_or_else(|| not_found("SubDepartment", id))?;
                encode(&UpdateSubDepartmentData {
                    update_sub_department: updated,
                })
            }
            names::REMOVE_SUB_DEPARTMENT => {
                let id = EntityId::new(int(vars, &["id"])?);
                let before = self.sub_departments.len();
                self.sub_departments.retain(|s| s.id != id);
                if self.sub_departments.len() == before {
                    return Err(not_found("SubDepartment", id));
                }
                encode(&RemoveSubDepartmentData {
                    remove_sub_department: true,
                })
            }
            other => Err(GraphQlError::with_code(
                format!("Unknown operation \"{}\"", other),
                "GRAPHQL_VALIDATION_FAILED",
            )),
        }
    }

    fn login(&mut self, vars: &Value) -> Result<Value, GraphQlError> {
        let username = string(vars, &["input", "username"])?;
        let password = string(vars, &["input", "password"])?;
        if self.users.get(&username) != Some(&password) {
            return Err(GraphQlError::with_code(
                "Invalid credentials",
                UNAUTHENTICATED,
            ));
        }
        let token = self.issue_token(&username);
        encode(&LoginData {
            login: LoginPayload {
                access_token: token,
                user: LoginUser { username },
            },
        })
    }
}

fn lookup<'a>(vars: &'a Value, path: &[&str]) -> Option<&'a Value> {
    path.iter().try_fold(vars, |v, key| v.get(*key))
}

fn int(vars: &Value, path: &[&str]) -> Result<i64, GraphQlError> {
    lookup(vars, path)
        .and_then(Value::as_i64)
        .ok_or_else(|| bad_input(&format!("expected Int at {}", path.join("."))))
}

fn uint(vars: &Value, path: &[&str]) -> Result<u32, GraphQlError> {
    let value = int(vars, path)?;
    u32::try_from(value)
        .map_err(|_| bad_input(&format!("{} is out of range at {}", value, path.join("."))))
}

fn string(vars: &Value, path: &[&str]) -> Result<String, GraphQlError> {
    lookup(vars, path)
        .and_then(Value::as_str)
        .map(str::to_string)
        .ok_or_else(|| bad_input(&format!("expected String at {}", path.join("."))))
}

fn non_blank(vars: &Value, path: &[&str]) -> Result<String, GraphQlError> {
    let value = string(vars, path)?;
    if value.trim().is_empty() {
        return Err(bad_input("name should not be empty"));
    }
    Ok(value)
}

fn bad_input(message: &str) -> GraphQlError {
    GraphQlError::with_code(message, "BAD_USER_INPUT")
}

fn not_found(kind: &str, id: EntityId) -> GraphQlError {
    GraphQlError::with_code(format!("{} with ID {} not found", kind, id), "NOT_FOUND")
}

fn encode<T: Serialize>(data: &T) -> Result<Value, GraphQlError> {
    serde_json::to_value(data).map_err(|e| GraphQlError::new(e.to_string()))
}

#[async_trait]
impl Transport for MockTransport {
    fn name(&self) -> &'static str {
        "mock"
    }

    async fn execute(
        &self,
        request: &GraphQlRequest,
        credential: Option<&Credential>,
    ) -> Result<GraphQlResponse, ApiError> {
        let (hold, delay, snapshot) = {
            let mut inner = self.lock();
            inner.requests.push(MockRequest {
                operation: request.operation_name.clone(),
                variables: request.variables.clone(),
                credential: credential.map(|c| c.expose().to_string()),
            });
            let delay = inner.latency.get(&request.operation_name).copied();
            let hold = inner.take_hold(request);
            let snapshot = match &hold {
                Some(h) if h.snapshot => Some(inner.respond(request, credential)),
                _ => None,
            };
            (hold.map(|h| h.gate), delay, snapshot)
        };

        if let Some(gate) = hold {
            gate.notified().await;
        }
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        match snapshot {
            Some(response) => response,
            None => self.lock().respond(request, credential),
        }
    }
}
