//! api::operations
//!
//! GraphQL documents, request builders and response shapes for every
//! operation the console uses.
//!
//! Builders take validated types ([`EntityName`], [`PageRequest`]), so a
//! blank name or a zero page cannot be sent. Ids go out as `Int`.

use serde::{Deserialize, Serialize};
use serde_json::json;

use super::cache::QueryKey;
use super::transport::GraphQlRequest;
use crate::core::types::{
    Department, DepartmentRef, EntityId, EntityName, Listing, PageRequest, SubDepartment,
};

/// Operation names, as sent in `operationName` and used in cache keys.
pub mod names {
    pub const LOGIN: &str = "Login";
    pub const GET_DEPARTMENTS: &str = "GetDepartments";
    pub const GET_DEPARTMENTS_FOR_SELECT: &str = "GetDepartmentsForSelect";
    pub const CREATE_DEPARTMENT: &str = "CreateDepartment";
    pub const UPDATE_DEPARTMENT: &str = "UpdateDepartment";
    pub const REMOVE_DEPARTMENT: &str = "RemoveDepartment";
    pub const GET_SUB_DEPARTMENTS: &str = "GetSubDepartments";
    pub const CREATE_SUB_DEPARTMENT: &str = "CreateSubDepartment";
    pub const UPDATE_SUB_DEPARTMENT: &str = "UpdateSubDepartment";
    pub const REMOVE_SUB_DEPARTMENT: &str = "RemoveSubDepartment";
}

/// Page fetched to fill the department picker.
pub const SELECT_LIMIT: u32 = 100;

const LOGIN: &str = r#"mutation Login($input: LoginInput!) {
  login(input: $input) {
    access_token
    user { username }
  }
}"#;

const GET_DEPARTMENTS: &str = r#"query GetDepartments($page: Int!, $limit: Int!) {
  departments(pagination: { page: $page, limit: $limit }) {
    items { id name subDepartments { id name } }
    total
    page
    limit
    hasMore
  }
}"#;

const GET_DEPARTMENTS_FOR_SELECT: &str = r#"query GetDepartmentsForSelect {
  departments(pagination: { page: 1, limit: 100 }) {
    items { id name }
  }
}"#;

const CREATE_DEPARTMENT: &str = r#"mutation CreateDepartment($input: CreateDepartmentInput!) {
  createDepartment(input: $input) { id name subDepartments { id name } }
}"#;

const UPDATE_DEPARTMENT: &str = r#"mutation UpdateDepartment($input: UpdateDepartmentInput!) {
  updateDepartment(input: $input) { id name subDepartments { id name } }
}"#;

const REMOVE_DEPARTMENT: &str = r#"mutation RemoveDepartment($id: Int!) {
  removeDepartment(id: $id)
}"#;

const GET_SUB_DEPARTMENTS: &str = r#"query GetSubDepartments {
  subDepartments { id name department { id name } }
}"#;

const CREATE_SUB_DEPARTMENT: &str = r#"mutation CreateSubDepartment($departmentId: Int!, $input: CreateSubDepartmentInput!) {
  createSubDepartment(departmentId: $departmentId, input: $input) { id name department { id name } }
}"#;

const UPDATE_SUB_DEPARTMENT: &str = r#"mutation UpdateSubDepartment($input: UpdateSubDepartmentInput!) {
  updateSubDepartment(input: $input) { id name department { id name } }
}"#;

const REMOVE_SUB_DEPARTMENT: &str = r#"mutation RemoveSubDepartment($id: Int!) {
  removeSubDepartment(id: $id)
}"#;

// ---------------------------------------------------------------------------
// Request builders
// ---------------------------------------------------------------------------

pub fn login(username: &str, password: &str) -> GraphQlRequest {
    GraphQlRequest::new(
        names::LOGIN,
        LOGIN,
        json!({ "input": { "username": username, "password": password } }),
    )
    .exchanging_credential()
}

pub fn departments(page: PageRequest) -> GraphQlRequest {
    GraphQlRequest::new(
        names::GET_DEPARTMENTS,
        GET_DEPARTMENTS,
        json!({ "page": page.page(), "limit": page.limit() }),
    )
}

/// Cache key of one department page.
pub fn departments_key(page: PageRequest) -> QueryKey {
    QueryKey::of(&departments(page))
}

/// First [`SELECT_LIMIT`] departments, ids and names only.
pub fn departments_for_select() -> GraphQlRequest {
    GraphQlRequest::new(
        names::GET_DEPARTMENTS_FOR_SELECT,
        GET_DEPARTMENTS_FOR_SELECT,
        json!({}),
    )
}

/// Create a department with its initial sub-departments.
pub fn create_department(name: &EntityName, sub_departments: &[EntityName]) -> GraphQlRequest {
    let subs: Vec<_> = sub_departments
        .iter()
        .map(|s| json!({ "name": s.as_str() }))
        .collect();
    GraphQlRequest::new(
        names::CREATE_DEPARTMENT,
        CREATE_DEPARTMENT,
        json!({ "input": { "name": name.as_str(), "subDepartments": subs } }),
    )
}

/// Rename a department. Sub-departments are never sent on update.
pub fn update_department(id: EntityId, name: &EntityName) -> GraphQlRequest {
    GraphQlRequest::new(
        names::UPDATE_DEPARTMENT,
        UPDATE_DEPARTMENT,
        json!({ "input": { "id": id.get(), "name": name.as_str() } }),
    )
}

pub fn remove_department(id: EntityId) -> GraphQlRequest {
    GraphQlRequest::new(
        names::REMOVE_DEPARTMENT,
        REMOVE_DEPARTMENT,
        json!({ "id": id.get() }),
    )
}

pub fn sub_departments() -> GraphQlRequest {
    GraphQlRequest::new(names::GET_SUB_DEPARTMENTS, GET_SUB_DEPARTMENTS, json!({}))
}

/// Cache key of the sub-department listing.
pub fn sub_departments_key() -> QueryKey {
    QueryKey::of(&sub_departments())
}

pub fn create_sub_department(department_id: EntityId, name: &EntityName) -> GraphQlRequest {
    GraphQlRequest::new(
        names::CREATE_SUB_DEPARTMENT,
        CREATE_SUB_DEPARTMENT,
        json!({ "departmentId": department_id.get(), "input": { "name": name.as_str() } }),
    )
}

pub fn update_sub_department(id: EntityId, name: &EntityName) -> GraphQlRequest {
    GraphQlRequest::new(
        names::UPDATE_SUB_DEPARTMENT,
        UPDATE_SUB_DEPARTMENT,
        json!({ "input": { "id": id.get(), "name": name.as_str() } }),
    )
}

pub fn remove_sub_department(id: EntityId) -> GraphQlRequest {
    GraphQlRequest::new(
        names::REMOVE_SUB_DEPARTMENT,
        REMOVE_SUB_DEPARTMENT,
        json!({ "id": id.get() }),
    )
}

// ---------------------------------------------------------------------------
// Response shapes
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoginUser {
    pub username: String,
}

/// Payload of `login`.
///
/// The server names the token `access_token`; `accessToken` is accepted too.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoginPayload {
    #[serde(alias = "accessToken")]
    pub access_token: String,
    pub user: LoginUser,
}

impl std::fmt::Debug for LoginPayload {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LoginPayload")
            .field("access_token", &"[REDACTED]")
            .field("user", &self.user)
            .finish()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoginData {
    pub login: LoginPayload,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DepartmentsData {
    pub departments: Listing<Department>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DepartmentOptions {
    pub items: Vec<DepartmentRef>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DepartmentOptionsData {
    pub departments: DepartmentOptions,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateDepartmentData {
    pub create_department: Department,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateDepartmentData {
    pub update_department: Department,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RemoveDepartmentData {
    pub remove_department: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubDepartmentsData {
    pub sub_departments: Vec<SubDepartment>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateSubDepartmentData {
    pub create_sub_department: SubDepartment,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateSubDepartmentData {
    pub update_sub_department: SubDepartment,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RemoveSubDepartmentData {
    pub remove_sub_department: bool,
}
