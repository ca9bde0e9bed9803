//! Integration tests for the HTTP transport against a stub GraphQL server.
//!
//! Tests cover:
//! - authorization header presence and absence
//! - request body shape
//! - session loss on HTTP 401 and on `UNAUTHENTICATED`
//! - errors that must not end the session

use std::sync::Arc;

use serde_json::{json, Value};
use wiremock::matchers::{body_partial_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use orgdesk::api::operations::{self, DepartmentsData};
use orgdesk::api::{ApiError, ClientFacade, FetchPolicy, HttpTransport, UNAUTHENTICATED};
use orgdesk::auth::{Credential, Identity, SessionStatus, SessionStore};
use orgdesk::console::{LoginForm, Navigator, Route};
use orgdesk::core::types::{EntityId, PageRequest};
use orgdesk::secrets::MemorySecretStore;

fn departments_page() -> Value {
    json!({
        "data": {
            "departments": {
                "items": [
                    { "id": "1", "name": "Engineering", "subDepartments": [{ "id": 2, "name": "Platform" }] }
                ],
                "total": 1,
                "page": 1,
                "limit": 10,
                "hasMore": false
            }
        }
    })
}

fn session(signed_in: bool) -> Arc<SessionStore> {
    let session = SessionStore::restored(Box::new(MemorySecretStore::new()), Navigator::default());
    if signed_in {
        session
            .login(Credential::new("tok-1"), Identity::new("ada"))
            .unwrap();
    }
    session
}

fn facade(server: &MockServer, session: &Arc<SessionStore>) -> ClientFacade {
    let transport = HttpTransport::new(format!("{}/graphql", server.uri())).unwrap();
    ClientFacade::new(Arc::clone(session), Arc::new(transport))
}

async fn query_departments(facade: &ClientFacade) -> Result<DepartmentsData, ApiError> {
    let page = PageRequest::first(10).unwrap();
    facade
        .client()
        .query::<DepartmentsData>(&operations::departments(page), FetchPolicy::NetworkOnly)
        .await?
        .into_data()
}

#[tokio::test]
async fn signed_in_requests_carry_the_bearer_token() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/graphql"))
        .and(header("authorization", "Bearer tok-1"))
        .and(body_partial_json(json!({
            "operationName": "GetDepartments",
            "variables": { "page": 1, "limit": 10 }
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(departments_page()))
        .expect(1)
        .mount(&server)
        .await;

    let session = session(true);
    let data = query_departments(&facade(&server, &session)).await.unwrap();

    let engineering = &data.departments.items[0];
    assert_eq!(engineering.id, EntityId::new(1));
    assert_eq!(engineering.sub_departments[0].id, EntityId::new(2));
}

#[tokio::test]
async fn anonymous_requests_have_no_authorization_header() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/graphql"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": { "login": { "access_token": "tok-9", "user": { "username": "ada" } } }
        })))
        .mount(&server)
        .await;

    let session = session(false);
    let facade = facade(&server, &session);
    LoginForm::new("ada", "pw")
        .submit(&facade.client(), &session)
        .await
        .unwrap();

    let requests = server.received_requests().await.unwrap();
    assert_eq!(requests.len(), 1);
    assert!(requests[0].headers.get("authorization").is_none());
    assert_eq!(session.credential(), Some(Credential::new("tok-9")));
}

#[tokio::test]
async fn http_401_ends_the_session() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(401).set_body_string("token expired"))
        .mount(&server)
        .await;

    let session = session(true);
    let err = query_departments(&facade(&server, &session))
        .await
        .unwrap_err();

    assert!(matches!(err, ApiError::Http { status: 401, .. }));
    assert_eq!(session.status(), SessionStatus::Anonymous);
    assert_eq!(session.navigator().current(), Route::Login);
}

#[tokio::test]
async fn unauthenticated_code_ends_the_session() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": null,
            "errors": [{ "message": "jwt expired", "extensions": { "code": UNAUTHENTICATED } }]
        })))
        .mount(&server)
        .await;

    let session = session(true);
    assert!(query_departments(&facade(&server, &session)).await.is_err());
    assert_eq!(session.status(), SessionStatus::Anonymous);
}

#[tokio::test]
async fn other_errors_keep_the_session() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": null,
            "errors": [{ "message": "Department name taken", "extensions": { "code": "BAD_USER_INPUT" } }]
        })))
        .mount(&server)
        .await;

    let session = session(true);
    let err = query_departments(&facade(&server, &session))
        .await
        .unwrap_err();

    assert_eq!(err.to_string(), "Department name taken");
    assert!(session.is_authenticated());
}

#[tokio::test]
async fn partial_data_is_kept_with_its_errors() {
    let server = MockServer::start().await;
    let mut body = departments_page();
    body["errors"] = json!([{ "message": "sub-department resolver failed" }]);
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(body))
        .mount(&server)
        .await;

    let session = session(true);
    let page = PageRequest::first(10).unwrap();
    let result = facade(&server, &session)
        .client()
        .query::<DepartmentsData>(&operations::departments(page), FetchPolicy::NetworkOnly)
        .await
        .unwrap();

    assert!(result.data.is_some());
    assert_eq!(result.errors.len(), 1);
    assert!(session.is_authenticated());
}

#[tokio::test]
async fn rejected_login_keeps_the_current_session() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": null,
            "errors": [{ "message": "Invalid credentials", "extensions": { "code": UNAUTHENTICATED } }]
        })))
        .mount(&server)
        .await;

    let session = session(true);
    let facade = facade(&server, &session);
    let mut form = LoginForm::new("ada", "wrong");
    assert!(form.submit(&facade.client(), &session).await.is_err());

    assert!(form.error().is_some());
    assert_eq!(session.credential(), Some(Credential::new("tok-1")));
}
