//! api::transport
//!
//! The HTTP seam of the GraphQL client.
//!
//! # Design
//!
//! The `Transport` trait is async because it performs network I/O. The
//! client above it owns caching, fetch policies and session-loss handling;
//! a transport only moves one request and one response.
//!
//! The `authorization` header is attached only when a credential is given.
//! Without one the header is absent entirely, never empty.

use std::fmt;

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, AUTHORIZATION};
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use super::errors::{ApiError, GraphQlError};
use crate::auth::Credential;

/// User-Agent header value for API requests.
const USER_AGENT_VALUE: &str = concat!("orgdesk/", env!("CARGO_PKG_VERSION"));

/// Longest response body quoted in an HTTP error.
const MAX_ERROR_BODY: usize = 200;

/// A GraphQL operation ready to send.
///
/// `Debug` lists variable names only; login variables carry a password.
#[derive(Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GraphQlRequest {
    pub operation_name: String,
    pub query: &'static str,
    pub variables: Value,
    /// The operation trades user credentials for a session (login). Its
    /// authentication errors are bad credentials, not a lost session.
    #[serde(skip)]
    pub exchanges_credential: bool,
}

impl fmt::Debug for GraphQlRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names: Vec<&str> = self
            .variables
            .as_object()
            .map(|m| m.keys().map(String::as_str).collect())
            .unwrap_or_default();
        f.debug_struct("GraphQlRequest")
            .field("operation_name", &self.operation_name)
            .field("variables", &names)
            .finish()
    }
}

impl GraphQlRequest {
    pub fn new(operation_name: impl Into<String>, query: &'static str, variables: Value) -> Self {
        Self {
            operation_name: operation_name.into(),
            query,
            variables,
            exchanges_credential: false,
        }
    }

    /// Mark the request as a credential exchange.
    pub fn exchanging_credential(mut self) -> Self {
        self.exchanges_credential = true;
        self
    }
}

/// A GraphQL response body. `data` and `errors` may both be present.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GraphQlResponse {
    #[serde(default)]
    pub data: Option<Value>,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub errors: Vec<GraphQlError>,
}

fn null_as_empty<'de, D>(deserializer: D) -> Result<Vec<GraphQlError>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<Vec<GraphQlError>>::deserialize(deserializer)?.unwrap_or_default())
}

impl GraphQlResponse {
    pub fn data(data: Value) -> Self {
        Self {
            data: Some(data),
            errors: Vec::new(),
        }
    }

    pub fn errors(errors: Vec<GraphQlError>) -> Self {
        Self { data: None, errors }
    }

    /// `data` unless it is absent or `null`.
    pub fn non_null_data(&self) -> Option<&Value> {
        self.data.as_ref().filter(|d| !d.is_null())
    }
}

/// Moves GraphQL requests to a server.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Short name for logs.
    fn name(&self) -> &'static str;

    /// Send `request`, authenticated with `credential` when present.
    async fn execute(
        &self,
        request: &GraphQlRequest,
        credential: Option<&Credential>,
    ) -> Result<GraphQlResponse, ApiError>;
}

/// Transport over HTTP POST with a JSON body.
pub struct HttpTransport {
    client: Client,
    endpoint: String,
}

impl fmt::Debug for HttpTransport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HttpTransport")
            .field("endpoint", &self.endpoint)
            .finish()
    }
}

impl HttpTransport {
    /// Create a transport for `endpoint`.
    pub fn new(endpoint: impl Into<String>) -> Result<Self, ApiError> {
        let client = Client::builder()
            .user_agent(USER_AGENT_VALUE)
            .build()
            .map_err(|e| ApiError::Network(e.to_string()))?;
        Ok(Self {
            client,
            endpoint: endpoint.into(),
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    fn headers(credential: Option<&Credential>) -> Result<HeaderMap, ApiError> {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
        if let Some(credential) = credential {
            let mut value = HeaderValue::from_str(&credential.bearer())
                .map_err(|_| ApiError::InvalidCredential)?;
            value.set_sensitive(true);
            headers.insert(AUTHORIZATION, value);
        }
        Ok(headers)
    }
}

#[async_trait]
impl Transport for HttpTransport {
    fn name(&self) -> &'static str {
        "http"
    }

    async fn execute(
        &self,
        request: &GraphQlRequest,
        credential: Option<&Credential>,
    ) -> Result<GraphQlResponse, ApiError> {
        let response = self
            .client
            .post(&self.endpoint)
            .headers(Self::headers(credential)?)
            .json(request)
            .send()
            .await
            .map_err(|e| ApiError::Network(e.without_url().to_string()))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| ApiError::Network(e.without_url().to_string()))?;

        if status == StatusCode::UNAUTHORIZED {
            return Err(ApiError::Http {
                status: status.as_u16(),
                message: quote_body(&body, status),
            });
        }

        // GraphQL servers report validation failures as 400 with an errors
        // array; keep those as GraphQL errors.
        match serde_json::from_str::<GraphQlResponse>(&body) {
            Ok(parsed) if status.is_success() => Ok(parsed),
            Ok(parsed) if parsed.data.is_some() || !parsed.errors.is_empty() => Ok(parsed),
            Ok(_) => Err(ApiError::Http {
                status: status.as_u16(),
                message: quote_body(&body, status),
            }),
            Err(e) if status.is_success() => Err(ApiError::Decode(e.to_string())),
            Err(_) => Err(ApiError::Http {
                status: status.as_u16(),
                message: quote_body(&body, status),
            }),
        }
    }
}

fn quote_body(body: &str, status: StatusCode) -> String {
    let trimmed = body.trim();
    if trimmed.is_empty() {
        return status
            .canonical_reason()
            .unwrap_or("unknown error")
            .to_string();
    }
    trimmed.chars().take(MAX_ERROR_BODY).collect()
}
