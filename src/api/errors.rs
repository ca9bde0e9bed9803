//! api::errors
//!
//! GraphQL and transport error types, and session-loss classification.
//!
//! # Classification
//!
//! A failure means "the session is no longer valid" when:
//! - the HTTP status is 401, or
//! - a GraphQL error carries `extensions.code == "UNAUTHENTICATED"`.
//!
//! Servers that send no codes are covered by a text fallback: a code-less
//! GraphQL error whose message contains "unauthorized" (any case). The
//! fallback is controlled by [`AuthClassifier::match_unauthorized_text`]. An
//! error that carries any code is never classified by its text.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Error code the server uses for a missing or rejected credential.
pub const UNAUTHENTICATED: &str = "UNAUTHENTICATED";

/// `extensions` of a GraphQL error. Only the code is interpreted.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorExtensions {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
}

/// One entry of a GraphQL `errors` array.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GraphQlError {
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub extensions: Option<ErrorExtensions>,
}

impl GraphQlError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            extensions: None,
        }
    }

    pub fn with_code(message: impl Into<String>, code: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            extensions: Some(ErrorExtensions {
                code: Some(code.into()),
            }),
        }
    }

    pub fn code(&self) -> Option<&str> {
        self.extensions.as_ref().and_then(|e| e.code.as_deref())
    }

    /// Structured check: the error code is `UNAUTHENTICATED`.
    pub fn is_unauthenticated(&self) -> bool {
        self.code() == Some(UNAUTHENTICATED)
    }
}

/// Errors from GraphQL operations.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ApiError {
    /// The request never produced an HTTP response.
    #[error("network error: {0}")]
    Network(String),

    /// Non-GraphQL HTTP failure.
    #[error("HTTP {status}: {message}")]
    Http {
        /// HTTP status code
        status: u16,
        /// Response body or reason phrase
        message: String,
    },

    /// The server answered with GraphQL errors.
    #[error("{}", join_messages(.0))]
    GraphQl(Vec<GraphQlError>),

    /// The response body did not have the expected shape.
    #[error("invalid response: {0}")]
    Decode(String),

    /// The operation succeeded but returned no data.
    #[error("no data returned for {0}")]
    MissingData(String),

    /// The credential cannot be sent as a header.
    #[error("credential contains characters that cannot be sent in a header")]
    InvalidCredential,
}

fn join_messages(errors: &[GraphQlError]) -> String {
    if errors.is_empty() {
        return "unknown GraphQL error".to_string();
    }
    errors
        .iter()
        .map(|e| e.message.as_str())
        .collect::<Vec<_>>()
        .join("; ")
}

impl ApiError {
    /// Structured session-loss check: HTTP 401 or an `UNAUTHENTICATED` code.
    pub fn is_unauthenticated(&self) -> bool {
        match self {
            ApiError::Http { status, .. } => *status == 401,
            ApiError::GraphQl(errors) => errors.iter().any(GraphQlError::is_unauthenticated),
            _ => false,
        }
    }

    /// GraphQL errors carried by this error, if any.
    pub fn graphql_errors(&self) -> &[GraphQlError] {
        match self {
            ApiError::GraphQl(errors) => errors,
            _ => &[],
        }
    }
}

impl From<serde_json::Error> for ApiError {
    fn from(err: serde_json::Error) -> Self {
        ApiError::Decode(err.to_string())
    }
}

/// Decides whether a failure means the session was lost.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AuthClassifier {
    /// Apply the "unauthorized" text fallback to code-less errors.
    pub match_unauthorized_text: bool,
}

impl Default for AuthClassifier {
    fn default() -> Self {
        Self {
            match_unauthorized_text: true,
        }
    }
}

impl AuthClassifier {
    /// Structured checks only.
    pub fn strict() -> Self {
        Self {
            match_unauthorized_text: false,
        }
    }

    pub fn is_session_error(&self, error: &GraphQlError) -> bool {
        if error.is_unauthenticated() {
            return true;
        }
        self.match_unauthorized_text
            && error.code().is_none()
            && error.message.to_lowercase().contains("unauthorized")
    }

    pub fn is_session_loss(&self, error: &ApiError) -> bool {
        match error {
            ApiError::GraphQl(errors) => errors.iter().any(|e| self.is_session_error(e)),
            other => other.is_unauthenticated(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn http_401_is_unauthenticated() {
        let err = ApiError::Http {
            status: 401,
            message: "Unauthorized".into(),
        };
        assert!(err.is_unauthenticated());
        assert!(AuthClassifier::strict().is_session_loss(&err));

        let err = ApiError::Http {
            status: 500,
            message: "boom".into(),
        };
        assert!(!err.is_unauthenticated());
    }

    #[test]
    fn code_wins_over_text() {
        let classifier = AuthClassifier::default();

        let coded = GraphQlError::with_code("whatever", UNAUTHENTICATED);
        assert!(classifier.is_session_error(&coded));

        // Text mentions unauthorized but the code says otherwise.
        let forbidden = GraphQlError::with_code("Unauthorized to delete", "FORBIDDEN");
        assert!(!classifier.is_session_error(&forbidden));
    }

    #[test]
    fn text_fallback_applies_only_to_codeless_errors_when_enabled() {
        let codeless = GraphQlError::new("Unauthorized");
        assert!(AuthClassifier::default().is_session_error(&codeless));
        assert!(!AuthClassifier::strict().is_session_error(&codeless));
        assert!(!codeless.is_unauthenticated());
    }

    #[test]
    fn unrelated_errors_are_not_session_loss() {
        let classifier = AuthClassifier::default();
        let err = ApiError::GraphQl(vec![GraphQlError::new("Department not found")]);
        assert!(!classifier.is_session_loss(&err));
        assert!(!classifier.is_session_loss(&ApiError::Network("reset".into())));
    }

    #[test]
    fn graphql_error_display_joins_messages() {
        let err = ApiError::GraphQl(vec![GraphQlError::new("a"), GraphQlError::new("b")]);
        assert_eq!(err.to_string(), "a; b");
    }

    #[test]
    fn deserializes_wire_errors() {
        let err: GraphQlError = serde_json::from_str(
            r#"{"message":"no","locations":[{"line":1,"column":2}],"extensions":{"code":"UNAUTHENTICATED","stacktrace":[]}}"#,
        )
        .unwrap();
        assert!(err.is_unauthenticated());

        let err: GraphQlError = serde_json::from_str(r#"{"message":"no","extensions":null}"#).unwrap();
        assert_eq!(err.code(), None);
    }
}
