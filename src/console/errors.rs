//! console::errors - form and card errors

use thiserror::Error;

use crate::api::ApiError;
use crate::auth::AuthError;

/// Why a form submission did not go through.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum FormError {
    /// Rejected before any request was sent.
    #[error("{0}")]
    Validation(String),

    #[error(transparent)]
    Api(#[from] ApiError),

    #[error(transparent)]
    Session(#[from] AuthError),

    #[error("a submission is already in flight")]
    InFlight,
}

impl FormError {
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    pub fn is_validation(&self) -> bool {
        matches!(self, Self::Validation(_))
    }
}

/// Why a card action did not go through.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum CardError {
    #[error("a delete is already in flight")]
    DeleteInFlight,

    #[error("delete was not requested")]
    NotConfirming,

    #[error("not editing")]
    NotEditing,

    #[error("the server did not remove the {0}")]
    NotRemoved(&'static str),

    /// The owning view was torn down before the operation finished.
    #[error("view was closed")]
    Cancelled,

    #[error(transparent)]
    Form(#[from] FormError),

    #[error(transparent)]
    Api(#[from] ApiError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validation_message_is_shown_verbatim() {
        let err = FormError::validation("Department name is required");
        assert_eq!(err.to_string(), "Department name is required");
        assert!(err.is_validation());
    }

    #[test]
    fn api_errors_pass_through() {
        let err = CardError::from(ApiError::Network("connection refused".into()));
        assert!(err.to_string().contains("connection refused"));
        let form = CardError::from(FormError::validation("x"));
        assert_eq!(form.to_string(), "x");
    }
}
