//! console::login
//!
//! Sign-in form. A rejected login stays on the form as an inline error and
//! leaves the current session exactly as it was.

use std::fmt;

use super::errors::FormError;
use crate::api::operations::{self, LoginData};
use crate::api::GraphQlClient;
use crate::auth::{Credential, Identity, Session, SessionStore};

#[derive(Clone, Default, PartialEq)]
pub struct LoginForm {
    pub username: String,
    pub password: String,
    error: Option<FormError>,
    submitting: bool,
}

impl fmt::Debug for LoginForm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LoginForm")
            .field("username", &self.username)
            .field("password", &"[REDACTED]")
            .field("error", &self.error)
            .field("submitting", &self.submitting)
            .finish()
    }
}

impl LoginForm {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
            ..Self::default()
        }
    }

    pub fn error(&self) -> Option<&FormError> {
        self.error.as_ref()
    }

    pub fn is_submitting(&self) -> bool {
        self.submitting
    }

    pub fn submit_label(&self) -> &'static str {
        if self.submitting {
            "Signing in..."
        } else {
            "Sign in"
        }
    }

    /// Exchange the credentials for a token and install the session.
    pub async fn submit(
        &mut self,
        client: &GraphQlClient,
        session: &SessionStore,
    ) -> Result<Session, FormError> {
        self.error = None;
        let result = self.exchange(client, session).await;
        if let Err(err) = &result {
            self.error = Some(err.clone());
        }
        result
    }

    async fn exchange(
        &mut self,
        client: &GraphQlClient,
        session: &SessionStore,
    ) -> Result<Session, FormError> {
        if self.username.trim().is_empty() || self.password.is_empty() {
            return Err(FormError::validation("Username and password are required"));
        }

        self.submitting = true;
        let result = client
            .mutate::<LoginData>(&operations::login(self.username.trim(), &self.password))
            .await
            .and_then(|r| r.into_data());
        self.submitting = false;

        let payload = result?.login;
        let session = session.login(
            Credential::new(payload.access_token),
            Identity::new(payload.user.username),
        )?;
        Ok(session)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::mock::MockFailure;
    use crate::api::operations::names;
    use crate::api::ApiError;
    use crate::auth::AuthError;
    use crate::console::fixtures::{signed_in, signed_out};
    use crate::console::navigation::Route;

    #[tokio::test]
    async fn successful_login_installs_session() {
        let fx = signed_out();
        let client = fx.facade.client();
        let mut form = LoginForm::new("ada", "pw");

        let session = form.submit(&client, &fx.session).await.unwrap();
        assert_eq!(session.identity.username, "ada");
        assert!(fx.session.is_authenticated());
        assert_eq!(fx.session.navigator().current(), Route::Departments);
        assert!(form.error().is_none());

        // The new credential gets a new client that the server accepts.
        let authed = fx.facade.client();
        assert_eq!(authed.credential(), Some(&session.credential));
    }

    #[tokio::test]
    async fn blank_fields_send_nothing() {
        let fx = signed_out();
        let client = fx.facade.client();
        let mut form = LoginForm::new("  ", "pw");
        let err = form.submit(&client, &fx.session).await.unwrap_err();
        assert!(err.is_validation());
        assert!(fx.server.requests().is_empty());
    }

    #[tokio::test]
    async fn wrong_password_is_inline_and_keeps_fields() {
        let fx = signed_out();
        let client = fx.facade.client();
        let mut form = LoginForm::new("ada", "wrong");

        let err = form.submit(&client, &fx.session).await.unwrap_err();
        assert_eq!(err.to_string(), "Invalid credentials");
        assert_eq!(form.error(), Some(&err));
        assert_eq!(form.username, "ada");
        assert_eq!(form.password, "wrong");
        assert!(!fx.session.is_authenticated());
        assert_eq!(form.submit_label(), "Sign in");
    }

    #[tokio::test]
    async fn rejected_login_does_not_end_existing_session() {
        let fx = signed_in();
        let before = fx.session.credential();
        let client = fx.facade.client();
        let mut form = LoginForm::new("ada", "wrong");

        form.submit(&client, &fx.session).await.unwrap_err();
        assert!(fx.session.is_authenticated());
        assert_eq!(fx.session.credential(), before);
    }

    #[tokio::test]
    async fn network_failure_is_reported() {
        let fx = signed_out();
        fx.server.fail_on(MockFailure::network(names::LOGIN));
        let client = fx.facade.client();
        let mut form = LoginForm::new("ada", "pw");
        let err = form.submit(&client, &fx.session).await.unwrap_err();
        assert!(matches!(err, FormError::Api(ApiError::Network(_))));
        assert!(!matches!(err, FormError::Session(AuthError::Persistence(_))));
    }

    #[test]
    fn debug_hides_password() {
        let form = LoginForm::new("ada", "hunter2");
        let shown = format!("{form:?}");
        assert!(shown.contains("ada"));
        assert!(!shown.contains("hunter2"));
    }
}
