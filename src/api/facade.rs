//! api::facade
//!
//! The process-wide entry point to the GraphQL client.
//!
//! The facade builds a [`GraphQlClient`] lazily for the session's current
//! credential and reuses it until the credential changes. A credential change
//! (login, logout, forced logout) yields a new client with an empty cache, so
//! data fetched under one identity is never served under another. Unrelated
//! session changes do not rebuild.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use super::client::GraphQlClient;
use super::errors::AuthClassifier;
use super::transport::Transport;
use crate::auth::{Credential, SessionStore};

struct Built {
    credential: Option<Credential>,
    client: Arc<GraphQlClient>,
}

/// Shared client factory bound to a session store.
pub struct ClientFacade {
    session: Arc<SessionStore>,
    transport: Arc<dyn Transport>,
    classifier: AuthClassifier,
    current: Mutex<Option<Built>>,
    generation: AtomicU64,
}

impl fmt::Debug for ClientFacade {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientFacade")
            .field("transport", &self.transport.name())
            .field("classifier", &self.classifier)
            .field("generation", &self.generation())
            .finish()
    }
}

impl ClientFacade {
    pub fn new(session: Arc<SessionStore>, transport: Arc<dyn Transport>) -> Self {
        Self {
            session,
            transport,
            classifier: AuthClassifier::default(),
            current: Mutex::new(None),
            generation: AtomicU64::new(0),
        }
    }

    pub fn with_classifier(mut self, classifier: AuthClassifier) -> Self {
        self.classifier = classifier;
        self
    }

    /// The client for the current credential.
    pub fn client(&self) -> Arc<GraphQlClient> {
        let credential = self.session.credential();
        let mut current = self.current.lock().unwrap_or_else(|e| e.into_inner());

        if let Some(built) = current.as_ref() {
            if built.credential == credential {
                return Arc::clone(&built.client);
            }
        }

        let client = Arc::new(self.build(credential.clone()));
        *current = Some(Built {
            credential,
            client: Arc::clone(&client),
        });
        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        tracing::debug!(generation, "built graphql client");
        client
    }

    fn build(&self, credential: Option<Credential>) -> GraphQlClient {
        let session = Arc::clone(&self.session);
        let bound = credential.clone();
        GraphQlClient::new(Arc::clone(&self.transport), credential)
            .with_classifier(self.classifier)
            .on_unauthenticated(move || {
                // A late rejection aimed at an older credential must not end
                // a newer session.
                if session.credential() == bound {
                    session.logout();
                }
            })
    }

    /// Number of clients built so far.
    pub fn generation(&self) -> u64 {
        self.generation.load(Ordering::SeqCst)
    }

    pub fn session(&self) -> &Arc<SessionStore> {
        &self.session
    }

    pub fn transport(&self) -> &Arc<dyn Transport> {
        &self.transport
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::mock::MockTransport;
    use crate::auth::Identity;
    use crate::console::navigation::Navigator;
    use crate::secrets::MemorySecretStore;

    fn facade() -> ClientFacade {
        let session =
            SessionStore::restored(Box::new(MemorySecretStore::new()), Navigator::default());
        ClientFacade::new(session, Arc::new(MockTransport::new()))
    }

    #[test]
    fn reuses_client_while_credential_is_unchanged() {
        let facade = facade();
        let a = facade.client();
        let b = facade.client();
        assert!(Arc::ptr_eq(&a, &b));
        assert_eq!(facade.generation(), 1);

        // Navigation is session-adjacent state but not the credential.
        facade.session().navigator().push(crate::console::navigation::Route::SubDepartments);
        assert!(Arc::ptr_eq(&a, &facade.client()));
    }

    #[test]
    fn rebuilds_on_login_and_logout() {
        let facade = facade();
        let anonymous = facade.client();
        assert!(anonymous.credential().is_none());

        facade
            .session()
            .login(Credential::new("tok"), Identity::new("ada"))
            .unwrap();
        let authed = facade.client();
        assert!(!Arc::ptr_eq(&anonymous, &authed));
        assert_eq!(authed.credential().map(Credential::expose), Some("tok"));

        facade.session().logout();
        let after = facade.client();
        assert!(after.credential().is_none());
        assert_eq!(facade.generation(), 3);
    }
}
