//! Shared setup for console unit tests.

use std::sync::Arc;

use crate::api::mock::MockTransport;
use crate::api::ClientFacade;
use crate::auth::{Credential, Identity, SessionStore};
use crate::console::navigation::Navigator;
use crate::secrets::MemorySecretStore;

pub(crate) struct Fixture {
    pub server: MockTransport,
    pub session: Arc<SessionStore>,
    pub facade: Arc<ClientFacade>,
}

/// A mock server with user `ada`/`pw` and a session already signed in.
pub(crate) fn signed_in() -> Fixture {
    let fx = signed_out();
    let token = fx.server.issue_token("ada");
    fx.session
        .login(Credential::new(token), Identity::new("ada"))
        .unwrap();
    fx
}

pub(crate) fn signed_out() -> Fixture {
    let server = MockTransport::new().with_user("ada", "pw");
    let session = SessionStore::restored(Box::new(MemorySecretStore::new()), Navigator::default());
    let facade = Arc::new(ClientFacade::new(
        Arc::clone(&session),
        Arc::new(server.clone()),
    ));
    Fixture {
        server,
        session,
        facade,
    }
}
