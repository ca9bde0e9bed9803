//! auth::guard
//!
//! Access decisions for protected views.
//!
//! The guard distinguishes "not known yet" ([`GuardDecision::Pending`]) from
//! "known denied" ([`GuardDecision::Denied`]). Nothing is shown and nobody is
//! redirected while the session is loading. Once denied, the guard pushes the
//! login route a single time. It pushes again only after an `Allowed`
//! decision has re-armed it.

use tokio::sync::watch;

use super::session::{SessionStatus, SessionStore};
use crate::console::navigation::{Navigator, Route};

/// Outcome of one guard evaluation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GuardDecision {
    /// Session still loading; render nothing, do not redirect.
    Pending,
    /// Protected content may render.
    Allowed,
    /// Access denied; the login route has been requested.
    Denied,
}

/// `!loading && authenticated && credential present`.
pub fn is_allowed(status: &SessionStatus) -> bool {
    match status {
        SessionStatus::Authenticated(session) => !session.credential.is_empty(),
        SessionStatus::Loading | SessionStatus::Anonymous => false,
    }
}

/// Route guard bound to one session store.
#[derive(Debug)]
pub struct RouteGuard {
    rx: watch::Receiver<SessionStatus>,
    navigator: Navigator,
    redirected: bool,
}

impl RouteGuard {
    pub fn new(session: &SessionStore) -> Self {
        Self {
            rx: session.subscribe(),
            navigator: session.navigator().clone(),
            redirected: false,
        }
    }

    /// Decide access for the current session status.
    pub fn evaluate(&mut self) -> GuardDecision {
        let status = self.rx.borrow_and_update().clone();
        self.decide(&status)
    }

    fn decide(&mut self, status: &SessionStatus) -> GuardDecision {
        if status.is_loading() {
            return GuardDecision::Pending;
        }
        if is_allowed(status) {
            self.redirected = false;
            return GuardDecision::Allowed;
        }
        if !self.redirected {
            self.redirected = true;
            if self.navigator.push(Route::Login) {
                tracing::debug!("guard redirected to login");
            }
        }
        GuardDecision::Denied
    }

    /// Wait for the next session change and evaluate it.
    ///
    /// Returns `None` once the session store is gone.
    pub async fn changed(&mut self) -> Option<GuardDecision> {
        self.rx.changed().await.ok()?;
        Some(self.evaluate())
    }

    /// Wait until the session has loaded and return the first decision.
    pub async fn settled(&mut self) -> Option<GuardDecision> {
        loop {
            match self.evaluate() {
                GuardDecision::Pending => {
                    self.rx.changed().await.ok()?;
                }
                decision => return Some(decision),
            }
        }
    }

    /// Whether the guard has issued a redirect that has not been re-armed.
    pub fn redirect_issued(&self) -> bool {
        self.redirected
    }
}
