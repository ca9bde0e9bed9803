//! console::navigation
//!
//! The current route of the console.
//!
//! [`Navigator`] is a cloneable handle over a `watch` channel. The session
//! store pushes routes on login and logout, the route guard pushes the login
//! route when access is denied, and observers (the CLI, tests) read or await
//! the current route.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use tokio::sync::watch;

/// A console view that can be navigated to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Route {
    /// The login entry point.
    Login,
    /// The department listing (the default view after login).
    Departments,
    /// The sub-department listing.
    SubDepartments,
}

impl Route {
    /// Path-style name, as shown in the status output.
    pub fn path(&self) -> &'static str {
        match self {
            Route::Login => "/login",
            Route::Departments => "/departments",
            Route::SubDepartments => "/sub-departments",
        }
    }

    /// Whether the route shows data that requires a session.
    pub fn is_protected(&self) -> bool {
        !matches!(self, Route::Login)
    }
}

impl fmt::Display for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.path())
    }
}

#[derive(Debug)]
struct Shared {
    tx: watch::Sender<Route>,
    navigations: AtomicU64,
}

/// Cloneable navigation handle. All clones observe the same route.
#[derive(Debug, Clone)]
pub struct Navigator {
    shared: Arc<Shared>,
}

impl Navigator {
    pub fn new(initial: Route) -> Self {
        let (tx, _rx) = watch::channel(initial);
        Self {
            shared: Arc::new(Shared {
                tx,
                navigations: AtomicU64::new(0),
            }),
        }
    }

    pub fn current(&self) -> Route {
        *self.shared.tx.borrow()
    }

    /// Navigate to `route`.
    ///
    /// Returns `false` without notifying observers when already there.
    pub fn push(&self, route: Route) -> bool {
        let moved = self.shared.tx.send_if_modified(|current| {
            if *current == route {
                false
            } else {
                *current = route;
                true
            }
        });
        if moved {
            self.shared.navigations.fetch_add(1, Ordering::SeqCst);
            tracing::debug!(route = %route, "navigate");
        }
        moved
    }

    /// Number of route changes so far.
    pub fn navigations(&self) -> u64 {
        self.shared.navigations.load(Ordering::SeqCst)
    }

    pub fn subscribe(&self) -> watch::Receiver<Route> {
        self.shared.tx.subscribe()
    }
}

impl Default for Navigator {
    fn default() -> Self {
        Self::new(Route::Departments)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn push_same_route_is_noop() {
        let nav = Navigator::new(Route::Login);
        assert!(!nav.push(Route::Login));
        assert_eq!(nav.navigations(), 0);

        assert!(nav.push(Route::Departments));
        assert!(!nav.push(Route::Departments));
        assert_eq!(nav.navigations(), 1);
    }

    #[test]
    fn clones_share_route() {
        let nav = Navigator::default();
        let other = nav.clone();
        other.push(Route::SubDepartments);
        assert_eq!(nav.current(), Route::SubDepartments);
    }

    #[tokio::test]
    async fn subscribers_see_changes() {
        let nav = Navigator::new(Route::Departments);
        let mut rx = nav.subscribe();
        nav.push(Route::Login);
        rx.changed().await.expect("sender alive");
        assert_eq!(*rx.borrow(), Route::Login);
    }

    #[test]
    fn only_login_is_unprotected() {
        assert!(!Route::Login.is_protected());
        assert!(Route::Departments.is_protected());
        assert!(Route::SubDepartments.is_protected());
        assert_eq!(Route::SubDepartments.to_string(), "/sub-departments");
    }
}
