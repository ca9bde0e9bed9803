//! console::scope
//!
//! Cancellation scope owned by a view. Work started through [`ViewScope::run`]
//! resolves to `None` once the view is torn down, so a late completion never
//! reaches view state.

use std::future::Future;

use tokio_util::sync::{CancellationToken, DropGuard};

/// Cancellation handle for one mounted view.
#[derive(Debug, Clone, Default)]
pub struct ViewScope {
    token: CancellationToken,
}

impl ViewScope {
    pub fn new() -> Self {
        Self::default()
    }

    /// A scope cancelled together with this one, or on its own.
    pub fn child(&self) -> Self {
        Self {
            token: self.token.child_token(),
        }
    }

    pub fn cancel(&self) {
        self.token.cancel();
    }

    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }

    /// Guard that cancels the scope when dropped.
    pub fn drop_guard(&self) -> DropGuard {
        self.token.clone().drop_guard()
    }

    /// Drive `fut` unless the scope is cancelled first.
    pub async fn run<F>(&self, fut: F) -> Option<F::Output>
    where
        F: Future,
    {
        if self.token.is_cancelled() {
            return None;
        }
        tokio::select! {
            biased;
            _ = self.token.cancelled() => None,
            value = fut => Some(value),
        }
    }
}
