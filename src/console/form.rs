//! console::form - pieces shared by the entity forms

use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, warn};

use crate::api::{GraphQlClient, QueryKey};

/// Whether a form makes a new entity or edits `T`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FormMode<T> {
    Create,
    Update(T),
}

impl<T> FormMode<T> {
    pub fn is_create(&self) -> bool {
        matches!(self, Self::Create)
    }

    pub fn existing(&self) -> Option<&T> {
        match self {
            Self::Create => None,
            Self::Update(existing) => Some(existing),
        }
    }
}

/// Label of the submit button.
pub fn submit_label<T>(mode: &FormMode<T>, submitting: bool) -> &'static str {
    match (submitting, mode) {
        (true, _) => "Saving...",
        (false, FormMode::Create) => "Create",
        (false, FormMode::Update(_)) => "Update",
    }
}

/// Apply a successful mutation to the listing under `target`.
///
/// The mutation already succeeded, so a patch that cannot apply is logged and
/// the next refetch repairs the view.
pub(crate) fn patch_listing<T, F>(client: &GraphQlClient, target: &QueryKey, f: F)
where
    T: DeserializeOwned + Serialize,
    F: FnOnce(&mut T),
{
    match client.cache().patch::<T, _>(target, f) {
        Ok(true) => debug!(key = %target, "patched cached listing"),
        Ok(false) => debug!(key = %target, "listing not cached, nothing to patch"),
        Err(err) => warn!(key = %target, error = %err, "could not patch cached listing"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn labels_follow_mode_and_progress() {
        assert_eq!(submit_label::<()>(&FormMode::Create, false), "Create");
        assert_eq!(submit_label(&FormMode::Update(1), false), "Update");
        assert_eq!(submit_label(&FormMode::Update(1), true), "Saving...");
    }

    #[test]
    fn existing_only_in_update_mode() {
        assert_eq!(FormMode::<u8>::Create.existing(), None);
        assert_eq!(FormMode::Update(3).existing(), Some(&3));
        assert!(FormMode::<u8>::Create.is_create());
    }
}
