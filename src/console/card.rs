//! console::card
//!
//! One entity row with inline edit and a confirmed delete.
//!
//! # Modes
//!
//! ```text
//! Display --begin_edit--> Editing(form) --submit_edit ok / cancel_edit--> Display
//! Display --request_delete--> ConfirmingDelete --confirm_delete ok / cancel_delete--> Display
//! ```
//!
//! `confirm_delete` is the only path that sends a remove mutation. After a
//! successful edit or delete the card asks its parent list to refetch.

use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;
use tracing::{debug, info};

use super::department_form::DepartmentForm;
use super::errors::{CardError, FormError};
use super::list::{LoadOutcome, Refetch};
use super::scope::ViewScope;
use super::sub_department_form::SubDepartmentForm;
use crate::api::operations::{self, RemoveDepartmentData, RemoveSubDepartmentData};
use crate::api::{ApiError, ClientFacade, GraphQlClient, QueryKey};
use crate::core::types::{Department, EntityId, SubDepartment};

/// What a card needs from the view it lives in.
#[derive(Clone)]
pub struct CardContext {
    pub facade: Arc<ClientFacade>,
    pub parent: Arc<dyn Refetch>,
    pub scope: ViewScope,
}

impl fmt::Debug for CardContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CardContext")
            .field("facade", &self.facade)
            .field("scope", &self.scope)
            .finish_non_exhaustive()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum CardMode<F> {
    Display,
    Editing(F),
    ConfirmingDelete,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActionState {
    Enabled,
    Disabled,
}

/// Entity-specific behaviour of a card.
#[async_trait]
pub trait CardKind: fmt::Debug + Send + Sync + 'static {
    type Item: Clone + fmt::Debug + Send + Sync + 'static;
    type Form: Clone + fmt::Debug + Send + Sync + 'static;

    /// Singular noun, as shown to users.
    const NOUN: &'static str;

    fn id(item: &Self::Item) -> EntityId;

    fn name(item: &Self::Item) -> &str;

    fn edit_form(item: &Self::Item) -> Self::Form;

    /// Extra line for the delete confirmation.
    fn delete_warning(_item: &Self::Item) -> Option<String> {
        None
    }

    async fn submit(
        form: &mut Self::Form,
        client: &GraphQlClient,
        target: &QueryKey,
    ) -> Result<Self::Item, FormError>;

    async fn remove(client: &GraphQlClient, id: EntityId) -> Result<bool, ApiError>;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct DepartmentKind;

#[async_trait]
impl CardKind for DepartmentKind {
    type Item = Department;
    type Form = DepartmentForm;

    const NOUN: &'static str = "department";

    fn id(item: &Department) -> EntityId {
        item.id
    }

    fn name(item: &Department) -> &str {
        &item.name
    }

    fn edit_form(item: &Department) -> DepartmentForm {
        DepartmentForm::update(item.clone())
    }

    fn delete_warning(item: &Department) -> Option<String> {
        match item.sub_departments.len() {
            0 => None,
            n => Some(format!("This will also delete {n} sub-departments.")),
        }
    }

    async fn submit(
        form: &mut DepartmentForm,
        client: &GraphQlClient,
        target: &QueryKey,
    ) -> Result<Department, FormError> {
        form.submit(client, target).await
    }

    async fn remove(client: &GraphQlClient, id: EntityId) -> Result<bool, ApiError> {
        let data = client
            .mutate::<RemoveDepartmentData>(&operations::remove_department(id))
            .await?
            .into_data()?;
        Ok(data.remove_department)
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SubDepartmentKind;

#[async_trait]
impl CardKind for SubDepartmentKind {
    type Item = SubDepartment;
    type Form = SubDepartmentForm;

    const NOUN: &'static str = "sub-department";

    fn id(item: &SubDepartment) -> EntityId {
        item.id
    }

    fn name(item: &SubDepartment) -> &str {
        &item.name
    }

    fn edit_form(item: &SubDepartment) -> SubDepartmentForm {
        SubDepartmentForm::update(item.clone())
    }

    async fn submit(
        form: &mut SubDepartmentForm,
        client: &GraphQlClient,
        target: &QueryKey,
    ) -> Result<SubDepartment, FormError> {
        form.submit(client, target).await
    }

    async fn remove(client: &GraphQlClient, id: EntityId) -> Result<bool, ApiError> {
        let data = client
            .mutate::<RemoveSubDepartmentData>(&operations::remove_sub_department(id))
            .await?
            .into_data()?;
        Ok(data.remove_sub_department)
    }
}

#[derive(Debug)]
struct CardState<K: CardKind> {
    item: K::Item,
    mode: CardMode<K::Form>,
    saving: bool,
    deleting: bool,
    error: Option<CardError>,
}

struct CardShared<K: CardKind> {
    ctx: CardContext,
    state: Mutex<CardState<K>>,
}

/// Handle to one card. Clones share state.
pub struct Card<K: CardKind> {
    shared: Arc<CardShared<K>>,
}

pub type DepartmentCard = Card<DepartmentKind>;
pub type SubDepartmentCard = Card<SubDepartmentKind>;

impl<K: CardKind> Clone for Card<K> {
    fn clone(&self) -> Self {
        Self {
            shared: Arc::clone(&self.shared),
        }
    }
}

impl<K: CardKind> fmt::Debug for Card<K> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Card")
            .field("kind", &K::NOUN)
            .field("state", &*self.lock())
            .finish()
    }
}

impl<K: CardKind> Card<K> {
    pub fn new(item: K::Item, ctx: CardContext) -> Self {
        Self {
            shared: Arc::new(CardShared {
                ctx,
                state: Mutex::new(CardState {
                    item,
                    mode: CardMode::Display,
                    saving: false,
                    deleting: false,
                    error: None,
                }),
            }),
        }
    }

    fn lock(&self) -> MutexGuard<'_, CardState<K>> {
        self.shared.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    pub fn item(&self) -> K::Item {
        self.lock().item.clone()
    }

    pub fn mode(&self) -> CardMode<K::Form> {
        self.lock().mode.clone()
    }

    pub fn error(&self) -> Option<CardError> {
        self.lock().error.clone()
    }

    /// Swap in an update form pre-filled from the item.
    pub fn begin_edit(&self) -> bool {
        let mut state = self.lock();
        if !matches!(state.mode, CardMode::Display) {
            return false;
        }
        let form = K::edit_form(&state.item);
        state.mode = CardMode::Editing(form);
        state.error = None;
        true
    }

    /// Change the edit form in place. `None` when not editing.
    pub fn edit<R>(&self, f: impl FnOnce(&mut K::Form) -> R) -> Option<R> {
        match &mut self.lock().mode {
            CardMode::Editing(form) => Some(f(form)),
            _ => None,
        }
    }

    pub fn cancel_edit(&self) {
        let mut state = self.lock();
        if matches!(state.mode, CardMode::Editing(_)) {
            state.mode = CardMode::Display;
            state.error = None;
        }
    }

    /// Submit the edit form. `target` is the parent listing's active key.
    pub async fn submit_edit(&self, target: &QueryKey) -> Result<K::Item, CardError> {
        let mut form = {
            let mut state = self.lock();
            if state.saving {
                return Err(FormError::InFlight.into());
            }
            let CardMode::Editing(form) = &state.mode else {
                return Err(CardError::NotEditing);
            };
            let form = form.clone();
            state.saving = true;
            form
        };

        let client = self.shared.ctx.facade.client();
        let Some(outcome) = self
            .shared
            .ctx
            .scope
            .run(K::submit(&mut form, &client, target))
            .await
        else {
            self.lock().saving = false;
            return Err(CardError::Cancelled);
        };

        {
            let mut state = self.lock();
            state.saving = false;
            match &outcome {
                Ok(item) => {
                    state.item = item.clone();
                    state.mode = CardMode::Display;
                    state.error = None;
                }
                Err(err) => {
                    if matches!(state.mode, CardMode::Editing(_)) {
                        state.mode = CardMode::Editing(form);
                    }
                    state.error = Some(CardError::Form(err.clone()));
                }
            }
        }

        let item = outcome?;
        self.refetch_parent().await;
        Ok(item)
    }

    /// Open the delete confirmation.
    pub fn request_delete(&self) -> bool {
        let mut state = self.lock();
        if !matches!(state.mode, CardMode::Display) {
            return false;
        }
        state.mode = CardMode::ConfirmingDelete;
        state.error = None;
        true
    }

    pub fn confirmation_message(&self) -> String {
        let state = self.lock();
        let question = format!(
            "Are you sure you want to delete the {} \"{}\"?",
            K::NOUN,
            K::name(&state.item)
        );
        match K::delete_warning(&state.item) {
            Some(warning) => format!("{question}\nWarning: {warning}"),
            None => question,
        }
    }

    /// Close the confirmation without sending anything. Refused while the
    /// delete is in flight.
    pub fn cancel_delete(&self) -> bool {
        let mut state = self.lock();
        if state.deleting || !matches!(state.mode, CardMode::ConfirmingDelete) {
            return false;
        }
        state.mode = CardMode::Display;
        state.error = None;
        true
    }

    /// An edit submission is in flight.
    pub fn is_saving(&self) -> bool {
        self.lock().saving
    }

    pub fn delete_action(&self) -> ActionState {
        if self.lock().deleting {
            ActionState::Disabled
        } else {
            ActionState::Enabled
        }
    }

    pub fn delete_label(&self) -> &'static str {
        if self.lock().deleting {
            "Deleting..."
        } else {
            "Delete"
        }
    }

    /// Send the remove mutation.
    pub async fn confirm_delete(&self) -> Result<(), CardError> {
        let id = {
            let mut state = self.lock();
            if state.deleting {
                return Err(CardError::DeleteInFlight);
            }
            if !matches!(state.mode, CardMode::ConfirmingDelete) {
                return Err(CardError::NotConfirming);
            }
            state.deleting = true;
            state.error = None;
            K::id(&state.item)
        };

        let client = self.shared.ctx.facade.client();
        let Some(outcome) = self.shared.ctx.scope.run(K::remove(&client, id)).await else {
            self.lock().deleting = false;
            return Err(CardError::Cancelled);
        };

        let result = match outcome {
            Ok(true) => Ok(()),
            Ok(false) => Err(CardError::NotRemoved(K::NOUN)),
            Err(err) => Err(CardError::Api(err)),
        };
        {
            let mut state = self.lock();
            state.deleting = false;
            match &result {
                Ok(()) => state.mode = CardMode::Display,
                Err(err) => state.error = Some(err.clone()),
            }
        }

        result?;
        info!(id = %id, kind = K::NOUN, "deleted");
        self.refetch_parent().await;
        Ok(())
    }

    async fn refetch_parent(&self) {
        let parent = Arc::clone(&self.shared.ctx.parent);
        if let Some(LoadOutcome::Failed(err)) = self.shared.ctx.scope.run(parent.refetch()).await {
            debug!(kind = K::NOUN, error = %err, "refetch after change failed");
        }
    }
}
