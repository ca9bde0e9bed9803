//! console - views over the organisation data
//!
//! # Architecture
//!
//! - [`navigation`] - current route, pushed by the session store and guard
//! - [`list`] - paginated, searchable department and sub-department lists
//! - [`department_form`], [`sub_department_form`] - create/update forms that
//!   patch the cached listing on success
//! - [`card`] - one entity with inline edit and a confirmed delete
//! - [`login`] - sign-in form
//! - [`scope`] - cancellation scope owned by each mounted view
//!
//! Views hold no entity data of their own: listings are read from the client
//! cache under the key the view is showing.

pub mod card;
pub mod department_form;
mod errors;
pub mod form;
pub mod list;
pub mod login;
pub mod navigation;
pub mod pagination;
pub mod scope;
pub mod sub_department_form;

#[cfg(test)]
pub(crate) mod fixtures;

pub use card::{
    ActionState, Card, CardContext, CardKind, CardMode, DepartmentCard, DepartmentKind,
    SubDepartmentCard, SubDepartmentKind,
};
pub use department_form::DepartmentForm;
pub use errors::{CardError, FormError};
pub use form::FormMode;
pub use list::{
    DepartmentList, DepartmentSource, ListSource, ListView, LoadOutcome, Refetch,
    RequestTracker, SubDepartmentList, SubDepartmentSource, Ticket,
};
pub use login::LoginForm;
pub use navigation::{Navigator, Route};
pub use pagination::Pagination;
pub use scope::ViewScope;
pub use sub_department_form::SubDepartmentForm;
