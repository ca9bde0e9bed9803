//! orgdesk - a terminal console for departments and sub-departments
//!
//! orgdesk talks to an organisation GraphQL API. It signs in, keeps the
//! session across runs, and lists, creates, renames and deletes departments
//! and their sub-departments.
//!
//! # Architecture
//!
//! The codebase follows a layered architecture:
//!
//! - [`cli`] - Command-line interface layer (parses args, drives console views)
//! - [`console`] - Views: paginated lists, forms, cards, login, navigation
//! - [`api`] - GraphQL transport, client, query cache and operations
//! - [`auth`] - Session store and route guard
//! - [`core`] - Domain types and configuration
//! - [`secrets`] - Secret storage for the session
//! - [`ui`] - User interaction utilities
//!
//! # Invariants
//!
//! 1. Protected views render only for an authenticated session with a credential
//! 2. A rejected credential ends the session and routes to login
//! 3. Cached listings change only through a fetch or an explicit patch
//! 4. A view never applies a result after it was unmounted or superseded

pub mod api;
pub mod auth;
pub mod cli;
pub mod console;
pub mod core;
pub mod secrets;
pub mod ui;
