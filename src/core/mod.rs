//! core
//!
//! Core domain types and configuration for orgdesk.
//!
//! # Modules
//!
//! - [`types`] - Strong types: EntityId, EntityName, Department, Listing, etc.
//! - [`config`] - Configuration schema and loading
//!
//! # Design Principles
//!
//! - Strong typing prevents invalid states at compile time
//! - Schemas are strict and self-describing

pub mod config;
pub mod types;
