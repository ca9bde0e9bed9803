//! api - GraphQL client facade
//!
//! # Architecture
//!
//! - [`Transport`] - async seam that moves one request to the server
//!   ([`HttpTransport`] in production, [`mock::MockTransport`] in tests)
//! - [`GraphQlClient`] - fetch policies, the query cache, error policy "all"
//!   and session-loss detection for one credential
//! - [`ClientFacade`] - the shared entry point; rebuilds the client only when
//!   the session credential changes
//! - [`operations`] - documents and typed builders for every operation
//!
//! # Example
//!
//! ```ignore
//! use orgdesk::api::{operations, ClientFacade, FetchPolicy, HttpTransport};
//! use orgdesk::api::operations::DepartmentsData;
//!
//! let facade = ClientFacade::new(session, Arc::new(HttpTransport::new(config.endpoint())?));
//! let page = PageRequest::first(10)?;
//! let result = facade
//!     .client()
//!     .query::<DepartmentsData>(&operations::departments(page), FetchPolicy::NetworkOnly)
//!     .await?;
//! ```

pub mod cache;
pub mod client;
mod errors;
pub mod facade;
pub mod mock;
pub mod operations;
pub mod transport;

pub use cache::{QueryCache, QueryKey, WriteTicket};
pub use client::{FetchPolicy, GraphQlClient, QueryResult, QueryWatch, ResultSource};
pub use errors::{ApiError, AuthClassifier, ErrorExtensions, GraphQlError, UNAUTHENTICATED};
pub use facade::ClientFacade;
pub use transport::{GraphQlRequest, GraphQlResponse, HttpTransport, Transport};
