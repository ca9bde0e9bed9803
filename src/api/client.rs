//! api::client
//!
//! GraphQL client bound to one credential and one cache.
//!
//! # Fetch policies
//!
//! - `CacheFirst`: serve the cache when it has the key, else fetch.
//! - `CacheAndNetwork`: what views use on navigation. [`GraphQlClient::watch`]
//!   serves the cached value immediately and refreshes from the network. A
//!   one-shot [`GraphQlClient::query`] with this policy returns the network
//!   result, having refreshed the cache.
//! - `NetworkOnly`: always fetch. Used for explicit refetches.
//!
//! # Error policy
//!
//! Partial data and errors travel together in [`QueryResult`]. Callers that
//! want a strict result call [`QueryResult::into_data`].
//!
//! A response classified as session loss invokes the `on_unauthenticated`
//! hook before it is returned. Credential exchanges (login) are exempt: a
//! rejected login leaves the current session alone.

use std::fmt;
use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{debug, warn};

use super::cache::{QueryCache, QueryKey};
use super::errors::{ApiError, AuthClassifier, GraphQlError};
use super::transport::{GraphQlRequest, GraphQlResponse, Transport};
use crate::auth::Credential;

/// How a query consults the cache.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FetchPolicy {
    CacheFirst,
    #[default]
    CacheAndNetwork,
    NetworkOnly,
}

/// Where a result came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResultSource {
    Cache,
    Network,
}

/// Outcome of an operation under the "all" error policy.
#[derive(Debug, Clone, PartialEq)]
pub struct QueryResult<T> {
    pub data: Option<T>,
    pub errors: Vec<GraphQlError>,
    pub source: ResultSource,
}

impl<T> QueryResult<T> {
    fn cached(data: T) -> Self {
        Self {
            data: Some(data),
            errors: Vec::new(),
            source: ResultSource::Cache,
        }
    }

    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }

    /// Data without errors.
    pub fn is_complete(&self) -> bool {
        self.data.is_some() && self.errors.is_empty()
    }

    /// Strict view: any error fails, missing data fails.
    pub fn into_data(self) -> Result<T, ApiError> {
        if !self.errors.is_empty() {
            return Err(ApiError::GraphQl(self.errors));
        }
        self.data
            .ok_or_else(|| ApiError::MissingData("operation".to_string()))
    }
}

type Hook = Arc<dyn Fn() + Send + Sync>;

/// GraphQL client.
///
/// Cheap to share behind an `Arc`. The cache lives as long as the client.
pub struct GraphQlClient {
    transport: Arc<dyn Transport>,
    credential: Option<Credential>,
    cache: QueryCache,
    classifier: AuthClassifier,
    on_unauthenticated: Option<Hook>,
}

impl fmt::Debug for GraphQlClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GraphQlClient")
            .field("transport", &self.transport.name())
            .field("has_credential", &self.credential.is_some())
            .field("cached_queries", &self.cache.len())
            .field("classifier", &self.classifier)
            .finish()
    }
}

impl GraphQlClient {
    pub fn new(transport: Arc<dyn Transport>, credential: Option<Credential>) -> Self {
        Self {
            transport,
            credential,
            cache: QueryCache::new(),
            classifier: AuthClassifier::default(),
            on_unauthenticated: None,
        }
    }

    pub fn with_classifier(mut self, classifier: AuthClassifier) -> Self {
        self.classifier = classifier;
        self
    }

    /// Called whenever a response is classified as session loss.
    pub fn on_unauthenticated(mut self, hook: impl Fn() + Send + Sync + 'static) -> Self {
        self.on_unauthenticated = Some(Arc::new(hook));
        self
    }

    pub fn credential(&self) -> Option<&Credential> {
        self.credential.as_ref()
    }

    pub fn cache(&self) -> &QueryCache {
        &self.cache
    }

    async fn send(&self, request: &GraphQlRequest) -> Result<GraphQlResponse, ApiError> {
        debug!(
            operation = %request.operation_name,
            transport = self.transport.name(),
            authenticated = self.credential.is_some(),
            "graphql request"
        );
        let result = self
            .transport
            .execute(request, self.credential.as_ref())
            .await;

        let lost = !request.exchanges_credential
            && match &result {
                Ok(response) => response
                    .errors
                    .iter()
                    .any(|e| self.classifier.is_session_error(e)),
                Err(err) => self.classifier.is_session_loss(err),
            };
        if lost {
            warn!(operation = %request.operation_name, "server rejected the session");
            if let Some(hook) = &self.on_unauthenticated {
                hook();
            }
        }
        result
    }

    /// Decode a response, keeping errors alongside whatever data decoded.
    fn decode<T: DeserializeOwned>(
        response: GraphQlResponse,
    ) -> Result<(Option<T>, Option<Value>, Vec<GraphQlError>), ApiError> {
        let GraphQlResponse { data, errors } = response;
        let Some(raw) = data.filter(|d| !d.is_null()) else {
            return Ok((None, None, errors));
        };
        match serde_json::from_value::<T>(raw.clone()) {
            Ok(typed) => Ok((Some(typed), Some(raw), errors)),
            // Partial data with nulled fields; the errors explain why.
            Err(_) if !errors.is_empty() => Ok((None, None, errors)),
            Err(e) => Err(ApiError::Decode(e.to_string())),
        }
    }

    async fn fetch<T: DeserializeOwned>(
        &self,
        request: &GraphQlRequest,
        key: QueryKey,
    ) -> Result<QueryResult<T>, ApiError> {
        // Reserved before sending so a slower, older response cannot land
        // on top of a newer one.
        let ticket = self.cache.reserve(key);
        let response = self.send(request).await?;
        let (data, raw, errors) = Self::decode::<T>(response)?;
        if let Some(raw) = raw {
            self.cache.commit(ticket, raw);
        }
        Ok(QueryResult {
            data,
            errors,
            source: ResultSource::Network,
        })
    }

    /// Run a query under `policy`.
    pub async fn query<T: DeserializeOwned>(
        &self,
        request: &GraphQlRequest,
        policy: FetchPolicy,
    ) -> Result<QueryResult<T>, ApiError> {
        let key = QueryKey::of(request);
        if policy == FetchPolicy::CacheFirst {
            if let Some(data) = self.cache.read_typed::<T>(&key)? {
                debug!(key = %key, "cache hit");
                return Ok(QueryResult::cached(data));
            }
        }
        self.fetch(request, key).await
    }

    /// Cache-and-network: cached data now, network data on `refresh`.
    pub fn watch<T: DeserializeOwned>(&self, request: GraphQlRequest) -> QueryWatch<'_, T> {
        let key = QueryKey::of(&request);
        // An entry that no longer decodes is as good as absent.
        let initial = self.cache.read_typed::<T>(&key).ok().flatten();
        QueryWatch {
            client: self,
            request,
            key,
            initial,
        }
    }

    /// Run a mutation. Mutations never write the cache themselves.
    pub async fn mutate<T: DeserializeOwned>(
        &self,
        request: &GraphQlRequest,
    ) -> Result<QueryResult<T>, ApiError> {
        let response = self.send(request).await?;
        let (data, _, errors) = Self::decode::<T>(response)?;
        Ok(QueryResult {
            data,
            errors,
            source: ResultSource::Network,
        })
    }
}

/// A cache-and-network query in progress.
#[derive(Debug)]
pub struct QueryWatch<'a, T> {
    client: &'a GraphQlClient,
    request: GraphQlRequest,
    key: QueryKey,
    /// Cached data at the time of the call, if any.
    pub initial: Option<T>,
}

impl<T: DeserializeOwned> QueryWatch<'_, T> {
    pub fn key(&self) -> &QueryKey {
        &self.key
    }

    /// Fetch from the network and update the cache.
    pub async fn refresh(&self) -> Result<QueryResult<T>, ApiError> {
        self.client.fetch(&self.request, self.key.clone()).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::errors::UNAUTHENTICATED;
    use async_trait::async_trait;
    use serde::Deserialize;
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    #[derive(Debug, Deserialize, PartialEq)]
    struct Ping {
        ping: u32,
    }

    /// Replays canned responses and counts calls.
    struct Scripted {
        responses: Mutex<Vec<Result<GraphQlResponse, ApiError>>>,
        calls: AtomicUsize,
    }

    impl Scripted {
        fn new(responses: Vec<Result<GraphQlResponse, ApiError>>) -> Arc<Self> {
            Arc::new(Self {
                responses: Mutex::new(responses),
                calls: AtomicUsize::new(0),
            })
        }
    }

    #[async_trait]
    impl Transport for Scripted {
        fn name(&self) -> &'static str {
            "scripted"
        }

        async fn execute(
            &self,
            _request: &GraphQlRequest,
            _credential: Option<&Credential>,
        ) -> Result<GraphQlResponse, ApiError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.responses.lock().unwrap().remove(0)
        }
    }

    fn request() -> GraphQlRequest {
        GraphQlRequest::new("Ping", "query Ping { ping }", json!({}))
    }

    #[tokio::test]
    async fn cache_first_serves_cache_without_network() {
        let transport = Scripted::new(vec![Ok(GraphQlResponse::data(json!({"ping": 1})))]);
        let client = GraphQlClient::new(transport.clone(), None);

        let first = client.query::<Ping>(&request(), FetchPolicy::CacheFirst).await.unwrap();
        assert_eq!(first.source, ResultSource::Network);
        let second = client.query::<Ping>(&request(), FetchPolicy::CacheFirst).await.unwrap();
        assert_eq!(second.source, ResultSource::Cache);
        assert_eq!(second.data, Some(Ping { ping: 1 }));
        assert_eq!(transport.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn watch_serves_stale_then_refreshes() {
        let transport = Scripted::new(vec![
            Ok(GraphQlResponse::data(json!({"ping": 1}))),
            Ok(GraphQlResponse::data(json!({"ping": 2}))),
        ]);
        let client = GraphQlClient::new(transport, None);

        let cold = client.watch::<Ping>(request());
        assert!(cold.initial.is_none());
        cold.refresh().await.unwrap();

        let warm = client.watch::<Ping>(request());
        assert_eq!(warm.initial, Some(Ping { ping: 1 }));
        let fresh = warm.refresh().await.unwrap();
        assert_eq!(fresh.data, Some(Ping { ping: 2 }));
        assert_eq!(
            client.cache().read_typed::<Ping>(warm.key()).unwrap(),
            Some(Ping { ping: 2 })
        );
    }

    #[tokio::test]
    async fn partial_data_and_errors_are_both_kept() {
        let transport = Scripted::new(vec![Ok(GraphQlResponse {
            data: Some(json!({"ping": 3})),
            errors: vec![GraphQlError::new("slow resolver")],
        })]);
        let client = GraphQlClient::new(transport, None);

        let result = client
            .query::<Ping>(&request(), FetchPolicy::NetworkOnly)
            .await
            .unwrap();
        assert_eq!(result.data, Some(Ping { ping: 3 }));
        assert!(result.has_errors());
        assert!(!result.is_complete());
        assert!(result.into_data().is_err());
    }

    #[tokio::test]
    async fn null_data_with_errors_is_not_cached() {
        let transport = Scripted::new(vec![Ok(GraphQlResponse {
            data: Some(Value::Null),
            errors: vec![GraphQlError::new("boom")],
        })]);
        let client = GraphQlClient::new(transport, None);
        let result = client
            .query::<Ping>(&request(), FetchPolicy::NetworkOnly)
            .await
            .unwrap();
        assert!(result.data.is_none());
        assert!(client.cache().is_empty());
    }

    #[tokio::test]
    async fn unauthenticated_code_fires_hook() {
        let fired = Arc::new(AtomicUsize::new(0));
        let counter = fired.clone();
        let transport = Scripted::new(vec![Ok(GraphQlResponse::errors(vec![
            GraphQlError::with_code("nope", UNAUTHENTICATED),
        ]))]);
        let client = GraphQlClient::new(transport, Some(Credential::new("tok")))
            .on_unauthenticated(move || {
                counter.fetch_add(1, Ordering::SeqCst);
            });

        let result = client.query::<Ping>(&request(), FetchPolicy::NetworkOnly).await;
        assert!(result.unwrap().has_errors());
        assert_eq!(fired.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn http_401_fires_hook_and_returns_error() {
        let fired = Arc::new(AtomicUsize::new(0));
        let counter = fired.clone();
        let transport = Scripted::new(vec![Err(ApiError::Http {
            status: 401,
            message: "Unauthorized".into(),
        })]);
        let client = GraphQlClient::new(transport, Some(Credential::new("tok")))
            .on_unauthenticated(move || {
                counter.fetch_add(1, Ordering::SeqCst);
            });

        let err = client
            .mutate::<Ping>(&request())
            .await
            .unwrap_err();
        assert!(err.is_unauthenticated());
        assert_eq!(fired.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn ordinary_errors_do_not_fire_hook() {
        let fired = Arc::new(AtomicUsize::new(0));
        let counter = fired.clone();
        let transport = Scripted::new(vec![Ok(GraphQlResponse::errors(vec![
            GraphQlError::with_code("Unauthorized field access", "FORBIDDEN"),
        ]))]);
        let client = GraphQlClient::new(transport, None).on_unauthenticated(move || {
            counter.fetch_add(1, Ordering::SeqCst);
        });

        client.mutate::<Ping>(&request()).await.unwrap();
        assert_eq!(fired.load(Ordering::SeqCst), 0);
    }
}
