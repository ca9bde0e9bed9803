//! console::list
//!
//! Paginated, searchable entity lists.
//!
//! # Design
//!
//! A [`ListView`] owns the view state (page, search term, loading, error) and
//! nothing else. The listing itself is always read back from the client cache
//! under [`ListView::active_key`], so a cache patch made by a form shows up
//! without another request.
//!
//! Every load takes a [`Ticket`] from the view's [`RequestTracker`]. Only the
//! latest ticket may touch `loading` and `error`; an older completion still
//! lands in the cache under its own key. Loads run inside the view's
//! [`ViewScope`], so nothing completes into a view after [`ListView::unmount`].
//!
//! Search is client-side over the loaded page: the server has no name filter.

use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Serialize;
use tokio_util::sync::DropGuard;
use tracing::debug;

use super::card::CardContext;
use super::pagination::Pagination;
use super::scope::ViewScope;
use crate::api::operations::{self, DepartmentsData, SubDepartmentsData};
use crate::api::{ApiError, ClientFacade, FetchPolicy, GraphQlError, GraphQlRequest, QueryKey};
use crate::core::types::{Department, Listing, PageRequest, SubDepartment, TypeError};

/// The query behind a list.
pub trait ListSource: Send + Sync + 'static {
    type Item: Clone + Send + Sync + 'static;
    type Data: DeserializeOwned + Serialize + Send + Sync + 'static;

    /// Plural noun, as shown to users.
    fn name(&self) -> &'static str;

    fn request(&self, page: PageRequest) -> GraphQlRequest;

    fn listing(&self, data: Self::Data) -> Listing<Self::Item>;

    /// `needle` is already lowercased and non-empty.
    fn matches(&self, item: &Self::Item, needle: &str) -> bool;

    /// Whether the server pages this query.
    fn paginated(&self) -> bool;
}

/// Server-paginated departments.
#[derive(Debug, Clone, Copy, Default)]
pub struct DepartmentSource;

impl ListSource for DepartmentSource {
    type Item = Department;
    type Data = DepartmentsData;

    fn name(&self) -> &'static str {
        "departments"
    }

    fn request(&self, page: PageRequest) -> GraphQlRequest {
        operations::departments(page)
    }

    fn listing(&self, data: DepartmentsData) -> Listing<Department> {
        data.departments
    }

    fn matches(&self, item: &Department, needle: &str) -> bool {
        item.name.to_lowercase().contains(needle)
    }

    fn paginated(&self) -> bool {
        true
    }
}

/// All sub-departments in one array.
#[derive(Debug, Clone, Copy, Default)]
pub struct SubDepartmentSource;

impl ListSource for SubDepartmentSource {
    type Item = SubDepartment;
    type Data = SubDepartmentsData;

    fn name(&self) -> &'static str {
        "sub-departments"
    }

    fn request(&self, _page: PageRequest) -> GraphQlRequest {
        operations::sub_departments()
    }

    fn listing(&self, data: SubDepartmentsData) -> Listing<SubDepartment> {
        Listing::single_page(data.sub_departments)
    }

    fn matches(&self, item: &SubDepartment, needle: &str) -> bool {
        item.name.to_lowercase().contains(needle)
            || item.department.name.to_lowercase().contains(needle)
    }

    fn paginated(&self) -> bool {
        false
    }
}

/// Identifies one load.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ticket {
    seq: u64,
    key: QueryKey,
}

impl Ticket {
    pub fn key(&self) -> &QueryKey {
        &self.key
    }
}

/// Latest-request bookkeeping for a view.
#[derive(Debug, Default)]
pub struct RequestTracker {
    seq: u64,
    active: Option<QueryKey>,
}

impl RequestTracker {
    pub fn issue(&mut self, key: QueryKey) -> Ticket {
        self.seq += 1;
        self.active = Some(key.clone());
        Ticket { seq: self.seq, key }
    }

    /// True only for the most recently issued ticket.
    pub fn is_current(&self, ticket: &Ticket) -> bool {
        ticket.seq == self.seq && self.active.as_ref() == Some(&ticket.key)
    }

    pub fn active(&self) -> Option<&QueryKey> {
        self.active.as_ref()
    }
}

/// What a load did to the view.
#[derive(Debug, Clone, PartialEq)]
pub enum LoadOutcome {
    Loaded,
    Failed(ApiError),
    /// A newer load owns the view; this one only updated the cache.
    Superseded,
    /// The view was torn down first.
    Cancelled,
}

impl LoadOutcome {
    pub fn is_loaded(&self) -> bool {
        matches!(self, Self::Loaded)
    }
}

/// Something that can reload itself after a change it did not make.
#[async_trait]
pub trait Refetch: Send + Sync {
    async fn refetch(&self) -> LoadOutcome;
}

#[derive(Debug)]
struct ListState {
    request: PageRequest,
    search_term: String,
    loading: bool,
    error: Option<ApiError>,
    partial_errors: Vec<GraphQlError>,
    tracker: RequestTracker,
}

struct Shared<S: ListSource> {
    source: S,
    facade: Arc<ClientFacade>,
    state: Mutex<ListState>,
    scope: ViewScope,
    _cancel_on_drop: DropGuard,
}

/// Handle to a list view. Clones share state.
pub struct ListView<S: ListSource> {
    shared: Arc<Shared<S>>,
}

pub type DepartmentList = ListView<DepartmentSource>;
pub type SubDepartmentList = ListView<SubDepartmentSource>;

impl<S: ListSource> Clone for ListView<S> {
    fn clone(&self) -> Self {
        Self {
            shared: Arc::clone(&self.shared),
        }
    }
}

impl<S: ListSource> fmt::Debug for ListView<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ListView")
            .field("source", &self.shared.source.name())
            .field("state", &*self.lock())
            .field("cancelled", &self.shared.scope.is_cancelled())
            .finish()
    }
}

impl DepartmentList {
    pub fn departments(facade: Arc<ClientFacade>, page_size: u32) -> Result<Self, TypeError> {
        Self::new(DepartmentSource, facade, page_size)
    }
}

impl SubDepartmentList {
    pub fn sub_departments(facade: Arc<ClientFacade>) -> Result<Self, TypeError> {
        // The server returns every sub-department; the limit is never sent.
        Self::new(SubDepartmentSource, facade, 1)
    }
}

impl<S: ListSource> ListView<S> {
    /// Create an unmounted view on page 1.
    ///
    /// # Errors
    ///
    /// Returns `TypeError::InvalidPage` if `page_size` is zero.
    pub fn new(source: S, facade: Arc<ClientFacade>, page_size: u32) -> Result<Self, TypeError> {
        let scope = ViewScope::new();
        Ok(Self {
            shared: Arc::new(Shared {
                source,
                facade,
                state: Mutex::new(ListState {
                    request: PageRequest::first(page_size)?,
                    search_term: String::new(),
                    loading: false,
                    error: None,
                    partial_errors: Vec::new(),
                    tracker: RequestTracker::default(),
                }),
                _cancel_on_drop: scope.drop_guard(),
                scope,
            }),
        })
    }

    fn lock(&self) -> MutexGuard<'_, ListState> {
        self.shared.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    pub fn source(&self) -> &S {
        &self.shared.source
    }

    pub fn facade(&self) -> &Arc<ClientFacade> {
        &self.shared.facade
    }

    pub fn scope(&self) -> &ViewScope {
        &self.shared.scope
    }

    /// First load on entering the view: cached data now, fresh data after.
    pub async fn mount(&self) -> LoadOutcome {
        self.load(FetchPolicy::CacheAndNetwork).await
    }

    /// Tear the view down. In-flight loads finish without touching it.
    pub fn unmount(&self) {
        debug!(view = self.shared.source.name(), "unmount");
        self.shared.scope.cancel();
    }

    pub fn is_mounted(&self) -> bool {
        !self.shared.scope.is_cancelled()
    }

    /// Load the active page under `policy`.
    pub async fn load(&self, policy: FetchPolicy) -> LoadOutcome {
        let source = &self.shared.source;
        let (request, ticket) = {
            let mut state = self.lock();
            let request = source.request(state.request);
            let ticket = state.tracker.issue(QueryKey::of(&request));
            state.loading = true;
            (request, ticket)
        };
        debug!(view = source.name(), key = %ticket.key, ?policy, "load");

        let client = self.shared.facade.client();
        let result = if policy == FetchPolicy::CacheAndNetwork {
            let watch = client.watch::<S::Data>(request);
            if watch.initial.is_some() {
                let mut state = self.lock();
                if state.tracker.is_current(&ticket) {
                    state.loading = false;
                }
            }
            self.shared.scope.run(watch.refresh()).await
        } else {
            self.shared.scope.run(client.query::<S::Data>(&request, policy)).await
        };

        let Some(result) = result else {
            debug!(view = source.name(), key = %ticket.key, "load cancelled");
            return LoadOutcome::Cancelled;
        };

        let mut state = self.lock();
        if !state.tracker.is_current(&ticket) {
            debug!(view = source.name(), key = %ticket.key, "stale completion ignored");
            return LoadOutcome::Superseded;
        }
        state.loading = false;
        match result {
            Ok(result) if result.data.is_some() => {
                state.error = None;
                state.partial_errors = result.errors;
                LoadOutcome::Loaded
            }
            Ok(result) => {
                let err = if result.errors.is_empty() {
                    ApiError::MissingData(source.name().to_string())
                } else {
                    ApiError::GraphQl(result.errors)
                };
                state.error = Some(err.clone());
                state.partial_errors.clear();
                LoadOutcome::Failed(err)
            }
            Err(err) => {
                state.error = Some(err.clone());
                state.partial_errors.clear();
                LoadOutcome::Failed(err)
            }
        }
    }

    /// Reload the active page from the network.
    pub async fn refetch(&self) -> LoadOutcome {
        self.load(FetchPolicy::NetworkOnly).await
    }

    /// Move to `page`. `None` when nothing changed.
    pub async fn set_page(&self, page: u32) -> Option<LoadOutcome> {
        if !self.shared.source.paginated() {
            return None;
        }
        {
            let mut state = self.lock();
            if state.request.page() == page {
                return None;
            }
            state.request = state.request.with_page(page).ok()?;
        }
        Some(self.load(FetchPolicy::CacheAndNetwork).await)
    }

    pub async fn next_page(&self) -> Option<LoadOutcome> {
        let pagination = self.pagination();
        if !pagination.can_next {
            return None;
        }
        self.set_page(pagination.page.saturating_add(1)).await
    }

    pub async fn previous_page(&self) -> Option<LoadOutcome> {
        let page = self.page();
        if page <= 1 {
            return None;
        }
        self.set_page(page - 1).await
    }

    /// Change the filter and go back to page 1.
    pub async fn set_search_term(&self, term: &str) -> Option<LoadOutcome> {
        self.lock().search_term = term.to_string();
        self.set_page(1).await
    }

    pub fn search_term(&self) -> String {
        self.lock().search_term.clone()
    }

    pub fn page(&self) -> u32 {
        self.lock().request.page()
    }

    pub fn limit(&self) -> u32 {
        self.lock().request.limit()
    }

    pub fn is_loading(&self) -> bool {
        self.lock().loading
    }

    pub fn error(&self) -> Option<ApiError> {
        self.lock().error.clone()
    }

    /// Errors that arrived alongside usable data.
    pub fn partial_errors(&self) -> Vec<GraphQlError> {
        self.lock().partial_errors.clone()
    }

    /// Cache key of the query the view is showing.
    pub fn active_key(&self) -> QueryKey {
        let request = self.lock().request;
        QueryKey::of(&self.shared.source.request(request))
    }

    /// The active listing, as currently cached.
    pub fn listing(&self) -> Option<Listing<S::Item>> {
        let key = self.active_key();
        let client = self.shared.facade.client();
        match client.cache().read_typed::<S::Data>(&key) {
            Ok(data) => data.map(|d| self.shared.source.listing(d)),
            Err(err) => {
                debug!(key = %key, error = %err, "cached listing no longer decodes");
                None
            }
        }
    }

    /// Loaded items that pass the search filter.
    pub fn visible_items(&self) -> Vec<S::Item> {
        let items = self.listing().map(|l| l.items).unwrap_or_default();
        let needle = self.search_term().trim().to_lowercase();
        if needle.is_empty() {
            return items;
        }
        items
            .into_iter()
            .filter(|item| self.shared.source.matches(item, &needle))
            .collect()
    }

    pub fn pagination(&self) -> Pagination {
        match self.listing() {
            Some(listing) => Pagination::of(&listing),
            None => Pagination::empty(self.page()),
        }
    }

    /// Text shown when nothing is visible.
    pub fn empty_message(&self) -> String {
        if self.search_term().trim().is_empty() {
            format!("No {} found.", self.shared.source.name())
        } else {
            format!("No {} found matching your search.", self.shared.source.name())
        }
    }

    /// Context for cards rendered inside this view.
    pub fn card_context(&self) -> CardContext {
        CardContext {
            facade: Arc::clone(&self.shared.facade),
            parent: Arc::new(self.clone()),
            scope: self.shared.scope.child(),
        }
    }
}

#[async_trait]
impl<S: ListSource> Refetch for ListView<S> {
    async fn refetch(&self) -> LoadOutcome {
        ListView::refetch(self).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::mock::MockFailure;
    use crate::api::operations::names;
    use crate::api::ResultSource;
    use crate::console::fixtures::{signed_in, Fixture};
    use serde_json::json;

    fn seed(fx: &Fixture, count: usize) {
        for i in 1..=count {
            fx.server.seed_department(&format!("Dept {i}"), &[]);
        }
    }

    #[tokio::test]
    async fn mount_loads_first_page() {
        let fx = signed_in();
        seed(&fx, 12);
        let list = DepartmentList::departments(fx.facade.clone(), 10).unwrap();
        assert!(list.listing().is_none());

        assert_eq!(list.mount().await, LoadOutcome::Loaded);
        assert!(!list.is_loading());
        assert_eq!(list.visible_items().len(), 10);
        let pagination = list.pagination();
        assert_eq!(pagination.page_count, 2);
        assert!(pagination.can_next);
        assert!(!pagination.can_previous);
    }

    #[tokio::test]
    async fn paging_moves_and_reloads() {
        let fx = signed_in();
        seed(&fx, 12);
        let list = DepartmentList::departments(fx.facade.clone(), 10).unwrap();
        list.mount().await;

        assert!(list.next_page().await.unwrap().is_loaded());
        assert_eq!(list.page(), 2);
        assert_eq!(list.visible_items().len(), 2);
        assert!(list.next_page().await.is_none());

        assert!(list.previous_page().await.unwrap().is_loaded());
        assert_eq!(list.page(), 1);
        assert!(list.previous_page().await.is_none());
        assert!(list.set_page(1).await.is_none());
    }

    #[tokio::test]
    async fn search_filters_loaded_page_and_resets_page() {
        let fx = signed_in();
        fx.server.seed_department("Engineering", &[]);
        fx.server.seed_department("Sales", &[]);
        for i in 0..10 {
            fx.server.seed_department(&format!("Ops {i}"), &[]);
        }
        let list = DepartmentList::departments(fx.facade.clone(), 10).unwrap();
        list.mount().await;
        list.next_page().await;
        assert_eq!(list.page(), 2);

        list.set_search_term("ENG").await;
        assert_eq!(list.page(), 1);
        let names: Vec<_> = list.visible_items().into_iter().map(|d| d.name).collect();
        assert_eq!(names, vec!["Engineering"]);

        list.set_search_term("nothing like it").await;
        assert!(list.visible_items().is_empty());
        assert_eq!(list.empty_message(), "No departments found matching your search.");
        list.set_search_term("").await;
        assert_eq!(list.visible_items().len(), 10);
    }

    #[tokio::test]
    async fn sub_departments_match_on_department_name() {
        let fx = signed_in();
        fx.server.seed_department("Engineering", &["Platform", "Mobile"]);
        fx.server.seed_department("Sales", &["Inside"]);
        let list = SubDepartmentList::sub_departments(fx.facade.clone()).unwrap();
        list.mount().await;
        assert_eq!(list.visible_items().len(), 3);
        assert!(!list.pagination().is_needed());

        list.set_search_term("engin").await;
        let names: Vec<_> = list.visible_items().into_iter().map(|s| s.name).collect();
        assert_eq!(names, vec!["Platform", "Mobile"]);
        assert!(list.set_page(2).await.is_none());
    }

    #[tokio::test]
    async fn empty_listing_message() {
        let fx = signed_in();
        let list = DepartmentList::departments(fx.facade.clone(), 10).unwrap();
        list.mount().await;
        assert!(list.visible_items().is_empty());
        assert_eq!(list.empty_message(), "No departments found.");
        assert_eq!(list.pagination().page_count, 1);
    }

    #[tokio::test]
    async fn failure_is_recorded_and_cleared_on_success() {
        let fx = signed_in();
        seed(&fx, 1);
        fx.server.fail_on(MockFailure::network(names::GET_DEPARTMENTS));
        let list = DepartmentList::departments(fx.facade.clone(), 10).unwrap();

        assert!(matches!(list.mount().await, LoadOutcome::Failed(ApiError::Network(_))));
        assert!(list.error().is_some());
        assert!(!list.is_loading());

        fx.server.clear_fail_on();
        assert!(list.refetch().await.is_loaded());
        assert!(list.error().is_none());
        assert_eq!(list.visible_items().len(), 1);
    }

    #[tokio::test]
    async fn cached_page_shows_before_network_answers() {
        let fx = signed_in();
        seed(&fx, 3);
        let list = DepartmentList::departments(fx.facade.clone(), 10).unwrap();
        list.mount().await;

        fx.server.seed_department("Late", &[]);
        let release = fx.server.hold(names::GET_DEPARTMENTS, None);
        let pending = tokio::spawn({
            let list = list.clone();
            async move { list.mount().await }
        });
        tokio::task::yield_now().await;
        assert_eq!(list.visible_items().len(), 3);
        assert!(!list.is_loading());

        release.release();
        assert!(pending.await.unwrap().is_loaded());
        assert_eq!(list.visible_items().len(), 4);
    }

    #[tokio::test]
    async fn stale_completion_updates_cache_but_not_status() {
        let fx = signed_in();
        seed(&fx, 12);
        let list = DepartmentList::departments(fx.facade.clone(), 10).unwrap();
        let page_one = json!({ "page": 1, "limit": 10 });
        let release = fx.server.hold(names::GET_DEPARTMENTS, Some(page_one));

        let slow = tokio::spawn({
            let list = list.clone();
            async move { list.mount().await }
        });
        tokio::task::yield_now().await;

        // The user moves on before page 1 arrives.
        assert!(list.set_page(2).await.unwrap().is_loaded());
        release.release();
        assert_eq!(slow.await.unwrap(), LoadOutcome::Superseded);

        assert_eq!(list.page(), 2);
        assert!(!list.is_loading());
        let client = fx.facade.client();
        let key = operations::departments_key(PageRequest::first(10).unwrap());
        assert!(client.cache().contains(&key));
    }

    #[tokio::test]
    async fn returning_to_a_page_ignores_its_older_answer() {
        let fx = signed_in();
        seed(&fx, 12);
        let list = DepartmentList::departments(fx.facade.clone(), 10).unwrap();
        let page_one = json!({ "page": 1, "limit": 10 });
        let release = fx.server.hold_snapshot(names::GET_DEPARTMENTS, Some(page_one));

        let slow = tokio::spawn({
            let list = list.clone();
            async move { list.mount().await }
        });
        tokio::task::yield_now().await;

        seed(&fx, 1);
        assert!(list.set_page(2).await.unwrap().is_loaded());
        assert!(list.set_page(1).await.unwrap().is_loaded());
        release.release();
        assert_eq!(slow.await.unwrap(), LoadOutcome::Superseded);

        assert_eq!(list.page(), 1);
        assert_eq!(list.listing().unwrap().total, 13);
    }

    #[tokio::test]
    async fn unmount_drops_pending_completion() {
        let fx = signed_in();
        seed(&fx, 1);
        let list = DepartmentList::departments(fx.facade.clone(), 10).unwrap();
        let release = fx.server.hold(names::GET_DEPARTMENTS, None);

        let pending = tokio::spawn({
            let list = list.clone();
            async move { list.mount().await }
        });
        tokio::task::yield_now().await;
        list.unmount();
        release.release();

        assert_eq!(pending.await.unwrap(), LoadOutcome::Cancelled);
        assert!(list.is_loading());
        assert!(list.error().is_none());
        assert!(!list.is_mounted());
    }

    #[tokio::test]
    async fn refetch_goes_to_network() {
        let fx = signed_in();
        seed(&fx, 1);
        let list = DepartmentList::departments(fx.facade.clone(), 10).unwrap();
        list.mount().await;
        list.refetch().await;
        assert_eq!(fx.server.count(names::GET_DEPARTMENTS), 2);

        let client = fx.facade.client();
        let result = client
            .query::<DepartmentsData>(
                &operations::departments(PageRequest::first(10).unwrap()),
                FetchPolicy::CacheFirst,
            )
            .await
            .unwrap();
        assert_eq!(result.source, ResultSource::Cache);
    }

    #[test]
    fn tracker_only_honours_latest_ticket() {
        let mut tracker = RequestTracker::default();
        let key = QueryKey::new("Q", &json!({}));
        let first = tracker.issue(key.clone());
        let second = tracker.issue(key);
        assert!(!tracker.is_current(&first));
        assert!(tracker.is_current(&second));
    }

    #[test]
    fn zero_page_size_is_rejected() {
        let fx = signed_in();
        assert!(DepartmentList::departments(fx.facade.clone(), 0).is_err());
    }
}
