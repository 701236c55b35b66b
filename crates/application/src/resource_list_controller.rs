//! Fetch, filter, paginate and mutate state behind every resource list screen.
//!
//! Each screen owns one controller. Query changes replace the query
//! wholesale and trigger a fetch: filter, page and page-size changes fetch
//! at once, free-text search waits for a quiet period first. Responses are
//! tagged with a request number and only the most recently issued request
//! may write the result.

mod deletion;
mod selection;

use std::collections::BTreeSet;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use samsoft_core::{AppError, AppResult};
use samsoft_domain::{
    AppRoute, DetailMode, ListQuery, ListResult, PAGE_SIZE_OPTIONS, RecordId, ResourceKind,
    ResourceRecord, is_offered_page_size,
};
use serde_json::Value;
use tokio::sync::Mutex;
use tracing::{debug, warn};

use crate::ResourceApi;

pub use deletion::{DeleteOutcome, PendingDelete};

/// Quiet period before a search keystroke triggers a fetch.
pub const DEFAULT_SEARCH_DEBOUNCE: Duration = Duration::from_millis(500);

/// How a fetch ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchOutcome {
    /// The response replaced the result.
    Applied,
    /// The fetch failed; the message is what the screen shows.
    Failed(String),
    /// A later request or keystroke made this one irrelevant.
    Superseded,
}

/// Everything a list screen renders.
#[derive(Debug, Clone, PartialEq)]
pub struct ListSnapshot {
    /// Query of the most recent change.
    pub query: ListQuery,
    /// Last applied page.
    pub result: ListResult<ResourceRecord>,
    /// Whether a fetch is in flight.
    pub loading: bool,
    /// Message of the last failed fetch.
    pub error: Option<String>,
    /// Selected ids, kept across pages.
    pub selected: BTreeSet<RecordId>,
    /// Delete waiting for confirmation.
    pub pending_delete: Option<PendingDelete>,
}

impl ListSnapshot {
    fn new(query: ListQuery) -> Self {
        Self {
            result: ListResult::empty(query.page_size()),
            query,
            loading: false,
            error: None,
            selected: BTreeSet::new(),
            pending_delete: None,
        }
    }

    /// Returns the ids of the records on the visible page.
    #[must_use]
    pub fn visible_ids(&self) -> Vec<RecordId> {
        self.result
            .items
            .iter()
            .filter_map(ResourceRecord::id)
            .collect()
    }
}

/// State and handlers for one resource list screen.
#[derive(Clone)]
pub struct ResourceListController {
    inner: Arc<ControllerInner>,
}

struct ControllerInner {
    kind: ResourceKind,
    api: Arc<dyn ResourceApi>,
    state: Mutex<ListSnapshot>,
    latest_request: AtomicU64,
    search_generation: AtomicU64,
    debounce: Duration,
}

impl ResourceListController {
    /// Creates a controller with the default query and search debounce.
    #[must_use]
    pub fn new(kind: ResourceKind, api: Arc<dyn ResourceApi>) -> Self {
        Self::with_debounce(kind, api, DEFAULT_SEARCH_DEBOUNCE)
    }

    /// Creates a controller with a custom search debounce.
    #[must_use]
    pub fn with_debounce(kind: ResourceKind, api: Arc<dyn ResourceApi>, debounce: Duration) -> Self {
        Self {
            inner: Arc::new(ControllerInner {
                kind,
                api,
                state: Mutex::new(ListSnapshot::new(ListQuery::new())),
                latest_request: AtomicU64::new(0),
                search_generation: AtomicU64::new(0),
                debounce,
            }),
        }
    }

    /// Returns the resource this screen lists.
    #[must_use]
    pub fn kind(&self) -> ResourceKind {
        self.inner.kind
    }

    /// Returns a copy of the current screen state.
    pub async fn snapshot(&self) -> ListSnapshot {
        self.inner.state.lock().await.clone()
    }

    /// Fetches the current query.
    pub async fn fetch(&self) -> FetchOutcome {
        self.replace_query(ListQuery::clone).await
    }

    /// Updates the search term and fetches once typing pauses.
    pub async fn set_search(&self, search: impl Into<String>) -> FetchOutcome {
        let search = search.into();
        let generation = self
            .inner
            .search_generation
            .fetch_add(1, Ordering::SeqCst)
            .saturating_add(1);
        {
            let mut state = self.inner.state.lock().await;
            state.query = state.query.with_search(search);
        }

        tokio::time::sleep(self.inner.debounce).await;

        if self.inner.search_generation.load(Ordering::SeqCst) != generation {
            return FetchOutcome::Superseded;
        }

        self.fetch().await
    }

    /// Sets or clears a filter and fetches at once.
    pub async fn set_filter(&self, key: impl Into<String>, value: Value) -> FetchOutcome {
        let key = key.into();
        self.replace_query(|query| query.with_filter(key, value))
            .await
    }

    /// Drops search and filters and fetches at once.
    pub async fn clear_filters(&self) -> FetchOutcome {
        self.replace_query(ListQuery::cleared).await
    }

    /// Moves to a page and fetches at once.
    pub async fn set_page(&self, page: u32) -> FetchOutcome {
        self.replace_query(|query| query.with_page(page)).await
    }

    /// Changes the page size, back to page one, and fetches at once.
    pub async fn set_page_size(&self, page_size: u32) -> AppResult<FetchOutcome> {
        if !is_offered_page_size(page_size) {
            return Err(AppError::Validation(format!(
                "page size must be one of {PAGE_SIZE_OPTIONS:?}, got {page_size}"
            )));
        }

        Ok(self
            .replace_query(|query| query.with_page_size(page_size))
            .await)
    }

    /// Replaces the whole query, as when a screen opens from a saved URL.
    pub async fn open_with(&self, query: ListQuery) -> AppResult<FetchOutcome> {
        if !is_offered_page_size(query.page_size()) {
            return Err(AppError::Validation(format!(
                "page size must be one of {PAGE_SIZE_OPTIONS:?}, got {}",
                query.page_size()
            )));
        }

        Ok(self.replace_query(|_| query).await)
    }

    /// Route of the read-only detail screen for a row.
    #[must_use]
    pub fn view_route(&self, id: RecordId) -> AppRoute {
        AppRoute::Detail {
            kind: self.inner.kind,
            id,
            mode: DetailMode::View,
        }
    }

    /// Route of the edit form for a row.
    #[must_use]
    pub fn edit_route(&self, id: RecordId) -> AppRoute {
        AppRoute::Detail {
            kind: self.inner.kind,
            id,
            mode: DetailMode::Edit,
        }
    }

    /// Route of the create form.
    #[must_use]
    pub fn create_route(&self) -> AppRoute {
        AppRoute::Create(self.inner.kind)
    }

    async fn replace_query(&self, update: impl FnOnce(&ListQuery) -> ListQuery) -> FetchOutcome {
        let (request_id, query) = {
            let mut state = self.inner.state.lock().await;
            state.query = update(&state.query);
            state.loading = true;
            let request_id = self
                .inner
                .latest_request
                .fetch_add(1, Ordering::SeqCst)
                .saturating_add(1);
            (request_id, state.query.clone())
        };

        self.run_fetch(request_id, query).await
    }

    async fn run_fetch(&self, request_id: u64, query: ListQuery) -> FetchOutcome {
        debug!(
            resource = %self.inner.kind,
            request_id,
            page = query.page(),
            page_size = query.page_size(),
            search = query.search(),
            "fetching resource list"
        );

        let response = self.inner.api.list(self.inner.kind, &query).await;

        let mut state = self.inner.state.lock().await;
        if self.inner.latest_request.load(Ordering::SeqCst) != request_id {
            warn!(
                resource = %self.inner.kind,
                request_id,
                "discarding response of a superseded list request"
            );
            return FetchOutcome::Superseded;
        }

        state.loading = false;
        match response {
            Ok(result) => {
                state.result = result;
                state.error = None;
                FetchOutcome::Applied
            }
            Err(error) => {
                let message = error.user_message();
                warn!(
                    resource = %self.inner.kind,
                    request_id,
                    error = %error,
                    "resource list fetch failed"
                );
                if !error.is_preflight() {
                    state.result = ListResult::empty(query.page_size());
                }
                state.error = Some(message.clone());
                FetchOutcome::Failed(message)
            }
        }
    }
}
