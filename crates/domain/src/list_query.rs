use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::{DEFAULT_PAGE_SIZE, Pagination};

/// Query state driving one list fetch.
///
/// Every change produces a new query; nothing is merged incrementally.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ListQuery {
    page: u32,
    page_size: u32,
    search: String,
    filters: BTreeMap<String, Value>,
}

impl Default for ListQuery {
    fn default() -> Self {
        Self {
            page: 1,
            page_size: DEFAULT_PAGE_SIZE,
            search: String::new(),
            filters: BTreeMap::new(),
        }
    }
}

impl ListQuery {
    /// Returns the first-page query with the default page size.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the one-based page.
    #[must_use]
    pub fn page(&self) -> u32 {
        self.page
    }

    /// Returns the page size.
    #[must_use]
    pub fn page_size(&self) -> u32 {
        self.page_size
    }

    /// Returns the free-text search term.
    #[must_use]
    pub fn search(&self) -> &str {
        self.search.as_str()
    }

    /// Returns the resource-specific filters.
    #[must_use]
    pub fn filters(&self) -> &BTreeMap<String, Value> {
        &self.filters
    }

    /// Moves to another page, keeping everything else.
    #[must_use]
    pub fn with_page(&self, page: u32) -> Self {
        Self {
            page: page.max(1),
            ..self.clone()
        }
    }

    /// Changes the page size and goes back to page one.
    #[must_use]
    pub fn with_page_size(&self, page_size: u32) -> Self {
        Self {
            page: 1,
            page_size: page_size.max(1),
            ..self.clone()
        }
    }

    /// Changes the search term and goes back to page one.
    #[must_use]
    pub fn with_search(&self, search: impl Into<String>) -> Self {
        Self {
            page: 1,
            search: search.into().trim().to_owned(),
            ..self.clone()
        }
    }

    /// Sets or clears a filter and goes back to page one.
    ///
    /// `Value::Null` and empty strings clear the filter.
    #[must_use]
    pub fn with_filter(&self, key: impl Into<String>, value: Value) -> Self {
        let mut filters = self.filters.clone();
        let key = key.into();
        let is_blank = match &value {
            Value::Null => true,
            Value::String(text) => text.trim().is_empty(),
            _ => false,
        };
        if is_blank {
            filters.remove(key.as_str());
        } else {
            filters.insert(key, value);
        }

        Self {
            page: 1,
            filters,
            ..self.clone()
        }
    }

    /// Drops search and filters, keeping the page size.
    #[must_use]
    pub fn cleared(&self) -> Self {
        Self {
            page_size: self.page_size,
            ..Self::default()
        }
    }

    /// Builds the `{page, page_size, search, ...filters}` request body.
    #[must_use]
    pub fn to_request_body(&self) -> Map<String, Value> {
        let mut body = Map::new();
        for (key, value) in &self.filters {
            body.insert(key.clone(), value.clone());
        }
        body.insert("page".to_owned(), Value::from(self.page));
        body.insert("page_size".to_owned(), Value::from(self.page_size));
        body.insert("search".to_owned(), Value::from(self.search.as_str()));
        body
    }
}

/// One fetched page of records.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ListResult<T> {
    /// Records on this page, in server order.
    pub items: Vec<T>,
    /// Pagination envelope for the page.
    pub pagination: Pagination,
}

impl<T> ListResult<T> {
    /// Empty first page for the given page size.
    #[must_use]
    pub fn empty(page_size: u32) -> Self {
        Self {
            items: Vec::new(),
            pagination: Pagination::empty(page_size),
        }
    }

    /// Returns whether the page holds no records.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}
