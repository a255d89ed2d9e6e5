// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

use url::Url;

/// Caller-defined filter: key/value pairs sent as query parameters.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct Query {
    filters: Vec<(String, String)>,
}

impl Query {
    /// An empty filter.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds `key=value` to the filter.
    #[must_use]
    pub fn with(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.filters.push((key.into(), value.into()));
        self
    }

    /// Returns `true` if no filter pairs are set.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.filters.is_empty()
    }

    /// Filter pairs in insertion order.
    pub fn pairs(&self) -> impl Iterator<Item = (&str, &str)> {
        self.filters.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

/// Paging, ordering, and projection options for a read.
///
/// Unset options are omitted from the request.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct ReadOptions {
    /// Continuation token (cursor strategy).
    pub cursor: Option<String>,
    /// Row offset (offset strategy).
    pub offset: Option<u64>,
    /// Range size (cursor and offset strategies).
    pub limit: Option<u32>,
    /// 1-based page number (page strategy).
    pub page: Option<u32>,
    /// Page size (page strategy).
    pub per_page: Option<u32>,
    /// Server-side sort expression.
    pub sort: Option<String>,
    /// Field projection, sent comma-joined.
    pub fields: Vec<String>,
    /// Free-text search.
    pub search: Option<String>,
}

impl ReadOptions {
    /// Sets the server-side sort expression.
    #[must_use]
    pub fn with_sort(mut self, sort: impl Into<String>) -> Self {
        self.sort = Some(sort.into());
        self
    }

    /// Sets the free-text search.
    #[must_use]
    pub fn with_search(mut self, search: impl Into<String>) -> Self {
        self.search = Some(search.into());
        self
    }

    /// Sets the field projection.
    #[must_use]
    pub fn with_fields<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.fields = fields.into_iter().map(Into::into).collect();
        self
    }

    /// Copies the non-paging options (sort, fields, search) from `other`.
    pub(crate) fn inherit(mut self, other: &Self) -> Self {
        self.sort.clone_from(&other.sort);
        self.fields.clone_from(&other.fields);
        self.search.clone_from(&other.search);
        self
    }
}

/// Appends the filter pairs, then the set options, to `url`'s query string.
///
/// The order is fixed so the resulting URL is a stable cache key.
pub(crate) fn encode(url: &mut Url, query: &Query, options: &ReadOptions) {
    let has_params = !query.is_empty()
        || options.cursor.is_some()
        || options.offset.is_some()
        || options.limit.is_some()
        || options.page.is_some()
        || options.per_page.is_some()
        || options.sort.is_some()
        || !options.fields.is_empty()
        || options.search.is_some();
    if !has_params {
        return;
    }
    let mut pairs = url.query_pairs_mut();
    for (key, value) in query.pairs() {
        pairs.append_pair(key, value);
    }
    if let Some(cursor) = &options.cursor {
        pairs.append_pair("cursor", cursor);
    }
    if let Some(offset) = options.offset {
        pairs.append_pair("offset", &offset.to_string());
    }
    if let Some(limit) = options.limit {
        pairs.append_pair("limit", &limit.to_string());
    }
    if let Some(page) = options.page {
        pairs.append_pair("page", &page.to_string());
    }
    if let Some(per_page) = options.per_page {
        pairs.append_pair("per_page", &per_page.to_string());
    }
    if let Some(sort) = &options.sort {
        pairs.append_pair("sort", sort);
    }
    if !options.fields.is_empty() {
        pairs.append_pair("fields", &options.fields.join(","));
    }
    if let Some(search) = &options.search {
        pairs.append_pair("search", search);
    }
}
