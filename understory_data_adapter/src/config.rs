// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

use std::collections::BTreeMap;

use core::time::Duration;
use serde::Deserialize;

use crate::position::Position;

/// Pagination strategy, fixed for the lifetime of an adapter.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Strategy {
    /// Opaque server-issued continuation tokens.
    #[default]
    Cursor,
    /// Row offset plus limit.
    Offset,
    /// 1-based page number plus page size.
    Page,
}

impl Strategy {
    /// Position of the first range under this strategy.
    #[must_use]
    pub fn first(self, page_size: u32) -> Position {
        let page_size = page_size.max(1);
        match self {
            Self::Cursor => Position::Cursor {
                cursor: None,
                limit: page_size,
            },
            Self::Offset => Position::Offset {
                offset: 0,
                limit: page_size,
            },
            Self::Page => Position::Page {
                page: 1,
                per_page: page_size,
            },
        }
    }

    /// Returns `true` if ranges before the current one can be addressed.
    #[must_use]
    pub fn supports_backward(self) -> bool {
        !matches!(self, Self::Cursor)
    }
}

/// Adapter configuration.
///
/// Deserializes from camelCase keys with every field optional:
///
/// ```rust
/// use understory_data_adapter::{AdapterConfig, Strategy};
///
/// let config: AdapterConfig = serde_json::from_str(
///     r#"{ "baseUrl": "https://api.example.com/", "endpoint": "users", "strategy": "page" }"#,
/// ).unwrap();
/// assert_eq!(config.strategy, Strategy::Page);
/// assert_eq!(config.page_size, 20);
/// assert!(config.cache);
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct AdapterConfig {
    /// Absolute base URL, e.g. `https://api.example.com/v1/`.
    pub base_url: String,
    /// Collection endpoint joined onto `base_url`, e.g. `users`.
    pub endpoint: String,
    /// Pagination strategy.
    pub strategy: Strategy,
    /// Default `limit`/`per_page` when a read does not specify one.
    pub page_size: u32,
    /// Whether reads are served from the response cache.
    pub cache: bool,
    /// Lifetime of cached read responses, in seconds.
    pub cache_ttl_secs: u64,
    /// Headers attached to every request.
    pub headers: BTreeMap<String, String>,
}

impl Default for AdapterConfig {
    fn default() -> Self {
        Self {
            base_url: String::new(),
            endpoint: String::new(),
            strategy: Strategy::default(),
            page_size: 20,
            cache: true,
            cache_ttl_secs: 300,
            headers: BTreeMap::new(),
        }
    }
}

impl AdapterConfig {
    /// Creates a configuration for `endpoint` under `base_url` with defaults.
    #[must_use]
    pub fn new(base_url: impl Into<String>, endpoint: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            endpoint: endpoint.into(),
            ..Self::default()
        }
    }

    /// Sets the pagination strategy.
    #[must_use]
    pub fn with_strategy(mut self, strategy: Strategy) -> Self {
        self.strategy = strategy;
        self
    }

    /// Sets the default page size.
    #[must_use]
    pub fn with_page_size(mut self, page_size: u32) -> Self {
        self.page_size = page_size;
        self
    }

    /// Enables or disables the read cache.
    #[must_use]
    pub fn with_cache(mut self, cache: bool) -> Self {
        self.cache = cache;
        self
    }

    /// Adds a header sent with every request.
    #[must_use]
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }

    /// Cache lifetime as a [`Duration`].
    #[must_use]
    pub fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.cache_ttl_secs)
    }

    /// Position of the first range for this configuration.
    #[must_use]
    pub fn first_position(&self) -> Position {
        self.strategy.first(self.page_size)
    }
}
