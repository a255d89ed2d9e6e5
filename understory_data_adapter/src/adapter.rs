// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

use core::cell::{Cell, RefCell};
use core::fmt;
use core::marker::PhantomData;
use std::rc::Rc;

use async_trait::async_trait;
use hashbrown::HashMap;
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};
use understory_collection::Keyed;
use url::Url;

use crate::cache::{Clock, ResponseCache, SystemClock, UrlCache};
use crate::config::{AdapterConfig, Strategy};
use crate::error::{AdapterError, TransportError};
use crate::position::{Page, PageMeta, Position};
use crate::query::{Query, ReadOptions, encode};
use crate::response::{ParsedResponse, ResponseParser, error_message, parse_body};
use crate::transport::{Method, Request, Transport};

/// The contract a list controller needs from a data source.
///
/// [`RestAdapter`] is the HTTP-shaped implementation; storage-specific
/// sources implement the same trait.
#[async_trait(?Send)]
pub trait DataAdapter<T> {
    /// The pagination strategy, fixed for the adapter's lifetime.
    fn strategy(&self) -> Strategy;

    /// Default range size.
    fn page_size(&self) -> u32;

    /// Position of the first range.
    fn first_position(&self) -> Position {
        self.strategy().first(self.page_size())
    }

    /// Reads the range at `position`, filtered by `query`.
    ///
    /// A cancelled read resolves to [`Page::aborted`].
    async fn fetch(&self, query: &Query, position: &Position) -> Result<Page<T>, AdapterError>;

    /// Cancels outstanding requests and returns how many were cancelled.
    fn abort_in_flight(&self) -> usize;

    /// Cancels outstanding requests and drops all cached state.
    fn disconnect(&self);

    /// Drops cached responses so the next read goes to the source.
    fn invalidate_cache(&self) {}
}

/// Adapter issuing HTTP-shaped requests through a [`Transport`].
///
/// All state lives behind `Cell`/`RefCell`, so every operation takes `&self`
/// and the adapter can be shared with `Rc` while reads are outstanding.
pub struct RestAdapter<T, X> {
    config: AdapterConfig,
    transport: X,
    parser: Option<ResponseParser>,
    clock: Rc<dyn Clock>,
    responses: RefCell<ResponseCache>,
    urls: RefCell<UrlCache>,
    in_flight: RefCell<HashMap<u64, CancellationToken>>,
    next_request: Cell<u64>,
    epoch: Cell<u64>,
    _items: PhantomData<fn() -> T>,
}

impl<T, X> fmt::Debug for RestAdapter<T, X> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RestAdapter")
            .field("config", &self.config)
            .field("custom_parser", &self.parser.is_some())
            .field("cached_responses", &self.responses.borrow().len())
            .field("in_flight", &self.in_flight.borrow().len())
            .field("epoch", &self.epoch.get())
            .finish_non_exhaustive()
    }
}

impl<T, X> RestAdapter<T, X> {
    /// Creates an adapter for `config` sending through `transport`.
    pub fn new(config: AdapterConfig, transport: X) -> Self {
        let ttl = config.cache_ttl();
        Self {
            config,
            transport,
            parser: None,
            clock: Rc::new(SystemClock),
            responses: RefCell::new(ResponseCache::new(ttl)),
            urls: RefCell::new(UrlCache::default()),
            in_flight: RefCell::new(HashMap::new()),
            next_request: Cell::new(0),
            epoch: Cell::new(0),
            _items: PhantomData,
        }
    }

    /// Installs a parser that replaces built-in envelope detection.
    #[must_use]
    pub fn with_parser(
        mut self,
        parser: impl Fn(&Value) -> Result<ParsedResponse, AdapterError> + 'static,
    ) -> Self {
        self.parser = Some(Rc::new(parser));
        self
    }

    /// Replaces the clock used for cache expiry.
    #[must_use]
    pub fn with_clock(mut self, clock: Rc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// The adapter configuration.
    #[must_use]
    pub fn config(&self) -> &AdapterConfig {
        &self.config
    }

    /// The underlying transport.
    #[must_use]
    pub fn transport(&self) -> &X {
        &self.transport
    }

    /// Number of requests awaiting a response.
    #[must_use]
    pub fn in_flight(&self) -> usize {
        self.in_flight.borrow().len()
    }

    /// Number of live entries in the response cache.
    #[must_use]
    pub fn cached_responses(&self) -> usize {
        self.responses.borrow().len()
    }

    /// Number of memoized endpoint URLs.
    #[must_use]
    pub fn cached_urls(&self) -> usize {
        self.urls.borrow().len()
    }

    /// Cancels every outstanding request without touching the caches.
    ///
    /// Cancelled reads resolve to [`Page::aborted`]. Returns how many requests
    /// were cancelled.
    pub fn abort_in_flight(&self) -> usize {
        let tokens: Vec<CancellationToken> =
            self.in_flight.borrow_mut().drain().map(|(_, token)| token).collect();
        for token in &tokens {
            token.cancel();
        }
        if !tokens.is_empty() {
            debug!(count = tokens.len(), "aborted in-flight requests");
        }
        tokens.len()
    }

    /// Cancels every outstanding request and clears the URL and response
    /// caches.
    ///
    /// Responses racing the disconnect are discarded instead of cached.
    pub fn disconnect(&self) {
        self.abort_in_flight();
        self.epoch.set(self.epoch.get() + 1);
        self.responses.borrow_mut().clear();
        self.urls.borrow_mut().clear();
    }

    /// Drops cached responses, keeping in-flight requests alive.
    pub fn clear_cache(&self) {
        self.responses.borrow_mut().clear();
    }

    fn endpoint(&self) -> Result<Url, AdapterError> {
        self.urls
            .borrow_mut()
            .resolve(&self.config.base_url, &self.config.endpoint)
    }

    /// The position `options` addresses under the configured strategy.
    fn position_of(&self, options: &ReadOptions) -> Position {
        let size = self.config.page_size.max(1);
        match self.config.strategy {
            Strategy::Cursor => Position::Cursor {
                cursor: options.cursor.clone(),
                limit: options.limit.unwrap_or(size),
            },
            Strategy::Offset => Position::Offset {
                offset: options.offset.unwrap_or(0),
                limit: options.limit.unwrap_or(size),
            },
            Strategy::Page => Position::Page {
                page: options.page.unwrap_or(1).max(1),
                per_page: options.per_page.unwrap_or(size),
            },
        }
    }
}

impl<T, X: Transport> RestAdapter<T, X> {
    /// Sends one request and returns its success body.
    ///
    /// Returns `Ok(None)` when the request was cancelled. Only GET responses
    /// are cached.
    async fn send(
        &self,
        method: Method,
        url: Url,
        body: Option<Value>,
    ) -> Result<Option<String>, AdapterError> {
        let cacheable = method == Method::Get && self.config.cache;
        if cacheable {
            let hit = self
                .responses
                .borrow_mut()
                .get(url.as_str(), self.clock.now())
                .map(str::to_owned);
            if let Some(hit) = hit {
                debug!(url = %url, "response cache hit");
                return Ok(Some(hit));
            }
        }

        let id = self.next_request.get();
        self.next_request.set(id + 1);
        let token = CancellationToken::new();
        self.in_flight.borrow_mut().insert(id, token.clone());
        let epoch = self.epoch.get();

        let key = url.to_string();
        let request = Request {
            method,
            url,
            headers: self
                .config
                .headers
                .iter()
                .map(|(k, v)| (k.clone(), v.clone()))
                .collect(),
            body,
        };
        let outcome = tokio::select! {
            biased;
            _ = token.cancelled() => Err(TransportError::Aborted),
            result = self.transport.send(request, token.clone()) => result,
        };
        self.in_flight.borrow_mut().remove(&id);

        let response = match outcome {
            Ok(response) => response,
            Err(TransportError::Aborted) => {
                debug!(url = %key, method = method.as_str(), "request aborted");
                return Ok(None);
            }
            Err(TransportError::Network(message)) => {
                warn!(url = %key, method = method.as_str(), %message, "request failed");
                return Err(AdapterError::Network(message));
            }
        };
        if token.is_cancelled() {
            debug!(url = %key, "discarding response completed after abort");
            return Ok(None);
        }
        if !response.is_success() {
            let message = error_message(&response.body)
                .unwrap_or_else(|| format!("HTTP {}", response.status));
            warn!(url = %key, status = response.status, %message, "request rejected");
            return Err(AdapterError::Transport {
                status: response.status,
                message,
            });
        }
        if cacheable && self.epoch.get() == epoch {
            self.responses
                .borrow_mut()
                .insert(key, response.body.clone(), self.clock.now());
        }
        Ok(Some(response.body))
    }
}

impl<T: DeserializeOwned + Keyed, X: Transport> RestAdapter<T, X> {
    /// Reads one range.
    ///
    /// Paging fields of `options` that are unset default to the first range
    /// and the configured page size.
    pub async fn read(&self, query: &Query, options: &ReadOptions) -> Result<Page<T>, AdapterError> {
        let position = self.position_of(options);
        self.read_at(query, &position, options).await
    }

    /// Reads the range at `position`, carrying sort, fields, and search from
    /// `options`.
    pub async fn read_at(
        &self,
        query: &Query,
        position: &Position,
        options: &ReadOptions,
    ) -> Result<Page<T>, AdapterError> {
        let mut url = self.endpoint()?;
        encode(&mut url, query, &position.to_options().inherit(options));
        let Some(body) = self.send(Method::Get, url, None).await? else {
            return Ok(Page::aborted());
        };
        let parsed = parse_body(&body, self.parser.as_ref())?;
        let items = decode(parsed.items)?;
        let meta = PageMeta::resolve(position, &parsed.meta, &items);
        Ok(Page::new(items, meta))
    }

    /// Deletes items by id. Sends `DELETE` with a comma-joined `ids`
    /// parameter.
    pub async fn delete<I, S>(&self, ids: I) -> Result<Page<T>, AdapterError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let ids: Vec<String> = ids.into_iter().map(Into::into).collect();
        let mut url = self.endpoint()?;
        url.query_pairs_mut().append_pair("ids", &ids.join(","));
        self.write(Method::Delete, url, None).await
    }

    async fn write(
        &self,
        method: Method,
        url: Url,
        body: Option<Value>,
    ) -> Result<Page<T>, AdapterError> {
        let Some(body) = self.send(method, url, body).await? else {
            return Ok(Page::aborted());
        };
        let parsed = parse_body(&body, self.parser.as_ref())?;
        let items = decode(parsed.items)?;
        let meta = PageMeta {
            total: parsed.meta.total,
            ..PageMeta::default()
        };
        Ok(Page::new(items, meta))
    }
}

impl<T: Serialize + DeserializeOwned + Keyed, X: Transport> RestAdapter<T, X> {
    /// Creates items. Sends `POST` with the items as a JSON array.
    pub async fn create(&self, items: &[T]) -> Result<Page<T>, AdapterError> {
        let body = serde_json::to_value(items).map_err(|err| AdapterError::Encode(err.to_string()))?;
        let url = self.endpoint()?;
        self.write(Method::Post, url, Some(body)).await
    }

    /// Replaces items. Sends `PUT` with the items as a JSON array.
    pub async fn update(&self, items: &[T]) -> Result<Page<T>, AdapterError> {
        let body = serde_json::to_value(items).map_err(|err| AdapterError::Encode(err.to_string()))?;
        let url = self.endpoint()?;
        self.write(Method::Put, url, Some(body)).await
    }
}

#[async_trait(?Send)]
impl<T: DeserializeOwned + Keyed, X: Transport> DataAdapter<T> for RestAdapter<T, X> {
    fn strategy(&self) -> Strategy {
        self.config.strategy
    }

    fn page_size(&self) -> u32 {
        self.config.page_size.max(1)
    }

    async fn fetch(&self, query: &Query, position: &Position) -> Result<Page<T>, AdapterError> {
        self.read_at(query, position, &ReadOptions::default()).await
    }

    fn abort_in_flight(&self) -> usize {
        Self::abort_in_flight(self)
    }

    fn disconnect(&self) {
        Self::disconnect(self);
    }

    fn invalidate_cache(&self) {
        self.clear_cache();
    }
}

fn decode<T: DeserializeOwned>(items: Vec<Value>) -> Result<Vec<T>, AdapterError> {
    items
        .into_iter()
        .map(|item| serde_json::from_value(item).map_err(|err| AdapterError::Decode(err.to_string())))
        .collect()
}
