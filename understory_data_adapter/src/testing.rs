// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! In-memory transport and clock for tests.

use core::cell::{Cell, RefCell};
use core::fmt;
use core::time::Duration;
use std::collections::VecDeque;

use async_trait::async_trait;
use serde_json::{Value, json};
use tokio_util::sync::CancellationToken;
use web_time::Instant;

use crate::cache::Clock;
use crate::error::TransportError;
use crate::transport::{Request, Response, Transport};

type Handler = Box<dyn Fn(&Request) -> Response>;

/// Transport answering from a closure and recording every request.
///
/// Queued responses from [`MockTransport::push_response`] are served before
/// the handler. While [stalled](MockTransport::set_stalled), requests wait
/// for their cancellation token and resolve as aborted.
pub struct MockTransport {
    handler: Handler,
    queued: RefCell<VecDeque<Result<Response, TransportError>>>,
    requests: RefCell<Vec<Request>>,
    stalled: Cell<bool>,
}

impl fmt::Debug for MockTransport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MockTransport")
            .field("queued", &self.queued.borrow().len())
            .field("requests", &self.requests.borrow().len())
            .field("stalled", &self.stalled.get())
            .finish_non_exhaustive()
    }
}

impl MockTransport {
    /// A transport answering every request with `handler`.
    pub fn new(handler: impl Fn(&Request) -> Response + 'static) -> Self {
        Self {
            handler: Box::new(handler),
            queued: RefCell::new(VecDeque::new()),
            requests: RefCell::new(Vec::new()),
            stalled: Cell::new(false),
        }
    }

    /// A transport always answering `status` with `body`.
    pub fn fixed(status: u16, body: impl Into<String>) -> Self {
        let response = Response::new(status, body);
        Self::new(move |_| response.clone())
    }

    /// A server holding `total` items with ids `item-0`, `item-1`, ...
    ///
    /// Answers page requests with `{items, meta: {total, pages}}`, offset
    /// requests with `{data, pagination: {total}}`, and cursor requests with
    /// `{results, meta: {nextCursor}}` where the cursor is the last item's id.
    pub fn paged(total: usize) -> Self {
        Self::new(move |request| serve_page(request, total))
    }

    /// Serves `response` to the next request instead of the handler.
    pub fn push_response(&self, response: Response) {
        self.queued.borrow_mut().push_back(Ok(response));
    }

    /// Fails the next request with a network error.
    pub fn push_network_error(&self, message: impl Into<String>) {
        self.queued
            .borrow_mut()
            .push_back(Err(TransportError::Network(message.into())));
    }

    /// Makes requests wait for cancellation instead of answering.
    pub fn set_stalled(&self, stalled: bool) {
        self.stalled.set(stalled);
    }

    /// Number of requests received.
    pub fn calls(&self) -> usize {
        self.requests.borrow().len()
    }

    /// Clones of every request received, oldest first.
    pub fn requests(&self) -> Vec<Request> {
        self.requests.borrow().clone()
    }

    /// The query parameter `key` of the most recent request.
    pub fn last_param(&self, key: &str) -> Option<String> {
        let requests = self.requests.borrow();
        let request = requests.last()?;
        request
            .url
            .query_pairs()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.into_owned())
    }
}

#[async_trait(?Send)]
impl Transport for MockTransport {
    async fn send(
        &self,
        request: Request,
        cancel: CancellationToken,
    ) -> Result<Response, TransportError> {
        self.requests.borrow_mut().push(request.clone());
        if self.stalled.get() {
            cancel.cancelled().await;
            return Err(TransportError::Aborted);
        }
        let queued = self.queued.borrow_mut().pop_front();
        match queued {
            Some(result) => result,
            None => Ok((self.handler)(&request)),
        }
    }
}

fn serve_page(request: &Request, total: usize) -> Response {
    let param = |key: &str| {
        request
            .url
            .query_pairs()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.into_owned())
    };
    let number = |key: &str| param(key).and_then(|v| v.parse::<usize>().ok());
    let items = |start: usize, count: usize| -> Vec<Value> {
        (start..total.min(start.saturating_add(count)))
            .map(|i| json!({ "id": format!("item-{i}"), "index": i }))
            .collect()
    };

    let body = if let Some(page) = number("page") {
        let per_page = number("per_page").unwrap_or(20).max(1);
        json!({
            "items": items(page.saturating_sub(1) * per_page, per_page),
            "meta": { "total": total, "pages": total.div_ceil(per_page) },
        })
    } else if let Some(offset) = number("offset") {
        let limit = number("limit").unwrap_or(20);
        json!({
            "data": items(offset, limit),
            "pagination": { "total": total },
        })
    } else {
        let limit = number("limit").unwrap_or(20);
        let start = param("cursor")
            .and_then(|c| c.strip_prefix("item-").and_then(|i| i.parse::<usize>().ok()))
            .map_or(0, |i| i + 1);
        let end = total.min(start.saturating_add(limit));
        let next = (end < total).then(|| format!("item-{}", end - 1));
        json!({
            "results": items(start, limit),
            "meta": { "nextCursor": next },
        })
    };
    Response::new(200, body.to_string())
}

/// Clock that only moves when told to.
#[derive(Debug)]
pub struct ManualClock {
    now: Cell<Instant>,
}

impl Default for ManualClock {
    fn default() -> Self {
        Self::new()
    }
}

impl ManualClock {
    /// A clock frozen at the current instant.
    pub fn new() -> Self {
        Self {
            now: Cell::new(Instant::now()),
        }
    }

    /// Moves the clock forward by `by`.
    pub fn advance(&self, by: Duration) {
        self.now.set(self.now.get() + by);
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Instant {
        self.now.get()
    }
}
