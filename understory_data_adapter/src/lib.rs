// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

// After you edit the crate's doc comment, run this command, then check README.md for any missing links
// cargo rdme --workspace-project=understory_data_adapter --heading-base-level=0

//! Understory Data Adapter: paginated remote reads behind a transport seam.
//!
//! [`RestAdapter`] turns abstract reads and writes into HTTP-shaped
//! [`Request`]s, hands them to a host-supplied [`Transport`], and normalizes
//! whatever comes back into a [`Page`] of items plus [`PageMeta`].
//!
//! - **Strategies**: a [`Strategy`] is fixed per adapter. Ranges are addressed
//!   by [`Position`]s (cursor token, offset, or 1-based page) and
//!   [`Position::next`] derives the following range from a read's metadata.
//! - **Normalization**: bare arrays and `items`/`data`/`results`/`content`
//!   envelopes are recognized by [`Envelope::detect`], with pagination fields
//!   looked up under `meta`, `pagination`, or `page` before the envelope
//!   itself. A custom parser installed with [`RestAdapter::with_parser`]
//!   replaces detection entirely.
//! - **Caching**: GET responses are cached by full URL for a fixed TTL
//!   (5 minutes by default). Writes never touch the cache.
//! - **Cancellation**: every request carries a
//!   [`CancellationToken`](tokio_util::sync::CancellationToken).
//!   [`RestAdapter::abort_in_flight`] and [`RestAdapter::disconnect`] cancel
//!   them, and cancelled reads resolve to [`Page::aborted`] rather than an
//!   error.
//!
//! The adapter is single-threaded: state sits behind `RefCell`/`Cell` and the
//! transport future is `?Send`. List controllers hold it through the
//! [`DataAdapter`] trait.
//!
//! ## Minimal example
//!
//! ```rust
//! use async_trait::async_trait;
//! use tokio_util::sync::CancellationToken;
//! use understory_data_adapter::{
//!     AdapterConfig, Position, Query, ReadOptions, Record, Request, Response, RestAdapter,
//!     Strategy, Transport, TransportError,
//! };
//!
//! struct Canned;
//!
//! #[async_trait(?Send)]
//! impl Transport for Canned {
//!     async fn send(&self, req: Request, _: CancellationToken) -> Result<Response, TransportError> {
//!         assert_eq!(req.url.as_str(), "https://api.test/users?page=1&per_page=2");
//!         Ok(Response::new(
//!             200,
//!             r#"{ "data": [{ "id": 1 }, { "id": 2 }], "meta": { "total": 5 } }"#,
//!         ))
//!     }
//! }
//!
//! let config = AdapterConfig::new("https://api.test", "users")
//!     .with_strategy(Strategy::Page)
//!     .with_page_size(2);
//! let adapter: RestAdapter<Record, _> = RestAdapter::new(config, Canned);
//!
//! let rt = tokio::runtime::Builder::new_current_thread().build().unwrap();
//! let page = rt
//!     .block_on(adapter.read(&Query::new(), &ReadOptions::default()))
//!     .unwrap();
//!
//! assert_eq!(page.items.len(), 2);
//! assert_eq!(page.meta.pages, Some(3));
//! assert!(page.meta.has_next);
//! let next = Position::Page { page: 1, per_page: 2 }.next(&page.meta, page.items.len());
//! assert_eq!(next, Some(Position::Page { page: 2, per_page: 2 }));
//! ```

mod adapter;
mod cache;
mod config;
mod error;
mod position;
mod query;
mod record;
mod response;
mod transport;

#[cfg(any(test, feature = "testing"))]
pub mod testing;

pub use adapter::{DataAdapter, RestAdapter};
pub use cache::{Clock, SystemClock};
pub use config::{AdapterConfig, Strategy};
pub use error::{AdapterError, TransportError};
pub use position::{Page, PageMeta, Position};
pub use query::{Query, ReadOptions};
pub use record::Record;
pub use response::{Envelope, NextHint, ParsedResponse, ResponseMeta, ResponseParser};
pub use transport::{Method, Request, Response, Transport};
